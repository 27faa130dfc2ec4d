//! Integration tests for the public API and the C boundary.
//!
//! These tests verify that:
//! 1. A third-party backend built from the component traits plugs into `Runtime`
//! 2. The lifecycle fails fast, without backend I/O, once initialization failed
//! 3. The local backend behaves like the in-memory one end-to-end
//! 4. The C ABI returns well-formed envelopes and owns nothing twice
//! 5. Concurrent conditional saves have exactly one winner, and directory
//!    removal never interleaves with a save in flight

use docfs_runtime::ffi::*;
use docfs_runtime::*;
use serde_json::Value;
use std::ffi::{CString, c_char};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, mpsc};
use std::thread;
use std::time::Duration;

// =============================================================================
// Hooked middleware, implemented outside the crate
// =============================================================================

/// Runs before every backend call with the call name and URI. An error from
/// the hook is returned in place of the call.
type Hook = Arc<dyn Fn(&'static str, &ResourceUri) -> Result<(), DocError> + Send + Sync>;

fn hook(
    f: impl Fn(&'static str, &ResourceUri) -> Result<(), DocError> + Send + Sync + 'static,
) -> Hook {
    Arc::new(f)
}

struct Hooked<B> {
    inner: B,
    hook: Hook,
}

struct HookLayer(Hook);

impl<B: Backend> Layer<B> for HookLayer {
    type Backend = Hooked<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Hooked {
            inner: backend,
            hook: self.0,
        }
    }
}

impl<B: BackendRead> BackendRead for Hooked<B> {
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError> {
        (self.hook)("read", uri)?;
        self.inner.read(uri)
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        (self.hook)("exists", uri)?;
        self.inner.exists(uri)
    }

    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError> {
        (self.hook)("metadata", uri)?;
        self.inner.metadata(uri)
    }
}

impl<B: BackendWrite> BackendWrite for Hooked<B> {
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError> {
        (self.hook)("write", uri)?;
        self.inner.write(uri, data)
    }

    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (self.hook)("remove_file", uri)?;
        self.inner.remove_file(uri)
    }
}

impl<B: BackendDir> BackendDir for Hooked<B> {
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError> {
        (self.hook)("read_dir", uri)?;
        self.inner.read_dir(uri)
    }

    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (self.hook)("create_dir", uri)?;
        self.inner.create_dir(uri)
    }

    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (self.hook)("create_dir_all", uri)?;
        self.inner.create_dir_all(uri)
    }

    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (self.hook)("remove_dir", uri)?;
        self.inner.remove_dir(uri)
    }

    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (self.hook)("remove_dir_all", uri)?;
        self.inner.remove_dir_all(uri)
    }
}

impl<B: BackendProbe> BackendProbe for Hooked<B> {
    fn info(&self) -> BackendInfo {
        self.inner.info()
    }

    fn setup(&self, create_root: bool) -> Result<(), DocError> {
        (self.hook)("setup", &ResourceUri::root())?;
        self.inner.setup(create_root)
    }

    fn probe(&self) -> Result<(), DocError> {
        (self.hook)("probe", &ResourceUri::root())?;
        self.inner.probe()
    }
}

fn hooked(backend: MemoryBackend, hook: Hook) -> Runtime {
    let root = format!("{MEMORY_SCHEME}{}", backend.name());
    let layered = backend.layer(HookLayer(hook));
    Runtime::with_backend(RuntimeConfig::new(root), Box::new(layered))
}

fn counted(backend: MemoryBackend) -> (Runtime, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let runtime = hooked(
        backend,
        hook(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    (runtime, calls)
}

// =============================================================================
// Tests: Pluggable Backends and Lifecycle
// =============================================================================

#[test]
fn custom_layer_backs_a_runtime() {
    let (runtime, calls) = counted(MemoryBackend::new("custom"));
    runtime.initialize().unwrap();
    runtime.save_markdown("/a.md", "# A", None).unwrap();
    assert!(calls.load(Ordering::SeqCst) > 0);
    assert_eq!(runtime.load_markdown("/a.md").unwrap().content, "# A");
}

#[test]
fn failed_runtime_never_touches_the_backend_again() {
    let backend = MemoryBackend::new("down");
    backend.set_available(false);
    let (runtime, calls) = counted(backend.clone());

    let err = runtime.initialize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert_eq!(runtime.state(), RuntimeState::Failed);
    let after_init = calls.load(Ordering::SeqCst);

    backend.set_available(true);
    assert!(runtime.initialize().is_err());
    assert!(runtime.mkdir("/a").is_err());
    assert!(runtime.ls("/", true).is_err());
    assert!(runtime.load_markdown("/a.md").is_err());
    assert!(runtime.save_markdown("/a.md", "x", None).is_err());
    assert!(runtime.rm("/a", true).is_err());
    assert!(runtime.backend_status().is_err());
    assert_eq!(calls.load(Ordering::SeqCst), after_init);
}

#[test]
fn uninitialized_runtime_rejects_operations_without_io() {
    let (runtime, calls) = counted(MemoryBackend::new("idle"));
    let err = runtime.ls("/", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);
    assert_eq!(err.code(), ResultCode::RuntimeError);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn argument_errors_happen_before_io() {
    let (runtime, calls) = counted(MemoryBackend::new("args"));
    runtime.initialize().unwrap();
    let before = calls.load(Ordering::SeqCst);
    for uri in ["", "/../x", "a\\b"] {
        assert_eq!(runtime.mkdir(uri).unwrap_err().code(), ResultCode::InvalidArgument);
    }
    assert_eq!(
        runtime.load_markdown("/notes.txt").unwrap_err().code(),
        ResultCode::InvalidArgument
    );
    assert_eq!(calls.load(Ordering::SeqCst), before);
}

#[test]
fn recursive_removal_failure_reports_the_first_error_without_rollback() {
    let backend = MemoryBackend::new("partial");
    let store = backend.clone();
    let runtime = hooked(
        backend,
        hook(move |call, uri| {
            if call != "remove_dir_all" {
                return Ok(());
            }
            // One child goes, the next one refuses.
            store.remove_file(&uri.join("a.md")?)?;
            Err(DocError::AccessDenied {
                uri: uri.join("locked.md")?.to_string(),
                reason: "held by another process".into(),
            })
        }),
    );
    runtime.initialize().unwrap();
    for doc in ["/d/a.md", "/d/locked.md", "/d/sub/b.md"] {
        runtime.save_markdown(doc, "x", None).unwrap();
    }

    let err = runtime.rm("/d", true).unwrap_err();
    assert_eq!(err.code(), ResultCode::RuntimeError);
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    let (code, payload) = take(Envelope::from_unit(ops::RM, Err(err)));
    assert_eq!(code, ResultCode::RuntimeError);
    assert_eq!(payload["kind"], "access_denied");
    assert_eq!(payload["operation"], "runtime.rm");
    assert!(payload["message"].as_str().unwrap().contains("/d/locked.md"));

    assert_eq!(
        runtime.load_markdown("/d/a.md").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let remaining: Vec<_> = runtime
        .ls("/d", true)
        .unwrap()
        .into_iter()
        .map(|e| e.uri)
        .collect();
    assert_eq!(remaining, ["locked.md", "sub", "sub/b.md"]);
}

#[test]
fn listed_uris_are_re_addressable() {
    let runtime = Runtime::new("memory://listed").unwrap();
    runtime.initialize().unwrap();
    assert_eq!(
        runtime.mkdir("/x /").unwrap_err().code(),
        ResultCode::InvalidArgument
    );
    runtime.mkdir("/x/ y").unwrap_err();
    runtime.mkdir("/x y/z").unwrap();

    let listed = runtime.ls("/", true).unwrap();
    assert_eq!(listed.len(), 2);
    for entry in listed {
        let again = runtime.ls(&entry.uri, false).unwrap();
        assert!(again.len() <= 1, "{}", entry.uri);
    }
}

// =============================================================================
// Tests: Local Backend End-to-End
// =============================================================================

#[test]
fn local_root_is_created_and_used() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("docs");
    let runtime = Runtime::new(root.to_str().unwrap()).unwrap();
    runtime.initialize().unwrap();
    assert!(root.is_dir());

    runtime.mkdir("/notes/daily").unwrap();
    let saved = runtime
        .save_markdown("/notes/daily/today.md", "# Today\n", None)
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(root.join("notes/daily/today.md")).unwrap(),
        "# Today\n"
    );

    let doc = runtime.load_markdown("/notes/daily/today.md").unwrap();
    assert_eq!(doc.fingerprint, saved.fingerprint);

    let status = runtime.backend_status().unwrap();
    assert_eq!(status.kind, BackendKind::Local);
    assert!(status.reachable);
}

#[test]
fn local_root_must_exist_when_creation_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RuntimeConfig::new(dir.path().join("absent").to_str().unwrap());
    config.create_root = false;
    let runtime = Runtime::with_config(config).unwrap();
    assert_eq!(
        runtime.initialize().unwrap_err().kind(),
        ErrorKind::BackendUnavailable
    );
    assert_eq!(runtime.state(), RuntimeState::Failed);
}

#[test]
fn local_conditional_saves_detect_external_edits() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(&format!("file://{}", dir.path().display())).unwrap();
    runtime.initialize().unwrap();

    let v1 = runtime.save_markdown("/a.md", "one", None).unwrap();
    std::fs::write(dir.path().join("a.md"), "edited elsewhere").unwrap();

    let err = runtime
        .save_markdown("/a.md", "two", Some(&v1.fingerprint))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        runtime.load_markdown("/a.md").unwrap().content,
        "edited elsewhere"
    );
}

#[test]
fn local_listing_and_removal() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(dir.path().to_str().unwrap()).unwrap();
    runtime.initialize().unwrap();

    runtime.save_markdown("/b/z.md", "z", None).unwrap();
    runtime.save_markdown("/a.md", "a", None).unwrap();
    runtime.save_markdown("/b/c/y.md", "y", None).unwrap();

    let uris: Vec<_> = runtime
        .ls("/", true)
        .unwrap()
        .into_iter()
        .map(|e| e.uri)
        .collect();
    assert_eq!(uris, ["a.md", "b", "b/c", "b/c/y.md", "b/z.md"]);

    let err = runtime.rm("/b", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DirectoryNotEmpty);
    assert!(dir.path().join("b/c/y.md").exists());

    runtime.rm("/b", true).unwrap();
    assert_eq!(runtime.ls("/b", false).unwrap_err().kind(), ErrorKind::NotFound);
    assert!(!dir.path().join("b").exists());
}

#[cfg(unix)]
#[test]
fn local_directory_listed_as_empty_can_be_removed() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(dir.path().to_str().unwrap()).unwrap();
    runtime.initialize().unwrap();

    runtime.mkdir("/d").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("d/link")).unwrap();
    std::fs::write(dir.path().join("padded "), "external").unwrap();

    assert!(runtime.ls("/d", false).unwrap().is_empty());
    runtime.rm("/d", false).unwrap();
    assert!(outside.path().is_dir());

    let names: Vec<_> = runtime
        .ls("/", true)
        .unwrap()
        .into_iter()
        .map(|e| e.uri)
        .collect();
    assert!(names.is_empty(), "{names:?}");
}

// =============================================================================
// Tests: C Boundary
// =============================================================================

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// Consume an envelope, returning its code and JSON payload (`Null` if empty).
fn take(envelope: Envelope) -> (ResultCode, Value) {
    let code = envelope.code;
    if envelope.payload.is_empty() {
        // SAFETY: empty payloads may be freed freely.
        unsafe { docfs_owned_bytes_free(envelope.payload) };
        return (code, Value::Null);
    }
    // SAFETY: payload produced by the library and viewed before its release.
    let value = serde_json::from_slice(unsafe { envelope.payload.as_slice() }).unwrap();
    // SAFETY: released exactly once.
    unsafe { docfs_owned_bytes_free(envelope.payload) };
    (code, value)
}

fn open(root: &str) -> *mut Runtime {
    let root = c(root);
    let mut handle: *mut Runtime = ptr::null_mut();
    // SAFETY: valid string and out-pointer.
    let (code, payload) = take(unsafe { docfs_runtime_new(root.as_ptr(), &mut handle) });
    assert_eq!(code, ResultCode::Ok, "{payload}");
    assert!(!handle.is_null());
    handle
}

#[test]
fn ffi_end_to_end_scenario() {
    let handle = open("memory://ffi");
    let dir = c("/notes");
    let doc = c("/notes/a.md");

    unsafe {
        let (code, payload) = take(docfs_runtime_mkdir(handle, dir.as_ptr()));
        assert_eq!(code, ResultCode::RuntimeError);
        assert_eq!(payload["kind"], "not_ready");
        assert_eq!(payload["operation"], "runtime.mkdir");

        assert_eq!(take(docfs_runtime_initialize(handle)).0, ResultCode::Ok);
        assert_eq!(take(docfs_runtime_initialize(handle)).0, ResultCode::Ok);

        let (code, payload) = take(docfs_runtime_mkdir(handle, dir.as_ptr()));
        assert_eq!((code, payload), (ResultCode::Ok, Value::Null));

        let hi = c("# Hi");
        let (code, v1) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            hi.as_ptr(),
            ptr::null(),
        ));
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(v1["uri"], "/notes/a.md");
        assert_eq!(v1["size"], 4);
        assert!(v1["updated_at"].as_str().unwrap().ends_with('Z'));
        let fp1 = c(v1["fingerprint"].as_str().unwrap());

        let there = c("# Hi there");
        let (code, v2) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            there.as_ptr(),
            fp1.as_ptr(),
        ));
        assert_eq!(code, ResultCode::Ok);
        assert_ne!(v2["fingerprint"], v1["fingerprint"]);

        let stale = c("# Stale");
        let (code, err) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            stale.as_ptr(),
            fp1.as_ptr(),
        ));
        assert_eq!(code, ResultCode::RuntimeError);
        assert_eq!(err["kind"], "conflict");
        assert_eq!(err["operation"], "runtime.save_markdown");

        let (code, loaded) = take(docfs_runtime_load_markdown_json(handle, doc.as_ptr()));
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(loaded["content"], "# Hi there");
        assert_eq!(loaded["fingerprint"], v2["fingerprint"]);
        assert_eq!(loaded["updated_at"], v2["updated_at"]);

        let root = c("/");
        let (code, listing) = take(docfs_runtime_ls_json(handle, root.as_ptr(), true));
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(
            listing,
            serde_json::json!([
                {"name": "notes", "kind": "directory", "uri": "notes", "size": 0},
                {"name": "a.md", "kind": "file", "uri": "notes/a.md", "size": 10},
            ])
        );

        let (code, status) = take(docfs_runtime_backend_status_json(handle));
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(status["kind"], "memory");
        assert_eq!(status["root"], "memory://ffi");
        assert_eq!(status["reachable"], true);
        assert_eq!(status["state"], "ready");

        let (code, _) = take(docfs_runtime_rm(handle, dir.as_ptr(), false));
        assert_eq!(code, ResultCode::RuntimeError);
        assert_eq!(take(docfs_runtime_rm(handle, dir.as_ptr(), true)).0, ResultCode::Ok);
        let (_, err) = take(docfs_runtime_ls_json(handle, dir.as_ptr(), false));
        assert_eq!(err["kind"], "not_found");

        docfs_runtime_free(handle);
    }
}

#[test]
fn ffi_invalid_arguments() {
    let handle = open("memory://args");
    unsafe {
        take(docfs_runtime_initialize(handle));

        let (code, err) = take(docfs_runtime_mkdir(handle, ptr::null()));
        assert_eq!(code, ResultCode::InvalidArgument);
        assert_eq!(err["kind"], "invalid_argument");

        let escape = c("/../../etc");
        let (code, _) = take(docfs_runtime_ls_json(handle, escape.as_ptr(), false));
        assert_eq!(code, ResultCode::InvalidArgument);

        let doc = c("/a.md");
        let (code, _) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            ptr::null(),
            ptr::null(),
        ));
        assert_eq!(code, ResultCode::InvalidArgument);

        let (code, _) = take(docfs_runtime_ls_json(ptr::null(), doc.as_ptr(), false));
        assert_eq!(code, ResultCode::InvalidArgument);

        docfs_runtime_free(handle);
    }

    let empty = c("  ");
    let mut handle: *mut Runtime = ptr::null_mut();
    let (code, err) = take(unsafe { docfs_runtime_new(empty.as_ptr(), &mut handle) });
    assert_eq!(code, ResultCode::InvalidArgument);
    assert_eq!(err["operation"], "runtime.new");
    assert!(handle.is_null());
}

#[test]
fn ffi_empty_content_and_blank_fingerprint() {
    let handle = open("  memory://blank  ");
    let doc = c("  /empty.md ");
    let empty = c("");
    let blank = c("   ");
    unsafe {
        take(docfs_runtime_initialize(handle));
        let (code, saved) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            empty.as_ptr(),
            blank.as_ptr(),
        ));
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(saved["size"], 0);
        assert_eq!(saved["uri"], "/empty.md");

        let (_, loaded) = take(docfs_runtime_load_markdown_json(handle, doc.as_ptr()));
        assert_eq!(loaded["content"], "");
        docfs_runtime_free(handle);
    }
}

#[test]
fn ffi_new_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = serde_json::json!({
        "root": dir.path().join("store").to_str().unwrap(),
        "backend": "local",
        "markdown_extensions": ["md", "txt"],
    });
    let config = c(&config.to_string());
    let mut handle: *mut Runtime = ptr::null_mut();
    unsafe {
        let (code, _) = take(docfs_runtime_new_with_config(config.as_ptr(), &mut handle));
        assert_eq!(code, ResultCode::Ok);
        take(docfs_runtime_initialize(handle));

        let doc = c("/notes.txt");
        let body = c("plain");
        let (code, _) = take(docfs_runtime_save_markdown_json(
            handle,
            doc.as_ptr(),
            body.as_ptr(),
            ptr::null(),
        ));
        assert_eq!(code, ResultCode::Ok);
        docfs_runtime_free(handle);
    }
    assert!(dir.path().join("store/notes.txt").is_file());

    let bad = c(r#"{"root": "memory://x", "unknown": 1}"#);
    let mut handle: *mut Runtime = ptr::null_mut();
    let (code, err) = take(unsafe { docfs_runtime_new_with_config(bad.as_ptr(), &mut handle) });
    assert_eq!(code, ResultCode::InvalidArgument);
    assert_eq!(err["operation"], "runtime.new_with_config");
}

// =============================================================================
// Tests: Concurrency
// =============================================================================

#[test]
fn concurrent_conditional_saves_on_local_disk_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(Runtime::new(dir.path().to_str().unwrap()).unwrap());
    runtime.initialize().unwrap();
    let base = runtime.save_markdown("/shared.md", "base", None).unwrap();

    let writers = 6;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let runtime = Arc::clone(&runtime);
            let barrier = Arc::clone(&barrier);
            let expected = base.fingerprint.clone();
            thread::spawn(move || {
                barrier.wait();
                runtime.save_markdown("/shared.md", &format!("device {i}"), Some(&expected))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

#[test]
fn directory_removal_waits_for_a_save_in_flight() {
    let armed = Arc::new(AtomicBool::new(false));
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let pause = Mutex::new((entered_tx, release_rx));
    let trigger = Arc::clone(&armed);
    let runtime = Arc::new(hooked(
        MemoryBackend::new("gate"),
        hook(move |call, _| {
            // Park the save between its fingerprint check and its write.
            if call == "create_dir_all" && trigger.swap(false, Ordering::SeqCst) {
                let pause = pause.lock().unwrap();
                pause.0.send(()).unwrap();
                pause.1.recv().unwrap();
            }
            Ok(())
        }),
    ));
    runtime.initialize().unwrap();
    let v1 = runtime.save_markdown("/d/a.md", "one", None).unwrap();

    armed.store(true, Ordering::SeqCst);
    let saver = {
        let runtime = Arc::clone(&runtime);
        thread::spawn(move || runtime.save_markdown("/d/a.md", "two", Some(&v1.fingerprint)))
    };
    entered_rx.recv().unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let remover = {
        let runtime = Arc::clone(&runtime);
        thread::spawn(move || {
            let result = runtime.rm("/d", true);
            done_tx.send(()).unwrap();
            result
        })
    };
    assert!(
        done_rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "recursive rm completed while a save held its fingerprint check"
    );
    release_tx.send(()).unwrap();

    let saved = saver.join().unwrap().unwrap();
    remover.join().unwrap().unwrap();

    assert_eq!(
        runtime.load_markdown("/d/a.md").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let err = runtime
        .save_markdown("/d/a.md", "three", Some(&saved.fingerprint))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(runtime.ls("/", true).unwrap().is_empty());
}

#[test]
fn ffi_handle_is_shareable_across_threads() {
    struct Shared(*mut Runtime);
    // SAFETY: `Runtime` is `Send + Sync`; the pointer is freed only after
    // every thread has been joined.
    unsafe impl Send for Shared {}
    unsafe impl Sync for Shared {}

    let shared = Arc::new(Shared(open("memory://threads")));
    unsafe { take(docfs_runtime_initialize(shared.0)) };

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let uri = c(&format!("/t{i}/doc.md"));
                let body = c("x");
                let handle: *const Runtime = shared.0;
                // SAFETY: live handle, valid strings.
                let (code, _) = take(unsafe {
                    docfs_runtime_save_markdown_json(
                        handle,
                        uri.as_ptr(),
                        body.as_ptr(),
                        ptr::null::<c_char>(),
                    )
                });
                code
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), ResultCode::Ok);
    }

    let root = c("/");
    let (_, listing) = take(unsafe { docfs_runtime_ls_json(shared.0, root.as_ptr(), false) });
    assert_eq!(listing.as_array().unwrap().len(), 4);
    unsafe { docfs_runtime_free(shared.0) };
}
