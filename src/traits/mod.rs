//! # Backend Traits
//!
//! Capability interface every storage provider implements.
//!
//! ```text
//! BackendRead + BackendWrite + BackendDir + BackendProbe = Backend
//! ```
//!
//! | Trait | Methods |
//! |-------|---------|
//! | [`BackendRead`] | `read`, `read_to_string`, `exists`, `metadata` |
//! | [`BackendWrite`] | `write`, `remove_file` |
//! | [`BackendDir`] | `read_dir`, `create_dir`, `create_dir_all`, `remove_dir`, `remove_dir_all` |
//! | [`BackendProbe`] | `info`, `setup`, `probe` |
//!
//! [`Backend`] has a blanket implementation: implement the component traits
//! and the composite follows. `Box<dyn Backend>` implements every component
//! trait too, so a backend selected at runtime can still be wrapped by
//! [`Layer`](crate::Layer) middleware.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Backends serialize
//! their own state internally.

mod backend_dir;
mod backend_probe;
mod backend_read;
mod backend_write;

pub use backend_dir::{BackendDir, ReadDirIter};
pub use backend_probe::BackendProbe;
pub use backend_read::BackendRead;
pub use backend_write::BackendWrite;

/// Complete storage backend.
///
/// Automatically implemented for any type implementing all component traits.
pub trait Backend: BackendRead + BackendWrite + BackendDir + BackendProbe {}

impl<T: BackendRead + BackendWrite + BackendDir + BackendProbe> Backend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_object_safe() {
        fn _check(_: &dyn Backend) {}
    }

    #[test]
    fn boxed_backend_is_backend() {
        fn _assert_backend<B: Backend>() {}
        _assert_backend::<Box<dyn Backend>>();
    }
}
