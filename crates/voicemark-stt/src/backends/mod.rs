//! Built-in backend implementations.

pub mod mock;

pub use mock::MockBackend;
