//! I/O operations module
//!
//! Writability probing and the self-cleaning benchmark test file.

pub mod disk;

pub use disk::{drop_cached_pages, probe_writable, TempFile};
