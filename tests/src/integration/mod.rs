//! End-to-end scenarios through the public API.

pub mod loader;
