//! heifpress-core: shared error type and application configuration.
//!
//! This crate is the foundational dependency for the other heifpress
//! crates, providing the unified error taxonomy (with HTTP status mapping)
//! and the TOML-based configuration.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use config::Config;
pub use error::{Error, Result};
