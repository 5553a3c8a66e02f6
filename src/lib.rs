//! Heifpress - HEIC/HEIF to JPEG conversion service
//!
//! This library crate exposes the server for integration testing.

pub mod server;
