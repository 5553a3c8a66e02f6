//! # heifpress-convert
//!
//! Converter detection and HEIC/HEIF to JPEG conversion jobs.
//!
//! This crate provides:
//! - A static catalog of external converter tools with a resolve-with-fallback
//!   policy ([`tools`])
//! - An async external-command runner that captures stderr for diagnostics
//!   ([`command`])
//! - The conversion job itself: validate, resolve, invoke, verify
//!   ([`convert`])
//!
//! ## Example
//!
//! ```no_run
//! use heifpress_convert::{convert, ConversionRequest};
//!
//! # async fn example() -> heifpress_core::Result<()> {
//! let request = ConversionRequest {
//!     source_path: "/uploads/photo.heic".into(),
//!     output_dir: "/converted".into(),
//!     output_file_name: None,
//! };
//! let result = convert(&request, None).await?;
//! println!("wrote {} using {}", result.output_path.display(), result.command);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod convert;
pub mod tools;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use convert::{
    convert, convert_with, is_heif_path, remove_quietly, ConversionRequest, ConversionResult,
};
pub use tools::{catalog_names, check_all, is_known_tool, resolve, ConverterTool, ToolInfo};
