//! Unified error type for the heifpress application.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes in heifpress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing conversion input (no source path, wrong file
    /// type, bad upload).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A preferred-tool override names a tool that is not in the catalog.
    #[error("Unsupported converter: '{name}' is not in the tool catalog")]
    UnsupportedConverter {
        /// The name supplied by the override.
        name: String,
    },

    /// The preferred tool is in the catalog but not installed on this host.
    #[error(
        "Preferred converter '{name}' is not available on this system; \
         install it or remove the converter override"
    )]
    ConverterUnavailable {
        /// Name of the missing tool.
        name: String,
    },

    /// Auto-detection exhausted every catalog candidate.
    #[error("No converter tool found; install one of: {}", .candidates.join(", "))]
    NoConverterFound {
        /// All candidate tool names, in catalog priority order.
        candidates: Vec<String>,
    },

    /// An external converter process exited non-zero or failed to launch.
    #[error("Conversion failed [{tool}]: {message}")]
    ConversionFailed {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable description (exit status, stderr).
        message: String,
    },

    /// The converter reported success but produced no output file.
    #[error(
        "Converter '{tool}' reported success but produced no output file at {}",
        .path.display()
    )]
    ConversionVerificationFailed {
        /// Name of the tool that lied about success.
        tool: String,
        /// Expected output path.
        path: PathBuf,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {name}")]
    NotFound {
        /// The kind of entity (e.g. "converted file").
        entity: String,
        /// The name that was looked up.
        name: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) => 400,
            Error::UnsupportedConverter { .. } => 400,
            Error::ConverterUnavailable { .. } => 503,
            Error::NoConverterFound { .. } => 503,
            Error::ConversionFailed { .. } => 502,
            Error::ConversionVerificationFailed { .. } => 502,
            Error::NotFound { .. } => 404,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Convenience constructor for [`Error::ConversionFailed`].
    pub fn conversion_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConversionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, name: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            name: name.to_string(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
