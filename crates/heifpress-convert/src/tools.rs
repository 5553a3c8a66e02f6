//! External converter detection and selection.
//!
//! The catalog lists every tool heifpress knows how to drive, in priority
//! order. [`resolve`] picks one at job time: a preferred name (from
//! configuration) is honored first, otherwise the catalog is scanned for the
//! first available tool. Every call re-probes the host; probe results are
//! deliberately not cached, since jobs are infrequent relative to upload
//! cadence.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use heifpress_core::{Error, Result};

/// One candidate external converter program.
///
/// Known limitation: every catalog entry maps `(input, output)` to the
/// two-positional-argument form `[input, output]`. A tool that needs a
/// different flag syntax cannot be expressed without giving it its own
/// `build_args` function.
#[derive(Debug, Clone, Copy)]
pub struct ConverterTool {
    /// Invocation name, looked up on `PATH`.
    pub command: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Maps (input path, output path) to the tool's argument list.
    pub build_args: fn(input: &Path, output: &Path) -> Vec<OsString>,
}

impl ConverterTool {
    /// Probe the host for this tool's executable.
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(self.command).ok()
    }

    /// Whether the tool is installed on this host.
    pub fn is_available(&self) -> bool {
        self.locate().is_some()
    }
}

fn positional_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![input.as_os_str().to_os_string(), output.as_os_str().to_os_string()]
}

/// Catalog of known converter tools, in priority order.
pub const CATALOG: &[ConverterTool] = &[
    ConverterTool {
        command: "magick",
        description: "ImageMagick",
        build_args: positional_args,
    },
    ConverterTool {
        command: "convert",
        description: "ImageMagick (legacy convert)",
        build_args: positional_args,
    },
    ConverterTool {
        command: "heif-convert",
        description: "libheif",
        build_args: positional_args,
    },
];

/// Resolve a converter tool, honoring an optional preferred name.
///
/// - A preferred name not in the catalog fails with
///   [`Error::UnsupportedConverter`] without probing the host.
/// - A preferred name that is in the catalog but not installed fails with
///   [`Error::ConverterUnavailable`].
/// - With no preference, the first available catalog entry wins; if none is
///   available the error names every candidate so the operator knows what to
///   install.
pub fn resolve(preferred: Option<&str>) -> Result<&'static ConverterTool> {
    if let Some(name) = preferred {
        let tool = CATALOG
            .iter()
            .find(|t| t.command == name)
            .ok_or_else(|| Error::UnsupportedConverter {
                name: name.to_string(),
            })?;

        if !tool.is_available() {
            return Err(Error::ConverterUnavailable {
                name: name.to_string(),
            });
        }

        return Ok(tool);
    }

    CATALOG
        .iter()
        .find(|t| t.is_available())
        .ok_or_else(|| Error::NoConverterFound {
            candidates: catalog_names().iter().map(|n| n.to_string()).collect(),
        })
}

/// Whether `name` matches a catalog entry's invocation name.
pub fn is_known_tool(name: &str) -> bool {
    CATALOG.iter().any(|t| t.command == name)
}

/// Invocation names of all catalog entries, in priority order.
pub fn catalog_names() -> Vec<&'static str> {
    CATALOG.iter().map(|t| t.command).collect()
}

/// Availability information for a catalog tool, returned by [`check_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool invocation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the tool was found on this host.
    pub available: bool,
    /// Version string (first line of `--version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Check every catalog tool and return availability information.
pub fn check_all() -> Vec<ToolInfo> {
    CATALOG
        .iter()
        .map(|tool| match tool.locate() {
            Some(path) => {
                let version = detect_version(&path);
                ToolInfo {
                    name: tool.command.to_string(),
                    description: tool.description.to_string(),
                    available: true,
                    version,
                    path: Some(path),
                }
            }
            None => ToolInfo {
                name: tool.command.to_string(),
                description: tool.description.to_string(),
                available: false,
                version: None,
                path: None,
            },
        })
        .collect()
}

/// Run `<tool> --version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("--version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
