//! The conversion job: validate, resolve a tool, invoke it, verify output.
//!
//! A job is a pure function of its filesystem inputs and outputs. It never
//! deletes the source file; scoped cleanup of uploads belongs to the caller
//! so that deletion happens on every exit path, including resolution
//! failures that occur before the job ever runs a process.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use heifpress_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::{self, ConverterTool};

/// Source extensions accepted for conversion (matched case-insensitively).
pub const SOURCE_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Whether the path carries a HEIC/HEIF extension.
pub fn is_heif_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Input to a conversion job.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Source file; must exist and carry a HEIC/HEIF extension.
    pub source_path: PathBuf,
    /// Output directory, created (with parents) if absent.
    pub output_dir: PathBuf,
    /// Explicit output file name; derived from the source name plus a
    /// uniqueness token when absent.
    pub output_file_name: Option<String>,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The converted file; guaranteed to exist on disk at return time.
    pub output_path: PathBuf,
    /// Invocation name of the tool that ran.
    pub command: String,
    /// Human-readable description of the tool that ran.
    pub tool: String,
}

/// Run one source-to-JPEG conversion end to end.
///
/// The preferred tool name, if any, comes from process-wide configuration
/// read once at startup; the job itself never consults the environment.
/// Failures are terminal for the job; there are no retries.
pub async fn convert(
    request: &ConversionRequest,
    preferred: Option<&str>,
) -> Result<ConversionResult> {
    validate_source(&request.source_path)?;
    let tool = tools::resolve(preferred)?;
    convert_with(tool, request).await
}

/// Run a conversion with an already-resolved tool.
pub async fn convert_with(
    tool: &ConverterTool,
    request: &ConversionRequest,
) -> Result<ConversionResult> {
    tokio::fs::create_dir_all(&request.output_dir).await?;

    let output_name = match &request.output_file_name {
        Some(name) => name.clone(),
        None => derive_output_name(&request.source_path),
    };
    let output_path = request.output_dir.join(output_name);

    let args = (tool.build_args)(&request.source_path, &output_path);
    ToolCommand::new(tool.command).args(args).execute().await?;

    // The tool may exit zero without writing anything; trust the filesystem,
    // not the exit code.
    if tokio::fs::metadata(&output_path).await.is_err() {
        return Err(Error::ConversionVerificationFailed {
            tool: tool.command.to_string(),
            path: output_path,
        });
    }

    tracing::info!(
        "Converted {} -> {} using {}",
        request.source_path.display(),
        output_path.display(),
        tool.command
    );

    Ok(ConversionResult {
        output_path,
        command: tool.command.to_string(),
        tool: tool.description.to_string(),
    })
}

fn validate_source(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_request("source path is required"));
    }
    if !is_heif_path(path) {
        return Err(Error::invalid_request(format!(
            "not a HEIC/HEIF file: {}",
            path.display()
        )));
    }
    if !path.exists() {
        return Err(Error::invalid_request(format!(
            "source file does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Derive a collision-free output name from the source stem.
///
/// The uniqueness token keeps batch jobs over same-named files from
/// different source directories (and concurrent uploads) from clobbering
/// each other.
fn derive_output_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{stem}-{}.jpg", Uuid::new_v4())
}

/// Delete a temporary file, logging failures instead of propagating them.
///
/// Cleanup must never mask the primary conversion outcome, so errors other
/// than the file already being gone are demoted to warnings.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!("Failed to remove temporary file {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn positional(input: &Path, output: &Path) -> Vec<OsString> {
        vec![input.as_os_str().to_os_string(), output.as_os_str().to_os_string()]
    }

    /// `cp` behaves like a well-behaved converter: exits zero and writes the
    /// output file.
    const STUB_COPY: ConverterTool = ConverterTool {
        command: "cp",
        description: "copy stub",
        build_args: positional,
    };

    /// `true` behaves like a converter that lies: exits zero, writes nothing.
    const STUB_NOOP: ConverterTool = ConverterTool {
        command: "true",
        description: "noop stub",
        build_args: positional,
    };

    fn write_source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"fake heic payload").unwrap();
        path
    }

    #[test]
    fn heif_extensions_case_insensitive() {
        assert!(is_heif_path(Path::new("a.heic")));
        assert!(is_heif_path(Path::new("a.HEIC")));
        assert!(is_heif_path(Path::new("a.heif")));
        assert!(is_heif_path(Path::new("a.HeIf")));
        assert!(!is_heif_path(Path::new("a.jpg")));
        assert!(!is_heif_path(Path::new("a.png")));
        assert!(!is_heif_path(Path::new("a.heic.txt")));
        assert!(!is_heif_path(Path::new("heic")));
    }

    #[test]
    fn derived_names_keep_stem_and_differ() {
        let a = derive_output_name(Path::new("/photos/vacation.heic"));
        let b = derive_output_name(Path::new("/photos/vacation.heic"));
        assert!(a.starts_with("vacation-"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn empty_source_is_invalid() {
        let request = ConversionRequest {
            source_path: PathBuf::new(),
            output_dir: PathBuf::from("/tmp"),
            output_file_name: None,
        };
        let err = convert(&request, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn wrong_extension_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.png");
        let request = ConversionRequest {
            source_path: source,
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };
        let err = convert(&request, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn missing_source_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest {
            source_path: dir.path().join("absent.heic"),
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };
        let err = convert(&request, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unknown_preferred_rejected_before_any_probe() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.heic");
        let request = ConversionRequest {
            source_path: source,
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };
        let err = convert(&request, Some("sips")).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedConverter { .. }));
    }

    #[tokio::test]
    async fn stub_round_trip_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.heic");
        let request = ConversionRequest {
            source_path: source.clone(),
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };

        let result = convert_with(&STUB_COPY, &request).await.unwrap();
        assert!(result.output_path.exists());
        assert_eq!(result.command, "cp");
        assert_eq!(result.tool, "copy stub");
        // The job never deletes its source.
        assert!(source.exists());
    }

    #[tokio::test]
    async fn explicit_output_name_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.heic");
        let request = ConversionRequest {
            source_path: source,
            output_dir: dir.path().join("out"),
            output_file_name: Some("exact.jpg".into()),
        };

        let result = convert_with(&STUB_COPY, &request).await.unwrap();
        assert_eq!(result.output_path, dir.path().join("out").join("exact.jpg"));
        assert!(result.output_path.exists());
    }

    #[tokio::test]
    async fn zero_exit_without_output_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.heic");
        let request = ConversionRequest {
            source_path: source,
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };

        let err = convert_with(&STUB_NOOP, &request).await.unwrap_err();
        assert!(matches!(err, Error::ConversionVerificationFailed { .. }));
    }

    #[tokio::test]
    async fn failing_tool_reports_conversion_failed() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "photo.heic");
        let request = ConversionRequest {
            source_path: source,
            output_dir: dir.path().join("out"),
            output_file_name: None,
        };
        let stub_fail = ConverterTool {
            command: "false",
            description: "failing stub",
            build_args: positional,
        };

        let err = convert_with(&stub_fail, &request).await.unwrap_err();
        assert!(matches!(err, Error::ConversionFailed { .. }));
    }

    #[tokio::test]
    async fn concurrent_same_named_sources_do_not_collide() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        let source_a = write_source(dir_a.path(), "photo.heic");
        let source_b = write_source(dir_b.path(), "photo.heic");

        let request_a = ConversionRequest {
            source_path: source_a,
            output_dir: out_dir.path().to_path_buf(),
            output_file_name: None,
        };
        let request_b = ConversionRequest {
            source_path: source_b,
            output_dir: out_dir.path().to_path_buf(),
            output_file_name: None,
        };

        let (a, b) = tokio::join!(
            convert_with(&STUB_COPY, &request_a),
            convert_with(&STUB_COPY, &request_b),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.output_path, b.output_path);
        assert!(a.output_path.exists());
        assert!(b.output_path.exists());
    }

    #[tokio::test]
    async fn remove_quietly_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.heic");
        // Must not panic or error on a file that never existed.
        remove_quietly(&path).await;

        std::fs::write(&path, b"x").unwrap();
        remove_quietly(&path).await;
        assert!(!path.exists());
    }
}
