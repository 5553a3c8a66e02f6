//! Upload-and-convert API routes.
//!
//! The upload handler owns the temporary-file lifecycle: save the multipart
//! upload, run a conversion job, and delete the upload after the job settles
//! regardless of outcome.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use heifpress_convert::{convert, is_heif_path, remove_quietly, ConversionRequest, ToolInfo};
use heifpress_core::Error;

use super::error::AppError;
use super::AppContext;

/// Response body for a successful conversion.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub message: String,
    pub file_name: String,
    pub download_url: String,
    pub command: String,
    pub tool: String,
}

/// POST /api/convert
///
/// Accepts a HEIC/HEIF image in the multipart `file` field and responds with
/// the download location of the converted JPEG.
pub async fn convert_upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    let upload_path = save_upload(&ctx, &mut multipart).await?;

    let request = ConversionRequest {
        source_path: upload_path.clone(),
        output_dir: ctx.config.storage.converted_dir.clone(),
        output_file_name: None,
    };

    // The upload is deleted after the job settles, on success and failure
    // alike; only then is the outcome inspected.
    let outcome = convert(&request, ctx.config.converter.preferred.as_deref()).await;
    remove_quietly(&upload_path).await;
    let result = outcome?;

    let file_name = result
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Internal("conversion produced a nameless output path".into()))?;

    Ok(Json(ConvertResponse {
        message: "Conversion successful".into(),
        download_url: format!("/api/files/{file_name}"),
        file_name,
        command: result.command,
        tool: result.tool,
    }))
}

/// GET /api/tools
///
/// Availability report over the converter catalog.
pub async fn list_tools() -> Json<Vec<ToolInfo>> {
    Json(heifpress_convert::check_all())
}

/// Pull the `file` field out of the multipart body and persist it under a
/// sanitized unique name in the upload directory.
async fn save_upload(ctx: &AppContext, multipart: &mut Multipart) -> Result<PathBuf, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("failed to read multipart field: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("").to_string();
        if original_name.is_empty() {
            return Err(Error::invalid_request("no file selected"));
        }

        let original = Path::new(&original_name);
        if !is_heif_path(original) {
            return Err(Error::invalid_request(
                "unsupported file type; upload a HEIC/HEIF image",
            ));
        }

        let extension = original
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("heic")
            .to_ascii_lowercase();
        let stem = sanitize_stem(
            original
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("upload"),
        );

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_request(format!("failed to read upload: {e}")))?;

        let upload_dir = &ctx.config.storage.upload_dir;
        tokio::fs::create_dir_all(upload_dir).await?;

        let path = upload_dir.join(format!("{stem}-{}.{extension}", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&path, &data).await {
            // A failed write can leave a partial file behind.
            remove_quietly(&path).await;
            return Err(e.into());
        }

        tracing::debug!("Saved upload {original_name} to {}", path.display());
        return Ok(path);
    }

    Err(Error::invalid_request(
        "no file part in the request; use the \"file\" field",
    ))
}

/// Keep only characters that are safe in a file name the server invents.
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".into()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_stem("IMG_0420-final"), "IMG_0420-final");
    }

    #[test]
    fn sanitize_replaces_separators_and_spaces() {
        assert_eq!(sanitize_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_stem("my photo (1)"), "my_photo__1_");
    }

    #[test]
    fn sanitize_empty_falls_back() {
        assert_eq!(sanitize_stem(""), "upload");
    }
}
