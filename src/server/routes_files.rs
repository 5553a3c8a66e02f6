//! Converted-file download route.

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::header;
use axum::response::IntoResponse;
use tokio_util::io::ReaderStream;

use heifpress_core::Error;

use super::error::AppError;
use super::AppContext;

/// GET /api/files/:file_name
///
/// Streams a converted JPEG back as an attachment. File names are plain
/// names inside the converted directory; anything that smells like path
/// traversal is rejected before touching the filesystem.
pub async fn download_converted(
    State(ctx): State<AppContext>,
    UrlPath(file_name): UrlPath<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_safe_file_name(&file_name) {
        return Err(Error::invalid_request("invalid file name").into());
    }

    let path = ctx.config.storage.converted_dir.join(&file_name);

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| Error::not_found("converted file", &file_name))?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}

/// A name is safe when it stays inside the converted directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_safe() {
        assert!(is_safe_file_name("photo-1234.jpg"));
        assert!(is_safe_file_name("IMG_0420-abc.jpg"));
    }

    #[test]
    fn traversal_names_are_rejected() {
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name("."));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("../secret.jpg"));
        assert!(!is_safe_file_name("a/../b.jpg"));
        assert!(!is_safe_file_name("a/b.jpg"));
        assert!(!is_safe_file_name("a\\b.jpg"));
    }
}
