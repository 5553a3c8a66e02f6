//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`heifpress_core::Error`] so that route
//! handlers can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError(heifpress_core::Error);

impl From<heifpress_core::Error> for AppError {
    fn from(e: heifpress_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
        }

        let code = match &self.0 {
            heifpress_core::Error::InvalidRequest(_) => "invalid_request",
            heifpress_core::Error::UnsupportedConverter { .. } => "unsupported_converter",
            heifpress_core::Error::ConverterUnavailable { .. } => "converter_unavailable",
            heifpress_core::Error::NoConverterFound { .. } => "no_converter_found",
            heifpress_core::Error::ConversionFailed { .. } => "conversion_failed",
            heifpress_core::Error::ConversionVerificationFailed { .. } => {
                "conversion_verification_failed"
            }
            heifpress_core::Error::NotFound { .. } => "not_found",
            heifpress_core::Error::Config(_) => "config_error",
            heifpress_core::Error::Io { .. } => "io_error",
            heifpress_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
