//! Common error type and HTTP mapping for the service.
//!
//! Every failure a handler can surface is a variant here, so the HTTP layer
//! does a total mapping from error to status code instead of ad hoc catching.
//! Bodies are always `{"error": ..., "message": ...}` JSON.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// The multipart form had no `image` field (or it was empty).
    #[error("No image provided")]
    MissingImage,

    /// The `image` field carried no filename.
    #[error("No image selected")]
    EmptyFilename,

    /// Filename extension is not in the configured allow-set.
    #[error("Invalid file type")]
    InvalidFileType { allowed: String },

    /// Upload bytes did not decode as an image.
    #[error("Invalid image")]
    Decode(#[source] image::ImageError),

    /// Malformed multipart request body.
    #[error("Invalid request")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// The inference session is not ready and could not be initialized.
    #[error("Model not ready")]
    ModelUnavailable,

    /// Background removal itself failed.
    #[error("Processing failed")]
    Inference(String),

    /// PNG encoding of the result failed.
    #[error("Processing failed")]
    Encode(#[source] image::ImageError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingImage
            | AppError::EmptyFilename
            | AppError::InvalidFileType { .. }
            | AppError::Decode(_)
            | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Inference(_) | AppError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable detail for the `message` field of the JSON body.
    pub fn message(&self) -> String {
        match self {
            AppError::MissingImage => "Please upload an image file".to_string(),
            AppError::EmptyFilename => "Please select an image file".to_string(),
            AppError::InvalidFileType { allowed } => {
                format!("Supported formats: {}", allowed)
            }
            AppError::Decode(e) => format!("Could not decode the uploaded image: {}", e),
            AppError::Multipart(e) => e.to_string(),
            AppError::ModelUnavailable => {
                "The background removal model is not loaded; try again shortly".to_string()
            }
            AppError::Inference(e) => e.clone(),
            AppError::Encode(e) => format!("Could not encode the result: {}", e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}: {}", self.message());
        } else {
            tracing::debug!("request rejected: {self}");
        }
        let body = Json(json!({
            "error": self.to_string(),
            "message": self.message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(AppError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyFilename.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidFileType { allowed: "png".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ModelUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Inference("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_file_type_lists_allowed_formats() {
        let err = AppError::InvalidFileType { allowed: "png, jpg".into() };
        assert_eq!(err.to_string(), "Invalid file type");
        assert!(err.message().contains("png, jpg"));
    }
}
