//! Axum request handlers for the HTTP API.
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::{self, Upload};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    model_loaded: bool,
}

#[derive(Serialize)]
pub struct WarmupResponse {
    status: &'static str,
    model_loaded: bool,
}

#[derive(Serialize)]
pub struct ApiInfoResponse {
    service: &'static str,
    version: &'static str,
    endpoints: Value,
    supported_formats: Vec<String>,
    note: String,
}

pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Background Removal API is running",
        "health": "/health",
        "warmup": "/warmup",
        "remove": "/remove-background",
        "info": "/api-info",
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "background-removal-api",
        model_loaded: state.sessions.is_ready(),
    })
}

/// Trigger session initialization synchronously. Model load blocks, so it runs
/// off the async workers.
pub async fn warmup(State(state): State<Arc<AppState>>) -> Response {
    let sessions = state.sessions.clone();
    let ready = tokio::task::spawn_blocking(move || sessions.ensure_ready())
        .await
        .unwrap_or(false);
    if ready {
        Json(WarmupResponse {
            status: "success",
            model_loaded: true,
        })
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(WarmupResponse {
                status: "error",
                model_loaded: false,
            }),
        )
            .into_response()
    }
}

pub async fn remove_background(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut upload: Option<Upload> = None;
    let mut background_color: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("background_color") => {
                background_color = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or(AppError::MissingImage)?;
    tracing::info!("Processing {}", upload.filename);

    let config = state.config.clone();
    let sessions = state.sessions.clone();
    let processed = tokio::task::spawn_blocking(move || {
        pipeline::process(upload, background_color.as_deref(), &config, &sessions)
    })
    .await
    .map_err(|e| AppError::Inference(format!("worker task failed: {}", e)))??;

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", processed.filename),
        ),
        (
            header::CACHE_CONTROL,
            "no-cache, no-store, must-revalidate".to_string(),
        ),
        (header::PRAGMA, "no-cache".to_string()),
        (header::EXPIRES, "0".to_string()),
    ];
    Ok((headers, processed.bytes).into_response())
}

pub async fn api_info(State(state): State<Arc<AppState>>) -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Background Removal API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: json!({
            "GET /": "Home page",
            "GET /health": "Health check",
            "GET|POST /warmup": "Load the model ahead of the first request",
            "POST /remove-background": {
                "description": "Remove background from uploaded image",
                "parameters": {
                    "image": "Image file (required)",
                    "background_color": "Hex color like #FF0000 (optional)"
                }
            }
        }),
        supported_formats: state.config.allowed_extensions.clone(),
        note: format!(
            "Images are automatically resized to {}px max for faster processing",
            state.config.max_image_dimension
        ),
    })
}
