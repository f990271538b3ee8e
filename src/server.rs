//! HTTP analysis service: one stateless route that acquires a waveform and
//! returns its feature record as flat JSON.

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::audio;
use crate::error::ExtractError;
use crate::features::{self, TrackFeatures};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Remote audio source.
    pub url: Option<String>,
    /// Local audio file path.
    pub path: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
}

/// Bind and serve until interrupted. Blocks the calling thread.
pub fn serve(host: &str, port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        log::info!("Listening on http://{addr}");
        axum::serve(listener, router()).await?;
        Ok(())
    })
}

async fn analyze(Json(req): Json<AnalyzeRequest>) -> Result<Json<TrackFeatures>, ApiError> {
    let source = req.url.or(req.path).ok_or(ApiError::MissingSource)?;

    // Acquisition and extraction are blocking, CPU-heavy work.
    let features = tokio::task::spawn_blocking(move || {
        let waveform = audio::acquire(&source)?;
        features::extract(&waveform)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(features))
}

enum ApiError {
    MissingSource,
    Extract(ExtractError),
    Internal,
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError::Extract(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingSource => (
                StatusCode::BAD_REQUEST,
                "request must include \"url\" or \"path\"".to_string(),
            ),
            ApiError::Extract(err) => {
                let status = match err {
                    ExtractError::EmptyWaveform | ExtractError::InvalidSampleRate(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "analysis task failed".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
