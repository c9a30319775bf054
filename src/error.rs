use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Point {index}: {field} is not a finite number")]
    NonNumeric { index: usize, field: &'static str },
    #[error("Point {index}: {field} {value} is outside [{min}, {max}]")]
    OutOfBounds {
        index: usize,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to fetch route: {0}")]
    Fetch(String),
    #[error("Route source responded with HTTP {0}")]
    Status(u16),
    #[error("Failed to read route file: {0}")]
    Io(String),
    #[error("Malformed route JSON: {0}")]
    MalformedJson(String),
    #[error("Invalid route structure: {0}")]
    InvalidStructure(String),
    #[error("Route contains no points")]
    EmptyRoute,
    #[error("Invalid route data: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Speed multiplier must be a finite number greater than 0 (got {0})")]
    InvalidSpeed(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("Playback session has shut down")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("SVG generation failed: {0}")]
    SvgError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("PNG rendering failed: {0}")]
    RenderFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Playback(err) => AppError::Playback(err),
            SessionError::Closed => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Playback(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Load(_) | AppError::RouteUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Render(_) | AppError::Raster(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
