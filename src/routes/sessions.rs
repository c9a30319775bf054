use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::playback::session::{Control, SessionHandle};
use crate::state::AppState;
use crate::types::playback::PlaybackSnapshot;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/play", post(play))
        .route("/api/sessions/:id/pause", post(pause))
        .route("/api/sessions/:id/reset", post(reset))
        .route("/api/sessions/:id/speed", put(set_speed))
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
    snapshot: PlaybackSnapshot,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeedRequest {
    multiplier: f64,
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let route = state.route().await?;
    let handle = state.create_session(route);
    let snapshot = handle.snapshot().await?;

    tracing::info!(
        "Created playback session {} ({} points)",
        handle.id(),
        snapshot.total_points
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: handle.id().to_string(),
            snapshot,
        }),
    ))
}

fn session(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .get(id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    let snapshot = session(&state, &id)?.snapshot().await?;
    Ok(Json(snapshot))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let handle = state
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    // the task may already be gone, which is the outcome we want anyway
    let _ = handle.shutdown().await;
    tracing::info!("Closed playback session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn control(
    state: &AppState,
    id: &str,
    control: Control,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    let snapshot = session(state, id)?.control(control).await?;
    Ok(Json(snapshot))
}

async fn play(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    control(&state, &id, Control::Play).await
}

async fn pause(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    control(&state, &id, Control::Pause).await
}

async fn reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    control(&state, &id, Control::Reset).await
}

async fn set_speed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<PlaybackSnapshot>, AppError> {
    control(&state, &id, Control::SetSpeed(req.multiplier)).await
}
