use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::pipeline::{geo, load};
use crate::state::AppState;
use crate::types::route::{RoutePoint, RouteSummary};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/route", get(get_route))
        .route("/api/route/reload", post(reload_route))
}

#[derive(Serialize)]
struct RouteResponse {
    summary: RouteSummary,
    points: Vec<RoutePoint>,
}

async fn get_route(State(state): State<AppState>) -> Result<Json<RouteResponse>, AppError> {
    let route = state.route().await?;
    Ok(Json(RouteResponse {
        summary: geo::summarize(&route),
        points: route.points().to_vec(),
    }))
}

async fn reload_route(State(state): State<AppState>) -> Result<Json<RouteSummary>, AppError> {
    let source = state.config().route_source.clone();
    tracing::info!("Reloading route from {}", source);

    let result = load::fetch_route(&source).await;
    let outcome = match &result {
        Ok(route) => Ok(geo::summarize(route)),
        Err(err) => {
            tracing::warn!("Route reload failed: {}", err);
            Err(AppError::Load(err.clone()))
        }
    };
    state.replace_route(result).await;

    outcome.map(Json)
}
