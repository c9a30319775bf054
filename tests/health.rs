use axum::{body::to_bytes, http::Request, Router};
use routeplay_rs::{config::Config, error::LoadError, pipeline::load, routes, state::AppState};
use tower::ServiceExt;

fn sample_route() -> &'static str {
    r#"[
        {"latitude": 52.5200, "longitude": 13.4050, "timestamp": "2026-01-01T12:00:00Z"},
        {"latitude": 52.5205, "longitude": 13.4060, "timestamp": "2026-01-01T12:00:10Z"}
    ]"#
}

fn app(route: Result<routeplay_rs::types::route::Route, LoadError>) -> Router {
    let state = AppState::new(Config::from_env(), route);
    Router::new()
        .merge(routes::health::router())
        .merge(routes::route::router())
        .merge(routes::sessions::router())
        .with_state(state)
}

async fn get_text(app: Router, uri: &str) -> (axum::http::StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, String::from_utf8(body.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let route = load::parse_route(sample_route().as_bytes());
    let (status, text) = get_text(app(route), "/health").await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert!(text.contains("\"status\":\"ok\""));
    assert!(text.contains("\"route_loaded\":true"));
}

#[tokio::test]
async fn health_reports_failed_route() {
    let (status, text) = get_text(app(Err(LoadError::Status(404))), "/health").await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert!(text.contains("\"route_loaded\":false"));
}
