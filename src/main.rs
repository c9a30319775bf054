use axum::Router;
use routeplay_rs::{config, pipeline::load, routes, state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routeplay_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();

    // Route is fetched once; a failure leaves the service up so clients can see it and reload
    let route = load::fetch_route(&config.route_source).await;
    if let Err(err) = &route {
        tracing::error!("Failed to load route from {}: {}", config.route_source, err);
    }

    let state = state::AppState::new(config.clone(), route);

    // Start session eviction task
    let eviction_state = state.clone();
    let eviction_ttl = config.session_ttl;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await; // Every 5 minutes
            eviction_state.evict_expired(eviction_ttl);
        }
    });

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::route::router())
        .merge(routes::sessions::router())
        .merge(routes::snapshot::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("RoutePlay listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Sessions: POST http://{}/api/sessions", addr);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
