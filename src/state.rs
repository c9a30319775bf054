use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, LoadError};
use crate::playback::session::{PlaybackSession, SessionHandle};
use crate::types::route::Route;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    route: Arc<RwLock<Result<Arc<Route>, LoadError>>>,
    sessions: Arc<DashMap<String, CachedSession>>,
}

struct CachedSession {
    handle: SessionHandle,
    last_access: Instant,
}

impl AppState {
    pub fn new(config: Config, route: Result<Route, LoadError>) -> Self {
        Self {
            config: Arc::new(config),
            route: Arc::new(RwLock::new(route.map(Arc::new))),
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn route(&self) -> Result<Arc<Route>, AppError> {
        match &*self.route.read().await {
            Ok(route) => Ok(route.clone()),
            Err(err) => Err(AppError::RouteUnavailable(err.to_string())),
        }
    }

    /// Swaps in a freshly loaded route. Running sessions keep the one they started with.
    pub async fn replace_route(&self, route: Result<Route, LoadError>) {
        *self.route.write().await = route.map(Arc::new);
    }

    pub fn create_session(&self, route: Arc<Route>) -> SessionHandle {
        let id = Uuid::new_v4().to_string();
        let handle = PlaybackSession::spawn(id.clone(), route, self.config.playback);
        self.sessions.insert(
            id,
            CachedSession {
                handle: handle.clone(),
                last_access: Instant::now(),
            },
        );
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get_mut(session_id).map(|mut entry| {
            entry.last_access = Instant::now();
            entry.handle.clone()
        })
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .remove(session_id)
            .map(|(_, cached)| cached.handle)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.sessions.retain(|_, cached| {
            now.duration_since(cached.last_access) < ttl && !cached.handle.is_closed()
        });
        tracing::info!("Session eviction complete. Active sessions: {}", self.sessions.len());
    }
}
