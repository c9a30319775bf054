use std::time::Duration;

use crate::types::marker::MarkerStyle;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub route_source: String,
    pub session_ttl: Duration,
    pub playback: PlaybackSettings,
    pub marker: MarkerStyle,
}

/// Timing knobs shared by every playback session.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackSettings {
    /// Tick interval at speed multiplier 1.
    pub base_interval: Duration,
    /// Duration of one marker transition between consecutive points.
    pub transition: Duration,
    /// Sampling period of the marker animation.
    pub frame_interval: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(2000),
            transition: Duration::from_millis(1000),
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(3000);

        let route_source =
            std::env::var("ROUTE_SOURCE").unwrap_or_else(|_| "assets/route.json".to_string());

        let session_ttl_seconds = env_parse::<u64>("SESSION_TTL_SECONDS").unwrap_or(3600);

        let defaults = PlaybackSettings::default();
        let playback = PlaybackSettings {
            base_interval: env_parse::<u64>("BASE_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_interval),
            transition: env_parse::<u64>("TRANSITION_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transition),
            frame_interval: env_parse::<u64>("FRAME_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_interval),
        };

        let marker = std::env::var("MARKER")
            .ok()
            .and_then(|name| MarkerStyle::get(&name))
            .unwrap_or_default();

        Self {
            port,
            route_source,
            session_ttl: Duration::from_secs(session_ttl_seconds),
            playback,
            marker,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
