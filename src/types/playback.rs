use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::types::route::{LatLng, RoutePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub status: PlaybackStatus,
    pub speed_multiplier: f64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            status: PlaybackStatus::Stopped,
            speed_multiplier: 1.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantaneous speed between a point and its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedReading {
    /// First point, or a route too short to have a predecessor.
    Zero,
    /// Elapsed time between the two points was zero or negative.
    NotAvailable,
    Kmh(f64),
}

impl SpeedReading {
    pub fn as_kmh(&self) -> Option<f64> {
        match self {
            SpeedReading::Zero => Some(0.0),
            SpeedReading::NotAvailable => None,
            SpeedReading::Kmh(value) => Some(*value),
        }
    }
}

impl fmt::Display for SpeedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedReading::Zero => f.write_str("0.00"),
            SpeedReading::NotAvailable => f.write_str("N/A"),
            SpeedReading::Kmh(value) => write!(f, "{:.2}", value),
        }
    }
}

impl Serialize for SpeedReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPhase {
    Idle,
    Animating,
    Settled,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub session_id: String,
    pub status: PlaybackStatus,
    pub current_index: usize,
    pub total_points: usize,
    pub speed_multiplier: f64,
    pub tick_interval_ms: u64,
    pub current_point: RoutePoint,
    pub marker: Option<LatLng>,
    pub marker_phase: MarkerPhase,
    pub distance_km: f64,
    pub speed_kmh: SpeedReading,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_reading_displays_sentinels() {
        assert_eq!(SpeedReading::Zero.to_string(), "0.00");
        assert_eq!(SpeedReading::NotAvailable.to_string(), "N/A");
        assert_eq!(SpeedReading::Kmh(66.7).to_string(), "66.70");
    }

    #[test]
    fn speed_reading_serializes_as_display_string() {
        let json = serde_json::to_string(&SpeedReading::NotAvailable).expect("json");
        assert_eq!(json, "\"N/A\"");
    }

    #[test]
    fn new_state_is_stopped_at_start() {
        let state = PlaybackState::default();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.status, PlaybackStatus::Stopped);
        assert_eq!(state.speed_multiplier, 1.0);
        assert!(!state.is_playing());
    }
}
