use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl RoutePoint {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Chronologically ordered, non-empty sequence of route points.
///
/// Built only by the loader, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Route {
    points: Vec<RoutePoint>,
}

impl Route {
    pub(crate) fn from_validated(points: Vec<RoutePoint>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

impl Deref for Route {
    type Target = [RoutePoint];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub points: usize,
    pub total_distance_km: f64,
    pub duration_seconds: u64,
    pub avg_speed_kmh: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
