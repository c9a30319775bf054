use crate::types::playback::SpeedReading;
use crate::types::route::{RoutePoint, RouteSummary};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (Haversine). NaN inputs propagate.
pub fn distance_km(a: &RoutePoint, b: &RoutePoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Distance travelled from the first point up to and including `upto_index`.
pub fn cumulative_distance_km(route: &[RoutePoint], upto_index: usize) -> f64 {
    if route.is_empty() || upto_index == 0 {
        return 0.0;
    }
    let end = upto_index.min(route.len() - 1);
    let total: f64 = route[..=end]
        .windows(2)
        .map(|pair| distance_km(&pair[0], &pair[1]))
        .sum();
    round2(total)
}

pub fn speed_kmh(route: &[RoutePoint], index: usize) -> SpeedReading {
    if index == 0 || route.len() <= 1 {
        return SpeedReading::Zero;
    }
    let (Some(prev), Some(curr)) = (route.get(index - 1), route.get(index)) else {
        return SpeedReading::NotAvailable;
    };

    let elapsed_ms = (curr.timestamp - prev.timestamp).num_milliseconds();
    if elapsed_ms <= 0 {
        return SpeedReading::NotAvailable;
    }
    let elapsed_hours = elapsed_ms as f64 / 3_600_000.0;
    SpeedReading::Kmh(round2(distance_km(prev, curr) / elapsed_hours))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize(route: &[RoutePoint]) -> RouteSummary {
    let mut distance_km_total = 0.0;
    let mut duration_seconds = 0u64;

    for pair in route.windows(2) {
        distance_km_total += distance_km(&pair[0], &pair[1]);
        duration_seconds += (pair[1].timestamp - pair[0].timestamp).num_seconds().max(0) as u64;
    }

    let avg_speed_kmh = if duration_seconds > 0 {
        (distance_km_total / (duration_seconds as f64)) * 3600.0
    } else {
        0.0
    };

    RouteSummary {
        points: route.len(),
        total_distance_km: round2(distance_km_total),
        duration_seconds,
        avg_speed_kmh: round2(avg_speed_kmh),
        started_at: route.first().map(|p| p.timestamp),
        finished_at: route.last().map(|p| p.timestamp),
    }
}

fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
