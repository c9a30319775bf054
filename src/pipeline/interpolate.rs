use std::time::Duration;

use tokio::time::Instant;

use crate::types::playback::MarkerPhase;
use crate::types::route::LatLng;

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: LatLng,
    to: LatLng,
    started_at: Instant,
}

/// Moves the marker between route points, one transition at a time.
///
/// The interpolator never schedules anything itself: the owner calls
/// [`sample`](Self::sample) on every frame while [`is_animating`](Self::is_animating)
/// is true.
#[derive(Debug, Clone)]
pub struct PositionInterpolator {
    duration: Duration,
    position: Option<LatLng>,
    transition: Option<Transition>,
}

impl PositionInterpolator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            position: None,
            transition: None,
        }
    }

    pub fn position(&self) -> Option<LatLng> {
        self.position
    }

    pub fn phase(&self) -> MarkerPhase {
        match (self.position, self.transition) {
            (None, _) => MarkerPhase::Idle,
            (Some(_), Some(_)) => MarkerPhase::Animating,
            (Some(_), None) => MarkerPhase::Settled,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Starts moving towards `target`. An in-flight transition is dropped and
    /// the new one starts from wherever the marker currently is.
    pub fn set_target(&mut self, target: LatLng, now: Instant) {
        let Some(current) = self.position else {
            self.position = Some(target);
            return;
        };

        if current == target {
            self.position = Some(target);
            self.transition = None;
            return;
        }

        self.transition = Some(Transition {
            from: current,
            to: target,
            started_at: now,
        });
    }

    /// Advances the marker to `now` and returns its position.
    pub fn sample(&mut self, now: Instant) -> Option<LatLng> {
        let Some(transition) = self.transition else {
            return self.position;
        };

        let progress = progress(transition.started_at, now, self.duration);
        if progress >= 1.0 {
            self.position = Some(transition.to);
            self.transition = None;
        } else {
            self.position = Some(lerp(transition.from, transition.to, progress));
        }
        self.position
    }
}

fn progress(started_at: Instant, now: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started_at);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

pub fn lerp(from: LatLng, to: LatLng, t: f64) -> LatLng {
    LatLng {
        latitude: from.latitude + (to.latitude - from.latitude) * t,
        longitude: from.longitude + (to.longitude - from.longitude) * t,
    }
}
