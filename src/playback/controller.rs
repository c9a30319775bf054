use std::time::Duration;

use crate::error::PlaybackError;
use crate::playback::ticker::TickSource;
use crate::types::playback::{PlaybackState, PlaybackStatus};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
/// Slowest effective tick; tiny multipliers saturate here instead of overflowing.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(usize),
    ReachedEnd,
    Ignored,
}

/// Play/pause/reset state machine over a route whose final point is `last_index`.
///
/// The controller owns its tick source and is the only place that starts or
/// cancels it; the owner forwards every tick back through [`tick`](Self::tick).
pub struct PlaybackController<T: TickSource> {
    last_index: usize,
    base_interval: Duration,
    state: PlaybackState,
    ticks: T,
}

impl<T: TickSource> PlaybackController<T> {
    pub fn new(last_index: usize, base_interval: Duration, ticks: T) -> Self {
        Self {
            last_index,
            base_interval,
            state: PlaybackState::new(),
            ticks,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn tick_interval(&self) -> Duration {
        let secs = self.base_interval.as_secs_f64() / self.state.speed_multiplier;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_TICK_INTERVAL)
            .clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL)
    }

    pub fn play(&mut self) {
        if self.state.is_playing() {
            return;
        }
        self.state.status = PlaybackStatus::Playing;
        self.ticks.start(self.tick_interval());
    }

    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        self.state.status = PlaybackStatus::Paused;
        self.ticks.cancel();
    }

    pub fn reset(&mut self) {
        self.ticks.cancel();
        self.state.status = PlaybackStatus::Stopped;
        self.state.current_index = 0;
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), PlaybackError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(PlaybackError::InvalidSpeed(multiplier));
        }
        self.state.speed_multiplier = multiplier;
        if self.state.is_playing() {
            self.ticks.start(self.tick_interval());
        }
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_playing() {
            return TickOutcome::Ignored;
        }
        if self.state.current_index < self.last_index {
            self.state.current_index += 1;
            TickOutcome::Advanced(self.state.current_index)
        } else {
            self.state.status = PlaybackStatus::Paused;
            self.ticks.cancel();
            TickOutcome::ReachedEnd
        }
    }

    /// Releases the tick source without touching the playback state.
    pub fn shutdown(&mut self) {
        self.ticks.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start(Duration),
        Cancel,
    }

    #[derive(Default)]
    struct RecordingTicks {
        calls: Vec<Call>,
        active: bool,
    }

    impl TickSource for RecordingTicks {
        fn start(&mut self, period: Duration) {
            self.calls.push(Call::Start(period));
            self.active = true;
        }

        fn cancel(&mut self) {
            self.calls.push(Call::Cancel);
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn controller(route_len: usize) -> PlaybackController<RecordingTicks> {
        PlaybackController::new(route_len - 1, Duration::from_millis(2000), RecordingTicks::default())
    }

    #[test]
    fn play_starts_ticks_at_base_interval() {
        let mut c = controller(3);
        c.play();
        assert_eq!(c.state().status, PlaybackStatus::Playing);
        assert_eq!(c.ticks().calls, vec![Call::Start(Duration::from_millis(2000))]);

        // already playing
        c.play();
        assert_eq!(c.ticks().calls.len(), 1);
    }

    #[test]
    fn runs_to_the_end_and_auto_pauses() {
        let mut c = controller(3);
        c.play();
        assert_eq!(c.tick(), TickOutcome::Advanced(1));
        assert_eq!(c.tick(), TickOutcome::Advanced(2));
        assert_eq!(c.tick(), TickOutcome::ReachedEnd);

        let state = c.state();
        assert_eq!(state.status, PlaybackStatus::Paused);
        assert_eq!(state.current_index, 2);
        assert!(!c.ticks().is_active());
        assert_eq!(c.tick(), TickOutcome::Ignored);
        assert_eq!(c.state().current_index, 2);
    }

    #[test]
    fn single_point_route_pauses_on_first_tick() {
        let mut c = controller(1);
        c.play();
        assert_eq!(c.tick(), TickOutcome::ReachedEnd);
        assert_eq!(c.state().current_index, 0);
    }

    #[test]
    fn pause_keeps_index_and_cancels() {
        let mut c = controller(5);
        c.play();
        c.tick();
        c.pause();
        assert_eq!(c.state().status, PlaybackStatus::Paused);
        assert_eq!(c.state().current_index, 1);
        assert_eq!(c.ticks().calls.last(), Some(&Call::Cancel));
        assert_eq!(c.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn pause_when_not_playing_is_noop() {
        let mut c = controller(5);
        c.pause();
        assert_eq!(c.state().status, PlaybackStatus::Stopped);
        assert!(c.ticks().calls.is_empty());
    }

    #[test]
    fn reset_from_any_state_stops_at_zero() {
        let mut c = controller(4);
        c.reset();
        assert_eq!(c.state().status, PlaybackStatus::Stopped);

        c.play();
        c.tick();
        c.tick();
        c.reset();
        assert_eq!(c.state().status, PlaybackStatus::Stopped);
        assert_eq!(c.state().current_index, 0);
        assert!(!c.ticks().is_active());

        c.play();
        c.tick();
        c.pause();
        c.reset();
        assert_eq!(c.state().status, PlaybackStatus::Stopped);
        assert_eq!(c.state().current_index, 0);
    }

    #[test]
    fn set_speed_while_playing_restarts_ticks() {
        let mut c = controller(4);
        c.play();
        c.set_speed(4.0).expect("speed");
        assert_eq!(c.state().speed_multiplier, 4.0);
        assert_eq!(
            c.ticks().calls.last(),
            Some(&Call::Start(Duration::from_millis(500)))
        );
        assert_eq!(c.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn set_speed_while_stopped_has_no_side_effect_until_play() {
        let mut c = controller(4);
        c.set_speed(0.5).expect("speed");
        assert!(c.ticks().calls.is_empty());

        c.play();
        assert_eq!(c.ticks().calls, vec![Call::Start(Duration::from_millis(4000))]);
    }

    #[test]
    fn invalid_speed_is_rejected() {
        let mut c = controller(4);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(c.set_speed(bad).is_err());
        }
        assert_eq!(c.state().speed_multiplier, 1.0);
    }

    #[test]
    fn replay_from_the_end_pauses_again() {
        let mut c = controller(2);
        c.play();
        c.tick();
        assert_eq!(c.tick(), TickOutcome::ReachedEnd);
        c.play();
        assert_eq!(c.state().status, PlaybackStatus::Playing);
        assert_eq!(c.tick(), TickOutcome::ReachedEnd);
        assert_eq!(c.state().status, PlaybackStatus::Paused);
    }

    #[test]
    fn tiny_speed_saturates_the_tick_interval() {
        let mut c = controller(3);
        c.play();
        c.set_speed(1e-20).expect("speed");
        assert_eq!(c.tick_interval(), MAX_TICK_INTERVAL);
        assert_eq!(c.ticks().calls.last(), Some(&Call::Start(MAX_TICK_INTERVAL)));
        assert_eq!(c.state().status, PlaybackStatus::Playing);

        c.set_speed(f64::MAX).expect("speed");
        assert_eq!(c.tick_interval(), Duration::from_millis(1));
    }
}
