use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::PlaybackSettings;
use crate::error::{PlaybackError, SessionError};
use crate::pipeline::geo;
use crate::pipeline::interpolate::PositionInterpolator;
use crate::playback::controller::{PlaybackController, TickOutcome};
use crate::playback::ticker::{ChannelTickSource, TickSource};
use crate::types::playback::PlaybackSnapshot;
use crate::types::route::Route;

const COMMAND_BUFFER: usize = 32;
const PULSE_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Play,
    Pause,
    Reset,
    SetSpeed(f64),
}

enum SessionCommand {
    Control(
        Control,
        oneshot::Sender<Result<PlaybackSnapshot, PlaybackError>>,
    ),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum Pulse {
    Tick(u64),
    Frame(u64),
}

/// Cheap, cloneable handle to a running playback session.
///
/// The session task ends when [`shutdown`](Self::shutdown) is called or the
/// last handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    route: Arc<Route>,
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub async fn control(&self, control: Control) -> Result<PlaybackSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Control(control, reply)).await?;
        let result = response.await.map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    pub async fn play(&self) -> Result<PlaybackSnapshot, SessionError> {
        self.control(Control::Play).await
    }

    pub async fn pause(&self) -> Result<PlaybackSnapshot, SessionError> {
        self.control(Control::Pause).await
    }

    pub async fn reset(&self) -> Result<PlaybackSnapshot, SessionError> {
        self.control(Control::Reset).await
    }

    pub async fn set_speed(&self, multiplier: f64) -> Result<PlaybackSnapshot, SessionError> {
        self.control(Control::SetSpeed(multiplier)).await
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Single-owner task running one playback of a route: the controller, the
/// marker interpolator and both of their tick sources live here and nowhere else.
pub struct PlaybackSession {
    id: String,
    route: Arc<Route>,
    settings: PlaybackSettings,
    controller: PlaybackController<ChannelTickSource<Pulse>>,
    frames: ChannelTickSource<Pulse>,
    marker: PositionInterpolator,
    commands: mpsc::Receiver<SessionCommand>,
    pulses: mpsc::Receiver<Pulse>,
}

impl PlaybackSession {
    pub fn spawn(id: String, route: Arc<Route>, settings: PlaybackSettings) -> SessionHandle {
        let (session, handle) = Self::new(id, route, settings);
        tokio::spawn(session.run());
        handle
    }

    fn new(id: String, route: Arc<Route>, settings: PlaybackSettings) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (pulse_tx, pulse_rx) = mpsc::channel(PULSE_BUFFER);

        let ticks = ChannelTickSource::new(pulse_tx.clone(), Pulse::Tick);
        let frames = ChannelTickSource::new(pulse_tx, Pulse::Frame);

        let mut marker = PositionInterpolator::new(settings.transition);
        marker.set_target(route[0].position(), Instant::now());

        let session = PlaybackSession {
            id: id.clone(),
            route: route.clone(),
            settings,
            controller: PlaybackController::new(route.last_index(), settings.base_interval, ticks),
            frames,
            marker,
            commands: command_rx,
            pulses: pulse_rx,
        };
        let handle = SessionHandle {
            id,
            route,
            commands: command_tx,
        };
        (session, handle)
    }

    async fn run(mut self) {
        tracing::debug!("Session {} started ({} points)", self.id, self.route.len());

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(pulse) = self.pulses.recv() => self.handle_pulse(pulse),
            }
        }

        self.teardown();
        tracing::debug!("Session {} shut down", self.id);
    }

    fn teardown(&mut self) {
        self.controller.shutdown();
        self.frames.cancel();
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Control(control, reply) => {
                let result = self.apply(control).map(|_| self.snapshot());
                let _ = reply.send(result);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn apply(&mut self, control: Control) -> Result<(), PlaybackError> {
        let index_before = self.controller.state().current_index;
        match control {
            Control::Play => self.controller.play(),
            Control::Pause => self.controller.pause(),
            Control::Reset => self.controller.reset(),
            Control::SetSpeed(multiplier) => self.controller.set_speed(multiplier)?,
        }

        let state = self.controller.state();
        tracing::debug!(
            "Session {}: {:?} -> {:?} at index {} (x{})",
            self.id,
            control,
            state.status,
            state.current_index,
            state.speed_multiplier
        );
        if state.current_index != index_before {
            self.retarget_marker(state.current_index);
        }
        Ok(())
    }

    fn handle_pulse(&mut self, pulse: Pulse) {
        match pulse {
            Pulse::Tick(generation) => {
                if !self.controller.ticks().is_current(generation) {
                    return;
                }
                match self.controller.tick() {
                    TickOutcome::Advanced(index) => self.retarget_marker(index),
                    TickOutcome::ReachedEnd => {
                        tracing::info!(
                            "Session {} reached the end of the route ({} points)",
                            self.id,
                            self.route.len()
                        );
                    }
                    TickOutcome::Ignored => {}
                }
            }
            Pulse::Frame(generation) => {
                if !self.frames.is_current(generation) {
                    return;
                }
                self.marker.sample(Instant::now());
                if !self.marker.is_animating() {
                    self.frames.cancel();
                }
            }
        }
    }

    fn retarget_marker(&mut self, index: usize) {
        let Some(point) = self.route.get(index) else {
            return;
        };
        self.marker.set_target(point.position(), Instant::now());
        if self.marker.is_animating() {
            if !self.frames.is_active() {
                self.frames.start(self.settings.frame_interval);
            }
        } else {
            self.frames.cancel();
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.controller.state();
        let index = state.current_index;
        PlaybackSnapshot {
            session_id: self.id.clone(),
            status: state.status,
            current_index: index,
            total_points: self.route.len(),
            speed_multiplier: state.speed_multiplier,
            tick_interval_ms: self.controller.tick_interval().as_millis() as u64,
            current_point: self.route[index].clone(),
            marker: self.marker.position(),
            marker_phase: self.marker.phase(),
            distance_km: geo::cumulative_distance_km(&self.route, index),
            speed_kmh: geo::speed_kmh(&self.route, index),
        }
    }
}
