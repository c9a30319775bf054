use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 3600);

/// Something that can be started on a fixed period and cancelled again.
pub trait TickSource {
    fn start(&mut self, period: Duration);
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Owning handle of a periodic task. Cancelling or dropping it aborts the task.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Emits `make_event()` on `sender` every `period`, first one after a full period.
pub fn spawn_ticker<E, F>(period: Duration, sender: mpsc::Sender<E>, make_event: F) -> TickHandle
where
    E: Send + 'static,
    F: Fn() -> E + Send + 'static,
{
    let period = period.clamp(MIN_PERIOD, MAX_PERIOD);
    let task = tokio::spawn(async move {
        let now = Instant::now();
        let start = now.checked_add(period).unwrap_or(now);
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if sender.send(make_event()).await.is_err() {
                break;
            }
        }
    });
    TickHandle { task }
}

/// Tick source feeding a channel. Each `start` bumps a generation number that
/// is stamped on every emitted event, so events queued before a cancel or a
/// restart can be recognised and dropped by the receiver.
pub struct ChannelTickSource<E> {
    sender: mpsc::Sender<E>,
    wrap: fn(u64) -> E,
    generation: u64,
    handle: Option<TickHandle>,
}

impl<E: Send + 'static> ChannelTickSource<E> {
    pub fn new(sender: mpsc::Sender<E>, wrap: fn(u64) -> E) -> Self {
        Self {
            sender,
            wrap,
            generation: 0,
            handle: None,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }
}

impl<E: Send + 'static> TickSource for ChannelTickSource<E> {
    fn start(&mut self, period: Duration) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let wrap = self.wrap;
        self.handle = Some(spawn_ticker(period, self.sender.clone(), move || {
            wrap(generation)
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}
