//! Stage sequencing for step-by-step playback, with an optional auto-play timer.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{domain::Stage, protocol::SequencerEvent};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

mod cursor;

pub use cursor::StageCursor;

pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(2500);
const EVENT_CHANNEL_CAPACITY: usize = 64;
// tokio intervals panic on a zero period.
const MIN_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the current stage and the single auto-play task.
///
/// Manual actions and timer ticks both go through the same mutex and the same
/// [`StageCursor`] transitions.
pub struct Sequencer {
    inner: Arc<Mutex<SequencerState>>,
    events: broadcast::Sender<SequencerEvent>,
    interval: Duration,
}

struct SequencerState {
    cursor: StageCursor,
    /// Bumped whenever a timer starts or is cancelled; a tick from an older
    /// epoch is discarded.
    epoch: u64,
    timer: Option<AutoPlayTimer>,
}

struct AutoPlayTimer {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Drop for SequencerState {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOPLAY_INTERVAL)
    }
}

impl Sequencer {
    pub fn new(interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(SequencerState {
                cursor: StageCursor::new(),
                epoch: 0,
                timer: None,
            })),
            events,
            interval: interval.max(MIN_AUTOPLAY_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.events.subscribe()
    }

    pub async fn cursor(&self) -> StageCursor {
        self.inner.lock().await.cursor
    }

    pub async fn current(&self) -> Stage {
        self.cursor().await.stage()
    }

    pub async fn is_auto_playing(&self) -> bool {
        self.cursor().await.auto_play()
    }

    /// Whether a timer task is currently registered.
    pub async fn has_active_timer(&self) -> bool {
        self.inner.lock().await.timer.is_some()
    }

    pub async fn next(&self) -> Stage {
        self.apply(StageCursor::next).await
    }

    pub async fn previous(&self) -> Stage {
        self.apply(StageCursor::previous).await
    }

    pub async fn jump_to(&self, stage: Stage) -> Stage {
        self.apply(|cursor| cursor.jump_to(stage)).await
    }

    pub async fn reset(&self) -> Stage {
        self.apply(StageCursor::reset).await
    }

    /// Returns the flag after toggling.
    pub async fn toggle_auto_play(&self) -> bool {
        let mut state = self.inner.lock().await;
        let events: Vec<_> = state.cursor.toggle_auto_play().into_iter().collect();
        self.commit(&mut state, events);
        state.cursor.auto_play()
    }

    /// Idempotent: enabling twice keeps the one running timer.
    pub async fn set_auto_play(&self, enabled: bool) -> bool {
        let mut state = self.inner.lock().await;
        let events: Vec<_> = state.cursor.set_auto_play(enabled).into_iter().collect();
        self.commit(&mut state, events);
        state.cursor.auto_play()
    }

    pub async fn stop_auto_play(&self) {
        self.set_auto_play(false).await;
    }

    async fn apply<F>(&self, transition: F) -> Stage
    where
        F: FnOnce(&mut StageCursor) -> Vec<SequencerEvent>,
    {
        let mut state = self.inner.lock().await;
        let events = transition(&mut state.cursor);
        self.commit(&mut state, events);
        state.cursor.stage()
    }

    /// Publishes the events of one transition and brings the timer in line
    /// with the cursor's auto-play flag.
    fn commit(&self, state: &mut SequencerState, events: Vec<SequencerEvent>) {
        for event in events {
            debug!(?event, "sequencer transition");
            let _ = self.events.send(event);
        }

        match (state.cursor.auto_play(), state.timer.is_some()) {
            (true, false) => {
                state.epoch += 1;
                let handle = spawn_ticker(
                    Arc::downgrade(&self.inner),
                    self.events.clone(),
                    self.interval,
                    state.epoch,
                );
                state.timer = Some(AutoPlayTimer {
                    epoch: state.epoch,
                    handle,
                });
                info!(
                    interval_ms = self.interval.as_millis() as u64,
                    stage = %state.cursor.stage(),
                    "auto-play started"
                );
            }
            (false, true) => {
                state.epoch += 1;
                if let Some(timer) = state.timer.take() {
                    timer.handle.abort();
                    info!(epoch = timer.epoch, "auto-play cancelled");
                }
            }
            _ => {}
        }
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        // The task only holds a weak reference, so this is normally the last
        // strong one and `SequencerState::drop` aborts the timer. If a tick is
        // mid-flight it holds the lock; it exits on its next loop.
        if let Ok(mut state) = self.inner.try_lock() {
            state.epoch += 1;
            if let Some(timer) = state.timer.take() {
                timer.handle.abort();
            }
        }
    }
}

fn spawn_ticker(
    state: Weak<Mutex<SequencerState>>,
    events: broadcast::Sender<SequencerEvent>,
    period: Duration,
    epoch: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(inner) = state.upgrade() else {
                break;
            };
            let mut guard = inner.lock().await;
            if guard.epoch != epoch {
                break;
            }

            for event in guard.cursor.tick() {
                debug!(?event, "auto-play tick");
                let _ = events.send(event);
            }

            if !guard.cursor.auto_play() {
                // Finished on our own: drop the handle without aborting.
                guard.timer = None;
                guard.epoch += 1;
                info!(stage = %guard.cursor.stage(), "auto-play reached the final stage");
                break;
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
