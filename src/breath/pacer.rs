use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use super::breath::{BreathTimer, Pattern, Snapshot, TICK_INTERVAL_MS, TickOutcome};

pub type OutcomeSender = mpsc::UnboundedSender<TickOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<TickOutcome>;

pub fn create_outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug)]
struct Shared {
    timer: BreathTimer,
    // Bumped on every start/stop; a tick task only acts while its generation is current.
    generation: u64,
}

/// Drives a [`BreathTimer`] with one long-lived one-second ticker per running period.
///
/// All mutation of the session goes through a single mutex and never awaits while
/// holding it, so `start`, `stop` and ticks never interleave mid-update.
#[derive(Debug)]
pub struct Pacer {
    shared: Arc<Mutex<Shared>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    snapshot_tx: watch::Sender<Snapshot>,
    outcome_tx: Option<OutcomeSender>,
    period: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Nothing inside the critical sections can panic halfway through an update.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Pacer {
    pub fn new(pattern: Pattern, outcome_tx: Option<OutcomeSender>) -> Self {
        let timer = BreathTimer::new(pattern);
        let (snapshot_tx, _) = watch::channel(timer.snapshot());
        Self {
            shared: Arc::new(Mutex::new(Shared {
                timer,
                generation: 0,
            })),
            ticker: Mutex::new(None),
            snapshot_tx,
            outcome_tx,
            period: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }

    /// Start breathing from Inhale. Restarts the cycle if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut ticker = lock(&self.ticker);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.timer.start();
            self.snapshot_tx.send_replace(shared.timer.snapshot());
            shared.generation
        };

        tracing::info!(generation, "breathing started");
        *ticker = Some(tokio::spawn(run_ticker(
            Arc::clone(&self.shared),
            generation,
            self.period,
            self.snapshot_tx.clone(),
            self.outcome_tx.clone(),
        )));
    }

    /// Stop breathing and reset to the idle display.
    pub fn stop(&self) {
        let mut ticker = lock(&self.ticker);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.timer.stop();
        self.snapshot_tx.send_replace(shared.timer.snapshot());
        tracing::info!(generation = shared.generation, "breathing stopped");
    }

    /// Start when idle, stop when running. Returns whether the pacer is now running.
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).timer.is_running()
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared).timer.snapshot()
    }

    pub fn pattern(&self) -> Pattern {
        lock(&self.shared).timer.pattern()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        let ticker = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }
}

async fn run_ticker(
    shared: Arc<Mutex<Shared>>,
    generation: u64,
    period: Duration,
    snapshot_tx: watch::Sender<Snapshot>,
    outcome_tx: Option<OutcomeSender>,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let outcome = {
            let mut shared = lock(&shared);
            if shared.generation != generation {
                tracing::debug!(generation, "stale ticker exiting");
                return;
            }
            let outcome = shared.timer.tick();
            snapshot_tx.send_replace(shared.timer.snapshot());
            outcome
        };

        match outcome {
            TickOutcome::PhaseChanged { from, to } => {
                tracing::debug!(from = from.as_str(), to = to.as_str(), "phase changed");
            }
            TickOutcome::CycleCompleted { cycles } => {
                tracing::debug!(cycles, "cycle completed");
            }
            TickOutcome::Idle => return,
            TickOutcome::Counted { .. } => {}
        }

        if let Some(ref tx) = outcome_tx {
            let _ = tx.send(outcome);
        }
    }
}
