use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::event::AppEvent;

/// Source of one-second ticks bound to a single round.
///
/// The clock only produces ticks; the round state machine applies them. Every tick
/// carries the id of the round it was started for, so a tick that was already
/// queued when the round ended is recognisably stale and gets dropped.
pub trait RoundClock {
    fn start(&mut self, round_id: u64);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Background thread posting `AppEvent::ClockTick` into the shared event queue.
pub struct ThreadClock {
    tx: mpsc::Sender<AppEvent>,
    period: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl ThreadClock {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self::with_period(tx, Duration::from_secs(1))
    }

    pub fn with_period(tx: mpsc::Sender<AppEvent>, period: Duration) -> Self {
        Self {
            tx,
            period,
            cancel: None,
        }
    }
}

impl RoundClock for ThreadClock {
    fn start(&mut self, round_id: u64) {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let period = self.period;

        thread::spawn(move || {
            loop {
                thread::sleep(period);
                if flag.load(Ordering::Acquire) {
                    return;
                }
                if tx.send(AppEvent::ClockTick(round_id)).is_err() {
                    return;
                }
            }
        });

        self.cancel = Some(cancel);
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Release);
        }
    }

    fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ThreadClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clock driven by the caller. Used headless and in tests, where ticks are
/// delivered explicitly through `GameEngine::clock_tick`.
///
/// Clones share state, so a clone kept outside the engine observes what the
/// engine does with the boxed one.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    running_round: Rc<Cell<Option<u64>>>,
    starts: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_round(&self) -> Option<u64> {
        self.running_round.get()
    }

    pub fn starts(&self) -> u32 {
        self.starts.get()
    }
}

impl RoundClock for ManualClock {
    fn start(&mut self, round_id: u64) {
        self.running_round.set(Some(round_id));
        self.starts.set(self.starts.get() + 1);
    }

    fn stop(&mut self) {
        self.running_round.set(None);
    }

    fn is_running(&self) -> bool {
        self.running_round.get().is_some()
    }
}
