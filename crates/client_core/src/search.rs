use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    FetchTrending,
    Search(String),
}

impl SearchAction {
    /// Empty (after trimming) text means "show trending".
    pub fn from_query(text: &str) -> Self {
        let query = text.trim();
        if query.is_empty() {
            SearchAction::FetchTrending
        } else {
            SearchAction::Search(query.to_string())
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SearchAction::FetchTrending => "fetch_trending",
            SearchAction::Search(_) => "search",
        }
    }
}

/// Receiver of settled actions. Implementations must not block: long-running
/// work belongs on a spawned task.
pub trait SearchDispatch: Send + Sync {
    fn dispatch(self: Arc<Self>, action: SearchAction);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Pending { query: String },
}

struct PendingTimer {
    generation: u64,
    query: String,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    pending: Option<PendingTimer>,
}

impl TimerSlot {
    /// Removes the pending timer only if it is still the one armed under
    /// `generation`.
    fn take_if_current(&mut self, generation: u64) -> Option<PendingTimer> {
        match &self.pending {
            Some(pending) if pending.generation == generation => self.pending.take(),
            _ => None,
        }
    }
}

pub struct SearchCoordinator {
    delay: Duration,
    target: Arc<dyn SearchDispatch>,
    slot: Arc<Mutex<TimerSlot>>,
}

impl SearchCoordinator {
    pub fn new(target: Arc<dyn SearchDispatch>) -> Self {
        Self::with_delay(target, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_delay(target: Arc<dyn SearchDispatch>, delay: Duration) -> Self {
        Self {
            delay,
            target,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records `text` as the latest input and (re)arms the debounce timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input(&self, text: &str) {
        let query = text.trim().to_string();
        let mut slot = lock_slot(&self.slot);

        if let Some(previous) = slot.pending.take() {
            previous.task.abort();
            debug!(
                superseded = %previous.query,
                query = %query,
                "debounce timer reset"
            );
        }

        slot.generation += 1;
        let generation = slot.generation;
        let task = tokio::spawn(fire_after(
            self.delay,
            generation,
            Arc::clone(&self.slot),
            Arc::clone(&self.target),
        ));
        slot.pending = Some(PendingTimer {
            generation,
            query,
            task,
        });
    }

    /// Editor "done" action. Goes through the same debounce as typing; blank
    /// text is ignored. Returns whether the input was accepted.
    pub fn submit(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.on_input(text);
        true
    }

    /// Disarms the pending timer, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        let mut slot = lock_slot(&self.slot);
        if let Some(pending) = slot.pending.take() {
            pending.task.abort();
            debug!(query = %pending.query, "debounce timer cancelled");
        }
    }

    pub fn state(&self) -> CoordinatorState {
        match &lock_slot(&self.slot).pending {
            Some(pending) => CoordinatorState::Pending {
                query: pending.query.clone(),
            },
            None => CoordinatorState::Idle,
        }
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn fire_after(
    delay: Duration,
    generation: u64,
    slot: Arc<Mutex<TimerSlot>>,
    target: Arc<dyn SearchDispatch>,
) {
    tokio::time::sleep(delay).await;

    // An abort can race with expiry; only the timer still armed may emit.
    let Some(pending) = lock_slot(&slot).take_if_current(generation) else {
        return;
    };

    let action = SearchAction::from_query(&pending.query);
    info!(action = action.label(), query = %pending.query, "debounced input settled");
    target.dispatch(action);
}

fn lock_slot(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
