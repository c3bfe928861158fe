//! Deadline-based deferred work, polled from the host's frame loop.
//!
//! Every schedule bumps a generation token; a deadline that was superseded
//! or cancelled never fires.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Quiet period before the region registry is rebuilt.
pub const REFRESH_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// A single pending deadline with a generation token.
#[derive(Debug, Clone, Default)]
pub struct DeferredTask {
    generation: u64,
    due: Option<Instant>,
}

impl DeferredTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) the task. Returns the new generation.
    pub fn schedule(&mut self, now: Instant, delay: Duration) -> u64 {
        self.generation += 1;
        self.due = Some(now + delay);
        self.generation
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the firing generation once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                Some(self.generation)
            }
            _ => None,
        }
    }
}

/// Coalesces bursts of scene changes into one refresh.
#[derive(Debug, Clone)]
pub struct RefreshDebouncer {
    quiet: Duration,
    task: DeferredTask,
}

impl Default for RefreshDebouncer {
    fn default() -> Self {
        Self::new(REFRESH_QUIET_PERIOD)
    }
}

impl RefreshDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            task: DeferredTask::new(),
        }
    }

    /// Record a change; restarts the quiet period.
    pub fn notify(&mut self, now: Instant) {
        self.task.schedule(now, self.quiet);
    }

    /// True once per burst, after the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.task.poll(now).is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_pending()
    }

    pub fn cancel(&mut self) {
        self.task.cancel();
    }
}

/// Shared change counter handed to a host as a scene listener.
#[derive(Debug, Clone, Default)]
pub struct ChangeCounter {
    count: Rc<Cell<u64>>,
    seen: u64,
}

impl ChangeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that bumps this counter.
    pub fn listener(&self) -> Box<dyn FnMut()> {
        let count = Rc::clone(&self.count);
        Box::new(move || count.set(count.get() + 1))
    }

    /// Whether changes arrived since the last call.
    pub fn take_changes(&mut self) -> bool {
        let current = self.count.get();
        let changed = current != self.seen;
        self.seen = current;
        changed
    }
}
