use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::events::{Observers, SubscriptionId};

/// Debounced loading indicator.
///
/// `fetching = true` shows the indicator at once. `fetching = false` only
/// hides it after `idle_delay` with no new fetch, so back-to-back dispatches
/// don't flicker. The first `fetching = false` also fires the one-time
/// initial-render-complete signal.
pub struct ProgressTracker {
    loading: bool,
    initial_complete: bool,
    idle_at: Option<Instant>,
    idle_delay: Duration,
    loading_changed: Observers<bool>,
    initial_render: Observers<()>,
}

impl ProgressTracker {
    /// Starts in the loading state.
    pub fn new(idle_delay: Duration) -> Self {
        Self {
            loading: true,
            initial_complete: false,
            idle_at: None,
            idle_delay,
            loading_changed: Observers::new(),
            initial_render: Observers::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn initial_complete(&self) -> bool {
        self.initial_complete
    }

    pub fn on_loading_changed(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.loading_changed.subscribe(listener)
    }

    pub fn on_initial_render(&mut self, listener: impl FnMut(&()) + 'static) -> SubscriptionId {
        self.initial_render.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.loading_changed.unsubscribe(id) || self.initial_render.unsubscribe(id)
    }

    pub fn set_fetching(&mut self, fetching: bool, now: Instant) {
        if fetching {
            if self.idle_at.take().is_some() {
                trace!("Pending idle cancelled");
            }
            if !self.loading {
                self.loading = true;
                self.loading_changed.emit(&true);
            }
            return;
        }

        if !self.initial_complete {
            self.initial_complete = true;
            debug!("Initial render complete");
            self.initial_render.emit(&());
        }
        if self.loading {
            self.idle_at = Some(now + self.idle_delay);
        }
    }

    /// Fire the pending idle transition if its time has come.
    pub fn poll(&mut self, now: Instant) {
        if self.idle_at.is_some_and(|at| now >= at) {
            self.idle_at = None;
            self.loading = false;
            self.loading_changed.emit(&false);
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("loading", &self.loading)
            .field("initial_complete", &self.initial_complete)
            .field("idle_at", &self.idle_at)
            .finish()
    }
}
