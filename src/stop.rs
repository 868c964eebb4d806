//! Cooperative cancellation: a [`StopSource`] requests, any number of
//! [`StopToken`]s observe.
//!
//! Observation is explicit: a callback is registered with
//! [`StopToken::on_stop`] and deregistered when the returned
//! [`StopCallback`] guard drops. There is no broadcast or ambient signal
//! delivery; an operation that wants to notice a stop request either
//! polls [`StopToken::stop_requested`] at its own checkpoints or keeps a
//! registration alive.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use slab::Slab;

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct StopState {
    stopped: AtomicBool,
    callbacks: Mutex<Slab<Callback>>,
}

impl StopState {
    fn callbacks(&self) -> MutexGuard<'_, Slab<Callback>> {
        // A callback panic poisons the lock but leaves the slab intact.
        match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The requesting half of a cancellation pair.
///
/// Cloning yields another handle to the same stop state, so a source can
/// be captured by the callback that forwards an outer stop request into
/// an inner one.
#[derive(Clone, Default)]
pub struct StopSource {
    state: Arc<StopState>,
}

impl StopSource {
    /// Creates a new, unstopped source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token observing this source.
    pub fn token(&self) -> StopToken {
        StopToken {
            state: Arc::clone(&self.state),
        }
    }

    /// Whether a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    /// Requests a stop. Idempotent: the first call runs every registered
    /// callback (on the calling thread); later calls do nothing.
    pub fn request_stop(&self) {
        if self.state.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        // Drain under the lock, run outside it: a callback may take its
        // own registrations down.
        let callbacks: Vec<Callback> = {
            let mut slab = self.state.callbacks();
            slab.drain().collect()
        };
        for callback in callbacks {
            callback();
        }
    }
}

impl fmt::Debug for StopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSource")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

/// The observing half of a cancellation pair.
#[derive(Clone)]
pub struct StopToken {
    state: Arc<StopState>,
}

impl StopToken {
    /// Whether the paired source has requested a stop.
    pub fn stop_requested(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    /// Registers `callback` to run when a stop is requested.
    ///
    /// If the stop was already requested, `callback` runs immediately on
    /// the calling thread. The registration lives until the returned
    /// guard drops; a callback never runs after its guard is gone.
    pub fn on_stop<F>(&self, callback: F) -> StopCallback
    where
        F: FnOnce() + Send + 'static,
    {
        if self.stop_requested() {
            callback();
            return StopCallback { state: None, key: 0 };
        }
        let key = self.state.callbacks().insert(Box::new(callback));
        // The source may have fired between the check and the insert, in
        // which case the drain has already happened and the callback
        // would otherwise be lost.
        if self.stop_requested() {
            if let Some(callback) = self.state.callbacks().try_remove(key) {
                callback();
            }
            return StopCallback { state: None, key: 0 };
        }
        StopCallback {
            state: Some(Arc::clone(&self.state)),
            key,
        }
    }
}

impl fmt::Debug for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopToken")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

/// Guard for a callback registered with [`StopToken::on_stop`].
///
/// Dropping it deregisters the callback if it has not already run.
#[must_use = "dropping the guard immediately deregisters the callback"]
pub struct StopCallback {
    state: Option<Arc<StopState>>,
    key: usize,
}

impl Drop for StopCallback {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.callbacks().try_remove(self.key);
        }
    }
}

impl fmt::Debug for StopCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopCallback")
            .field("registered", &self.state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn callback_runs_on_request() {
        let fired = Arc::new(AtomicUsize::new(0));
        let source = StopSource::new();
        let guard = source.token().on_stop({
            let fired = Arc::clone(&fired);
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(!source.stop_requested());
        source.request_stop();
        source.request_stop();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        drop(guard);
    }

    #[test]
    fn callback_runs_immediately_when_already_stopped() {
        let fired = Arc::new(AtomicUsize::new(0));
        let source = StopSource::new();
        source.request_stop();
        let _guard = source.token().on_stop({
            let fired = Arc::clone(&fired);
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_guard_deregisters() {
        let fired = Arc::new(AtomicUsize::new(0));
        let source = StopSource::new();
        let guard = source.token().on_stop({
            let fired = Arc::clone(&fired);
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        drop(guard);
        source.request_stop();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tokens_share_state() {
        let source = StopSource::new();
        let token = source.token();
        let other = token.clone();
        source.request_stop();
        assert!(token.stop_requested());
        assert!(other.stop_requested());
    }
}
