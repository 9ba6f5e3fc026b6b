// ── Subscription handles ──
//
// Every `subscribe`/`start`/`attach` in this crate returns a
// `Subscription`. Cancelling it (explicitly or by dropping it) stops the
// backing task and guarantees the callback is not invoked again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

type Hook = Box<dyn FnOnce() + Send>;

/// Handle to a live subscription. Cancels on drop.
pub struct Subscription {
    token: CancellationToken,
    cancelled: AtomicBool,
    on_cancel: Mutex<Option<Hook>>,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            cancelled: AtomicBool::new(false),
            on_cancel: Mutex::new(None),
        }
    }

    /// Run `hook` once, on the first cancellation.
    pub(crate) fn with_hook(token: CancellationToken, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            token,
            cancelled: AtomicBool::new(false),
            on_cancel: Mutex::new(Some(Box::new(hook))),
        }
    }

    /// Stop the subscription. Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        if let Some(hook) = lock(&self.on_cancel).take() {
            hook();
        }
        true
    }

    /// Whether this subscription has stopped, either by `cancel()` or
    /// because its source ended or faulted.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ── Listener ─────────────────────────────────────────────────────────

type Callback<T> = Box<dyn FnMut(T) + Send>;

/// A callback slot tied to a cancellation token.
///
/// The token is checked while holding the slot lock, so once a
/// cancellation is observed the callback is dropped and never runs again.
pub(crate) struct Listener<T> {
    token: CancellationToken,
    callback: Mutex<Option<Callback<T>>>,
}

impl<T> Listener<T> {
    pub(crate) fn new(token: CancellationToken, callback: impl FnMut(T) + Send + 'static) -> Self {
        Self {
            token,
            callback: Mutex::new(Some(Box::new(callback))),
        }
    }

    /// Invoke the callback unless cancelled. Returns `false` once the
    /// listener is dead and should be discarded.
    pub(crate) fn deliver(&self, value: T) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let mut slot = lock(&self.callback);
        if self.token.is_cancelled() {
            slot.take();
            return false;
        }
        match slot.as_mut() {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Callbacks never leave shared state half-written, so a poisoned lock
/// is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let hooks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hooks);
        let sub = Subscription::with_hook(CancellationToken::new(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(sub.cancel());
        assert!(!sub.cancel());
        assert!(sub.is_cancelled());
        drop(sub);
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_cancels_token() {
        let token = CancellationToken::new();
        drop(Subscription::new(token.clone()));
        assert!(token.is_cancelled());
    }

    #[test]
    fn listener_stops_after_cancel() {
        let token = CancellationToken::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let listener = Listener::new(token.clone(), move |n: usize| {
            counter.fetch_add(n, Ordering::SeqCst);
        });

        assert!(listener.deliver(2));
        token.cancel();
        assert!(!listener.deliver(5));
        assert!(listener.is_cancelled());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
