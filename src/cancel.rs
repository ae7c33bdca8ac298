//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a one-shot broadcast flag shared between the caller of
//! an aggregation and the producers it launches. Cancellation is cooperative:
//! raising the flag never preempts a running producer; producers are expected
//! to check [`is_cancelled`](CancelToken::is_cancelled) between units of work
//! (or block on [`wait_timeout`](CancelToken::wait_timeout)) and abort
//! promptly once it returns `true`.
//!
//! Tokens form a tree: [`child`](CancelToken::child) derives a token that is
//! cancelled whenever its parent is, while cancelling the child leaves the
//! parent untouched. This lets an aggregator abort the producers it spawned
//! without disturbing the caller's own token.

use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
    // weak: a registration must not keep a dropped child alive; dead
    // entries are pruned on each new registration
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn cancel(&self) {
        {
            let mut cancelled = self.cancelled.lock();
            if *cancelled {
                return;
            }
            *cancelled = true;
            self.condvar.notify_all();
        }
        // a cancelled token never un-cancels; registrations are spent
        for child in self.children.lock().drain(..) {
            if let Some(child) = child.upgrade() {
                child.cancel();
            }
        }
    }
}

/// A shared, idempotent one-shot cancellation signal.
///
/// Clones share the same flag; once any clone calls [`cancel`](Self::cancel),
/// every clone (and every derived child) observes the cancellation.
///
/// # Examples
///
/// ```
/// use manifold::cancel::CancelToken;
///
/// let token = CancelToken::new();
/// let child = token.child();
/// assert!(!child.is_cancelled());
/// token.cancel();
/// assert!(child.is_cancelled());
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a new token in the uncancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the cancellation flag and wakes all threads blocked in
    /// [`wait_timeout`](Self::wait_timeout), on this token or any token
    /// derived from it. Calling `cancel` more than once has no further
    /// effect.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` if this token, or any ancestor it was derived from,
    /// has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Derives a token that is cancelled whenever `self` is cancelled, but
    /// may also be cancelled independently without affecting `self`.
    ///
    /// If `self` is already cancelled, the returned token starts out
    /// cancelled.
    pub fn child(&self) -> CancelToken {
        let child = Arc::new(Inner::default());
        // the flag lock is held across registration: a concurrent cancel()
        // must either see the new child or be observed here
        let cancelled = self.inner.cancelled.lock();
        if *cancelled {
            *child.cancelled.lock() = true;
        } else {
            let mut children = self.inner.children.lock();
            children.retain(|registered| registered.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        drop(cancelled);
        CancelToken { inner: child }
    }

    /// Blocks the current thread until this token is cancelled or `timeout`
    /// elapses, whichever comes first. Returns `true` if the token was
    /// cancelled.
    ///
    /// This is how a producer sleeps while remaining responsive to
    /// cancellation: instead of `thread::sleep`, wait on its token and abort
    /// if the wait reports cancellation.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            if self
                .inner
                .condvar
                .wait_until(&mut cancelled, deadline)
                .timed_out()
            {
                break;
            }
        }
        *cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_new_token_is_not_cancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_propagates_to_descendants() {
        let token = CancelToken::new();
        let child = token.child();
        let grandchild = child.child();
        token.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn test_cancelling_child_leaves_parent_running() {
        let token = CancelToken::new();
        let child = token.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_child_of_cancelled_token_starts_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.child().is_cancelled());
    }

    #[test]
    fn test_dropped_children_are_not_retained() {
        let token = CancelToken::new();
        for _ in 0..100 {
            drop(token.child());
        }
        // each registration prunes dead entries, so a long-lived token does
        // not accumulate registrations across derive-and-drop cycles
        assert!(token.inner.children.lock().len() <= 1);
        let live = token.child();
        assert!(token.inner.children.lock().len() <= 1);
        token.cancel();
        assert!(live.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            thread::spawn(move || token.wait_timeout(Duration::from_secs(60)))
        };
        thread::sleep(Duration::from_millis(10));
        token.cancel();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wait_timeout_wakes_child_on_parent_cancel() {
        let token = CancelToken::new();
        let child = token.child();
        let waiter = thread::spawn(move || child.wait_timeout(Duration::from_secs(60)));
        thread::sleep(Duration::from_millis(10));
        token.cancel();
        assert!(waiter.join().unwrap());
    }
}
