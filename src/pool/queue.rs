use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, WaitTimeoutResult};
use std::time::Duration;

type Guard<'a, R> = MutexGuard<'a, QueueInner<R>>;

/// Type-erased wake-up path for cancellation tokens, hiding the resource
/// type behind the trait object.
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

pub(crate) struct QueueInner<R> {
    pub idle: VecDeque<R>,
    pub closed: bool,
}

/// The shared state of a pool: the idle queue and lifecycle flag guarded by
/// one mutex, and the condition variable that waiters park on. The condvar
/// lives in its own `Arc` so it can be reached without naming `R`.
pub(crate) struct Queue<R> {
    capacity: usize,
    cvar: Arc<Condvar>,
    inner: Arc<Mutex<QueueInner<R>>>,
}

impl<R> Clone for Queue<R> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            cvar: self.cvar.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<R> Queue<R> {
    pub fn new(idle: VecDeque<R>) -> Self {
        Self {
            capacity: idle.len(),
            cvar: Arc::new(Condvar::new()),
            inner: Arc::new(Mutex::new(QueueInner {
                idle,
                closed: false,
            })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A poisoned guard is taken as-is: no critical section in this crate can
    // leave the queue in a partially updated state.
    pub fn lock(&self) -> Guard<'_, R> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notify(&self) {
        self.cvar.notify_all()
    }

    pub fn wait<'a>(&'a self, guard: Guard<'a, R>) -> Guard<'a, R> {
        self.cvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wait_timeout<'a>(
        &'a self,
        guard: Guard<'a, R>,
        timeout: Duration,
    ) -> (Guard<'a, R>, WaitTimeoutResult) {
        self.cvar
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Send> Wake for Queue<R> {
    // Passing through the mutex before notifying ensures a waiter that has
    // checked its token but not yet parked cannot miss the wake-up.
    fn wake(&self) {
        drop(self.lock());
        self.notify();
    }
}
