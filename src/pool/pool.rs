use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace};

use super::cancel::CancelToken;
use super::lease::Lease;
use super::queue::{Queue, QueueInner, Wake};
use crate::error::Result;

/// A bounded pool of interchangeable resources.
///
/// The pool is created over a fixed set of values and never creates or
/// destroys resources itself: callers borrow one of the initial values
/// with an acquire call and hand it back with [`release`](Pool::release).
/// When no resource is available, the blocking acquire variants park the
/// calling thread until another thread releases one.
///
/// Handles are cheap to clone; all clones operate on the same shared
/// state and any clone may be moved to another thread.
///
/// No fairness is guaranteed among blocked acquirers: when a resource is
/// released, any waiter may be the one to obtain it.
pub struct Pool<R> {
    queue: Queue<R>,
}

impl<R> Clone for Pool<R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<R: Send + 'static> Pool<R> {
    /// Create a pool over the given resources.
    ///
    /// The input is consumed; the pool capacity is fixed to the number of
    /// items supplied. Duplicate values are kept as distinct entries.
    pub fn new<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        let idle = resources.into_iter().collect::<VecDeque<_>>();
        debug!("pool created with capacity {}", idle.len());
        Self {
            queue: Queue::new(idle),
        }
    }

    /// The fixed number of resources managed by the pool
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Snapshot of the number of resources currently available
    pub fn available(&self) -> usize {
        self.queue.lock().idle.len()
    }

    /// Snapshot of the number of resources currently on loan.
    ///
    /// Saturates at zero if misuse of [`release`](Pool::release) has
    /// pushed the available count above the capacity.
    pub fn on_loan(&self) -> usize {
        self.capacity().saturating_sub(self.available())
    }

    /// Remove and return an available resource without waiting.
    ///
    /// Returns `None` immediately when the pool is empty or closed.
    pub fn try_acquire(&self) -> Option<R> {
        self.queue.lock().idle.pop_front()
    }

    /// Remove and return a resource, waiting indefinitely for one to
    /// become available.
    ///
    /// Fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed) if the
    /// pool is closed before a resource is obtained.
    pub fn acquire(&self) -> Result<R> {
        self.blocking_acquire(None)
    }

    /// As [`acquire`](Pool::acquire), aborting with
    /// [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled) once `cancel`
    /// is triggered.
    ///
    /// A token cancelled before the call fails immediately. An aborted
    /// wait never removes a resource from the pool.
    pub fn acquire_cancelable(&self, cancel: &CancelToken) -> Result<R> {
        self.blocking_acquire(Some(cancel))
    }

    /// Remove and return a resource, waiting up to `timeout` for one to
    /// become available.
    ///
    /// Returns `Ok(None)` once the timeout elapses with nothing to hand
    /// out; a timeout is an expected outcome, not an error. A zero (or
    /// already elapsed) timeout still performs one availability check.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Option<R>> {
        self.timed_acquire(timeout, None)
    }

    /// As [`acquire_timeout`](Pool::acquire_timeout), aborting with
    /// [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled) once `cancel`
    /// is triggered.
    pub fn acquire_timeout_cancelable(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Option<R>> {
        self.timed_acquire(timeout, Some(cancel))
    }

    /// Return a previously acquired resource to the pool, waking waiters.
    ///
    /// The pool performs no validation of the value: releasing a value
    /// that was not acquired from this pool, or releasing the same value
    /// twice, re-inserts it and can push [`available`](Pool::available)
    /// above [`capacity`](Pool::capacity). This keeps release O(1) and
    /// avoids per-resource tracking; pairing each release with exactly
    /// one successful acquire is the caller's responsibility.
    ///
    /// Values released after [`close`](Pool::close) are dropped.
    pub fn release(&self, resource: R) {
        let mut queue = self.queue.lock();
        if queue.closed {
            drop(queue);
            debug!("release: pool closed, dropping resource");
            drop(resource);
            return;
        }
        queue.idle.push_back(resource);
        trace!("release: {} now available", queue.idle.len());
        drop(queue);
        self.queue.notify();
    }

    /// Close the pool, dropping all idle resources.
    ///
    /// Blocked acquires fail with
    /// [`ErrorKind::Closed`](crate::ErrorKind::Closed), as do subsequent
    /// blocking acquires. Resources still on loan are dropped as they are
    /// released. Closing an already closed pool has no effect.
    pub fn close(&self) {
        let mut queue = self.queue.lock();
        if queue.closed {
            return;
        }
        queue.closed = true;
        let drained = queue.idle.drain(..).collect::<Vec<_>>();
        drop(queue);
        debug!("close: dropped {} idle resources", drained.len());
        drop(drained);
        self.queue.notify();
    }

    /// Mint a cancellation token tied to this pool's wait queue.
    ///
    /// The token can be cloned and sent to other threads; see
    /// [`CancelToken`].
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::new(Arc::new(self.queue.clone()) as Arc<dyn Wake>)
    }

    /// Acquire a resource wrapped in a [`Lease`] that releases it on drop
    pub fn lease(&self) -> Result<Lease<R>> {
        Ok(Lease::new(self.acquire()?, self.clone()))
    }

    /// Non-blocking variant of [`lease`](Pool::lease)
    pub fn try_lease(&self) -> Option<Lease<R>> {
        self.try_acquire()
            .map(|value| Lease::new(value, self.clone()))
    }

    /// Timed variant of [`lease`](Pool::lease)
    pub fn lease_timeout(&self, timeout: Duration) -> Result<Option<Lease<R>>> {
        Ok(self
            .acquire_timeout(timeout)?
            .map(|value| Lease::new(value, self.clone())))
    }

    fn blocking_acquire(&self, cancel: Option<&CancelToken>) -> Result<R> {
        let mut queue = self.queue.lock();
        loop {
            check_interrupt(&queue, cancel)?;
            if let Some(resource) = queue.idle.pop_front() {
                return Ok(resource);
            }
            trace!("acquire: pool empty, waiting");
            queue = self.queue.wait(queue);
        }
    }

    fn timed_acquire(&self, timeout: Duration, cancel: Option<&CancelToken>) -> Result<Option<R>> {
        // on overflow the deadline is unrepresentable; wait unbounded
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.queue.lock();
        loop {
            check_interrupt(&queue, cancel)?;
            if let Some(resource) = queue.idle.pop_front() {
                return Ok(Some(resource));
            }
            let now = Instant::now();
            match deadline {
                Some(deadline) if deadline <= now => {
                    trace!("acquire: timed out");
                    return Ok(None);
                }
                Some(deadline) => {
                    let (guard, _) = self.queue.wait_timeout(queue, deadline - now);
                    queue = guard;
                }
                None => {
                    queue = self.queue.wait(queue);
                }
            }
        }
    }
}

impl<R: Send + 'static> Debug for Pool<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

fn check_interrupt<R>(queue: &QueueInner<R>, cancel: Option<&CancelToken>) -> Result<()> {
    if let Some(cancel) = cancel {
        if cancel.is_cancelled() {
            trace!("acquire: wait cancelled");
            return Err(err_msg!(Cancelled));
        }
    }
    if queue.closed {
        return Err(err_msg!(Closed, "resource pool is closed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn new_pool_reports_counts() {
        let pool = Pool::new(vec![1, 2, 3]);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.on_loan(), 0);
    }

    #[test]
    fn try_acquire_covers_all_resources_then_empties() {
        let pool = Pool::new(vec![10, 20, 30]);
        let mut seen = BTreeSet::new();
        for _ in 0..3 {
            seen.insert(pool.try_acquire().unwrap());
        }
        assert_eq!(seen, vec![10, 20, 30].into_iter().collect::<BTreeSet<_>>());
        assert_eq!(pool.try_acquire(), None);
        assert_eq!(pool.on_loan(), 3);
    }

    #[test]
    fn release_restores_acquired_resource() {
        let pool = Pool::new(vec![7]);
        let res = pool.acquire().unwrap();
        assert_eq!(pool.available(), 0);
        pool.release(res);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.acquire().unwrap(), 7);
    }

    #[test]
    fn zero_timeout_still_checks_availability() {
        let pool = Pool::new(vec![1]);
        assert_eq!(pool.acquire_timeout(Duration::from_millis(0)).unwrap(), Some(1));
        assert_eq!(pool.acquire_timeout(Duration::from_millis(0)).unwrap(), None);
    }

    #[test]
    fn precancelled_token_aborts_immediately() {
        let pool = Pool::new(vec![1]);
        let cancel = pool.cancel_token();
        cancel.cancel();
        let err = pool.acquire_cancelable(&cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        // the aborted call consumed nothing
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let pool = Pool::new(vec![1]);
        let cancel = pool.cancel_token();
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn close_drains_and_rejects_acquires() {
        let pool = Pool::new(vec![1, 2]);
        pool.close();
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.try_acquire(), None);
        let err = pool.acquire().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        let err = pool.acquire_timeout(Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        // releasing into a closed pool drops the value
        pool.release(3);
        assert_eq!(pool.available(), 0);
        // close is idempotent
        pool.close();
    }

    #[test]
    fn unguarded_release_can_exceed_capacity() {
        let pool = Pool::new(vec![1]);
        pool.release(9);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.on_loan(), 0);
    }

    #[test]
    fn lease_returns_value_on_drop() {
        let pool = Pool::new(vec![5]);
        {
            let lease = pool.try_lease().unwrap();
            assert_eq!(*lease, 5);
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn detached_lease_waives_return() {
        let pool = Pool::new(vec![5]);
        let value = pool.lease().unwrap().detach();
        assert_eq!(value, 5);
        assert_eq!(pool.available(), 0);
        pool.release(value);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn duplicate_resources_are_kept() {
        let pool = Pool::new(vec![1, 1]);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.try_acquire(), Some(1));
        assert_eq!(pool.try_acquire(), Some(1));
        assert_eq!(pool.try_acquire(), None);
    }
}
