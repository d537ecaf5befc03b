use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::trace;

use super::queue::Wake;

/// A cancellation handle for waiting acquires.
///
/// Tokens are minted by [`Pool::cancel_token`](super::Pool::cancel_token)
/// and passed to the `_cancelable` acquire variants. Calling [`cancel`]
/// from any thread aborts those waits with
/// [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled) without removing
/// a resource from the pool. A token stays cancelled once triggered; mint
/// a fresh one for each wait that must be cancellable on its own.
///
/// [`cancel`]: CancelToken::cancel
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    waiters: Arc<dyn Wake>,
}

impl CancelToken {
    pub(crate) fn new(waiters: Arc<dyn Wake>) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            waiters,
        }
    }

    /// Flag the token as cancelled and wake the pool's waiters.
    ///
    /// Idempotent; only the first call performs the wake-up.
    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            trace!("cancel: waking pool waiters");
            self.waiters.wake();
        }
    }

    /// Check whether the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Debug for CancelToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
