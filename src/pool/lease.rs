use std::fmt::{self, Debug, Formatter};
use std::ops::{Deref, DerefMut};

use super::Pool;

/// An acquired resource that returns itself to its pool when dropped.
///
/// Obtained from [`Pool::lease`], [`Pool::try_lease`] or
/// [`Pool::lease_timeout`]. Dereferences to the borrowed resource; use
/// [`detach`](Lease::detach) to keep the value and take over the
/// obligation to call [`Pool::release`].
pub struct Lease<R: Send + 'static> {
    value: Option<R>,
    pool: Pool<R>,
}

impl<R: Send + 'static> Lease<R> {
    pub(crate) fn new(value: R, pool: Pool<R>) -> Self {
        Self {
            value: Some(value),
            pool,
        }
    }

    /// Take ownership of the resource, waiving the automatic return
    pub fn detach(mut self) -> R {
        self.value.take().unwrap()
    }
}

impl<R: Send + 'static> Deref for Lease<R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().unwrap()
    }
}

impl<R: Send + 'static> DerefMut for Lease<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().unwrap()
    }
}

impl<R: Send + 'static> Drop for Lease<R> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(value);
        }
    }
}

impl<R: Debug + Send + 'static> Debug for Lease<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lease").field(&self.value).finish()
    }
}
