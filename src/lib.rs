//! A bounded concurrent resource pool.
//!
//! A [`Pool`] owns a fixed set of interchangeable values that parallel
//! threads borrow and return. Acquisition comes in blocking, timed,
//! non-blocking and cancelable forms; a timed wait that finds nothing is
//! an empty result, never an error.
//!
//! ```
//! use lendpool::Pool;
//!
//! let pool = Pool::new(vec!["a", "b"]);
//! let first = pool.try_acquire().unwrap();
//! assert_eq!(pool.available(), 1);
//! pool.release(first);
//! assert_eq!(pool.available(), 2);
//! ```

#[macro_use]
mod error;
pub use self::error::{Error, ErrorKind, Result};

mod pool;
pub use self::pool::{CancelToken, Lease, Pool};
