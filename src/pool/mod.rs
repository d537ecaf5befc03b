mod cancel;
mod lease;
mod pool;
mod queue;

pub use cancel::CancelToken;
pub use lease::Lease;
pub use pool::Pool;
