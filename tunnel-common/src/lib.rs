//! Utilities shared by the tunnel server and tunnel client: the
//! bidirectional byte [`exchanger`], the bounded [`worker_pool`] used by
//! the server's heartbeater, and a small [`logging`] setup helper.

pub mod exchanger;
pub mod logging;
pub mod rate_limit;
pub mod worker_pool;

pub use exchanger::{exchange, ExchangeStats};
pub use rate_limit::RateLimiter;
pub use worker_pool::GoWorkerPool;

/// Buffer size used by the exchanger's copy loops.
pub const EXCHANGE_BUFFER_SIZE: usize = 2048;
