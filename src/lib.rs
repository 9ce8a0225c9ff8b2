//! In-process, per-key token-bucket rate limiting.
//!
//! A [`Bucket`] holds tokens that refill lazily with elapsed time; a [`Pool`] hands
//! out one bucket per key, creating it on first use.
//!
//! ```
//! use ratebucket::{Pool, PoolConfig};
//!
//! let pool: Pool = Pool::with_config(PoolConfig::new(2, 2, 0.0));
//! assert!(pool.allow("10.0.0.1"));
//! assert!(pool.allow("10.0.0.1"));
//! assert!(!pool.allow("10.0.0.1"));
//! assert!(pool.allow("10.0.0.2"));
//! ```

pub mod bucket;
pub mod config;
pub mod errors;
pub mod pool;

pub use bucket::Bucket;
pub use config::{BucketConfig, PoolConfig};
pub use errors::ConfigError;
pub use pool::Pool;
