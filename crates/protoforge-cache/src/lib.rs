pub mod cache;
pub mod error;
pub mod l1;
#[cfg(feature = "redis-backend")]
pub mod l2;
pub mod stats;

pub use cache::{Cache, CacheStore, InMemoryCache};
pub use error::{CacheError, Result};
pub use l1::L1Cache;
#[cfg(feature = "redis-backend")]
pub use l2::L2Cache;
pub use stats::{CacheStats, Tier};
