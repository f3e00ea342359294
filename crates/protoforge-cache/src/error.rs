use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Informational only; callers should treat this the same as a normal
    /// miss, never surface it as a hard failure.
    #[error("cache miss")]
    CacheMiss,

    #[error("cache tier unavailable: {0}")]
    CacheUnavailable(String),

    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("L2 cache requires an address but none was configured")]
    L2AddressMissing,

    #[error("L2 connection failed: {0}")]
    L2ConnectionFailed(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
