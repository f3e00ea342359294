use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;

/// An object already present in the store, returned by [`ObjectStore::get`].
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// Abstraction over a content-addressed-by-key object store. Mirrors the
/// shape of this codebase's cache-backend trait: plain async methods
/// returning `impl Future`, no `async_trait` macro needed.
pub trait ObjectStore: Clone + Send + Sync + 'static {
    fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// A retrieval handle valid for `ttl_seconds`. Implementations that
    /// cannot produce a real signed URL (e.g. the local disk backend used in
    /// development) return a `file://`-style handle instead.
    fn get_signed_url(&self, key: &str, ttl_seconds: u64) -> impl Future<Output = Result<String>> + Send;
}

/// Builds the canonical artifact key for a compiled language output.
pub fn artifact_key(prefix: &str, module: &str, version: &str, language: &str) -> String {
    if prefix.is_empty() {
        format!("{module}/{version}/{language}.tar.gz")
    } else {
        format!("{prefix}/{module}/{version}/{language}.tar.gz")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_key_without_prefix() {
        assert_eq!(artifact_key("", "user", "1.0.0", "go"), "user/1.0.0/go.tar.gz");
    }

    #[test]
    fn artifact_key_with_prefix() {
        assert_eq!(
            artifact_key("artifacts", "user", "1.0.0", "go"),
            "artifacts/user/1.0.0/go.tar.gz"
        );
    }
}
