use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use derive_more::Debug;
use tokio::fs::{create_dir_all, metadata, remove_file, rename, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::object_store::{ObjectStore, StoredObject};

/// Local-disk object store for development and tests.
///
/// Keys are opaque slash-separated strings (e.g.
/// `artifacts/user/1.0.0/go.tar.gz`); they map directly onto a path under
/// `root`, same write-to-temp-then-atomic-rename discipline this
/// codebase's content-addressed disk storage uses, minus the hash-prefix
/// sharding since these keys are not themselves content hashes.
#[derive(Clone, Eq, PartialEq, Debug)]
#[debug("Disk(root = {})", self.root.display())]
pub struct Disk {
    root: PathBuf,
}

impl Disk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[cfg(test)]
    pub fn new_temp() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        (Self::new(dir.path()), dir)
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        let mut path = self.object_path(key);
        path.set_extension("meta.json");
        path
    }
}

impl ObjectStore for Disk {
    #[tracing::instrument(name = "Disk::put", skip(self, bytes, metadata), fields(key))]
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }

        let temp = temp_path(&path);
        let mut file = File::create(&temp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        match rename(&temp, &path).await {
            Ok(()) => {}
            Err(err) => {
                if let Err(remove_err) = remove_file(&temp).await {
                    warn!("failed to remove temp file {temp:?}: {remove_err}");
                }
                return Err(StoreError::UploadFailed {
                    key: key.to_owned(),
                    message: err.to_string(),
                });
            }
        }

        let mut meta_doc = metadata;
        meta_doc.insert("content_type".to_owned(), content_type.to_owned());
        let meta_json = serde_meta(&meta_doc);
        tokio::fs::write(self.metadata_path(key), meta_json).await?;

        Ok(())
    }

    #[tracing::instrument(name = "Disk::get", skip(self), fields(key))]
    async fn get(&self, key: &str) -> Result<StoredObject> {
        let path = self.object_path(key);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ArtifactNotFound(key.to_owned()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;

        let mut metadata = deserialize_meta(&tokio::fs::read(self.metadata_path(key)).await.unwrap_or_default());
        let content_type = metadata
            .remove("content_type")
            .unwrap_or_else(|| "application/octet-stream".to_owned());

        Ok(StoredObject {
            bytes,
            content_type,
            metadata,
        })
    }

    #[tracing::instrument(name = "Disk::exists", skip(self), fields(key))]
    async fn exists(&self, key: &str) -> Result<bool> {
        match metadata(self.object_path(key)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(name = "Disk::delete", skip(self), fields(key))]
    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key);
        match remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        let _ = remove_file(self.metadata_path(key)).await;
        Ok(())
    }

    async fn get_signed_url(&self, key: &str, _ttl_seconds: u64) -> Result<String> {
        if !self.exists(key).await? {
            return Err(StoreError::ArtifactNotFound(key.to_owned()));
        }
        Ok(format!("file://{}", self.object_path(key).display()))
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut temp = target.as_os_str().to_owned();
    temp.push(".tmp.");
    temp.push(Uuid::new_v4().to_string());
    PathBuf::from(temp)
}

/// Minimal, dependency-free key=value\n metadata sidecar; avoids pulling in
/// `serde_json` just for a handful of string pairs.
fn serde_meta(meta: &BTreeMap<String, String>) -> String {
    meta.iter()
        .map(|(k, v)| format!("{k}={v}\n"))
        .collect()
}

fn deserialize_meta(raw: &[u8]) -> BTreeMap<String, String> {
    let text = String::from_utf8_lossy(raw);
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn put_get_roundtrip() {
        let (store, _temp) = Disk::new_temp();
        let key = "artifacts/user/1.0.0/go.tar.gz";
        let mut meta = BTreeMap::new();
        meta.insert("plugin_version".to_owned(), "v1".to_owned());

        store
            .put(key, b"hello".to_vec(), "application/gzip", meta.clone())
            .await
            .unwrap();

        assert!(store.exists(key).await.unwrap());
        let object = store.get(key).await.unwrap();
        assert_eq!(object.bytes, b"hello");
        assert_eq!(object.content_type, "application/gzip");
        assert_eq!(object.metadata.get("plugin_version"), Some(&"v1".to_owned()));
    }

    #[test_log::test(tokio::test)]
    async fn get_missing_key_fails() {
        let (store, _temp) = Disk::new_temp();
        let err = store.get("missing.tar.gz").await.unwrap_err();
        assert!(matches!(err, StoreError::ArtifactNotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn delete_is_idempotent() {
        let (store, _temp) = Disk::new_temp();
        let key = "a.tar.gz";
        store
            .put(key, b"data".to_vec(), "application/gzip", BTreeMap::new())
            .await
            .unwrap();
        store.delete(key).await.unwrap();
        store.delete(key).await.unwrap();
        assert!(!store.exists(key).await.unwrap());
    }
}
