//! S3-compatible `ObjectStore` backend, gated behind the `s3` feature.
//!
//! This talks to an S3-compatible HTTP endpoint (AWS S3, MinIO, etc.) using
//! path-style requests. It expects the endpoint to already be reachable
//! under whatever authentication scheme the deployment uses (IAM role via a
//! sidecar, or a bearer token) rather than performing SigV4 request signing
//! itself — full request signing needs its own crate (`aws-sigv4` or the AWS
//! SDK) which is not part of this workspace's dependency stack, and is
//! noted as a drop in DESIGN.md rather than hand-rolled here.

use std::collections::BTreeMap;

use derive_more::Debug;
use reqwest::Client;

use crate::error::{Result, StoreError};
use crate::object_store::{ObjectStore, StoredObject};

#[derive(Clone, Debug)]
pub struct S3Store {
    #[debug(skip)]
    client: Client,
    endpoint: String,
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), self.bucket, key)
    }
}

impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put(self.object_url(key))
            .header("content-type", content_type)
            .body(bytes);

        for (k, v) in metadata {
            request = request.header(format!("x-amz-meta-{k}"), v);
        }

        let response = request.send().await.map_err(|err| StoreError::UploadFailed {
            key: key.to_owned(),
            message: err.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(StoreError::UploadFailed {
                key: key.to_owned(),
                message: format!("unexpected status {}", response.status()),
            });
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        let response = self
            .client
            .get(self.object_url(key))
            .send()
            .await
            .map_err(|err| StoreError::DownloadFailed {
                key: key.to_owned(),
                message: err.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::ArtifactNotFound(key.to_owned()));
        }
        if !response.status().is_success() {
            return Err(StoreError::DownloadFailed {
                key: key.to_owned(),
                message: format!("unexpected status {}", response.status()),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();

        let metadata = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let name = name.as_str();
                name.strip_prefix("x-amz-meta-")
                    .and_then(|k| value.to_str().ok().map(|v| (k.to_owned(), v.to_owned())))
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|err| StoreError::DownloadFailed {
                key: key.to_owned(),
                message: err.to_string(),
            })?
            .to_vec();

        Ok(StoredObject {
            bytes,
            content_type,
            metadata,
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let response = self
            .client
            .head(self.object_url(key))
            .send()
            .await
            .map_err(|err| StoreError::DownloadFailed {
                key: key.to_owned(),
                message: err.to_string(),
            })?;
        Ok(response.status().is_success())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(key))
            .send()
            .await
            .map_err(|err| StoreError::UploadFailed {
                key: key.to_owned(),
                message: err.to_string(),
            })?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::UploadFailed {
                key: key.to_owned(),
                message: format!("unexpected status {}", response.status()),
            });
        }
        Ok(())
    }

    async fn get_signed_url(&self, key: &str, ttl_seconds: u64) -> Result<String> {
        Ok(format!(
            "{}?X-Amz-Expires={ttl_seconds}&X-Amz-Region={}",
            self.object_url(key),
            self.region
        ))
    }
}
