//! Artifact packaging and durable storage.
//!
//! [`packager`] turns a generated-file list into a deterministic tar+gzip
//! archive with a SHA-256 checksum; [`ObjectStore`] persists the result
//! under a canonical key. [`disk::Disk`] is the local-development backend,
//! adapted from this codebase's content-addressed disk storage; the `s3`
//! feature adds an S3-compatible HTTP backend for production.

pub mod disk;
pub mod error;
pub mod object_store;
pub mod packager;
#[cfg(feature = "s3")]
pub mod s3;

pub use error::{Result, StoreError};
pub use object_store::{artifact_key, ObjectStore, StoredObject};
pub use packager::{pack, unpack, PackedArchive};
