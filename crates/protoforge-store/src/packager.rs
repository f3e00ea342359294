//! Deterministic POSIX tar + gzip archive packaging.
//!
//! Given an identical, identically-ordered file list, [`pack`] produces
//! byte-identical output: tar header mtimes are zeroed and mode is fixed at
//! 0644 for every entry. This is CPU-bound and is expected to be run on a
//! blocking-task pool by callers, not inline on an async runtime worker.

use std::io::{Cursor, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

use protoforge_types::GeneratedFile;

use crate::error::{Result, StoreError};

/// A packaged archive: the compressed bytes, their SHA-256 checksum (hex),
/// and the sum of the uncompressed entry sizes.
pub struct PackedArchive {
    pub compressed: Vec<u8>,
    pub checksum: String,
    pub uncompressed_size: u64,
}

pub fn pack(files: &[GeneratedFile]) -> Result<PackedArchive> {
    let mut uncompressed_size = 0u64;
    let gz_buf = Vec::new();
    let encoder = GzEncoder::new(gz_buf, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for file in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(&file.path)?;
        header.set_size(file.content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder.append(&header, Cursor::new(&file.content))?;
        uncompressed_size += file.content.len() as u64;
    }

    let encoder = builder.into_inner()?;
    let compressed = encoder.finish()?;

    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hex::encode(hasher.finalize());

    Ok(PackedArchive {
        compressed,
        checksum,
        uncompressed_size,
    })
}

/// Reverses [`pack`]: gunzip, then untar, reconstructing the original
/// ordered file list. `expected_checksum` is validated against the
/// compressed bytes before decompression when provided.
pub fn unpack(key: &str, compressed: &[u8], expected_checksum: Option<&str>) -> Result<Vec<GeneratedFile>> {
    if let Some(expected) = expected_checksum {
        let mut hasher = Sha256::new();
        hasher.update(compressed);
        let actual = hex::encode(hasher.finalize());
        if actual != expected {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_owned(),
                expected: expected.to_owned(),
                actual,
            });
        }
    }

    let decoder = GzDecoder::new(compressed);
    let mut archive = tar::Archive::new(decoder);

    let mut files = Vec::new();
    let entries = archive.entries().map_err(|source| StoreError::DecompressionFailed {
        key: key.to_owned(),
        source,
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|source| StoreError::DecompressionFailed {
            key: key.to_owned(),
            source,
        })?;
        let path = entry.path()?.to_string_lossy().into_owned();
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        files.push(GeneratedFile::new(path, content));
    }

    Ok(files)
}
