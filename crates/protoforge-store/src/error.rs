use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("checksum mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("failed to decompress archive for {key}: {source}")]
    DecompressionFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to upload {key}: {message}")]
    UploadFailed { key: String, message: String },

    #[error("failed to download {key}: {message}")]
    DownloadFailed { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
