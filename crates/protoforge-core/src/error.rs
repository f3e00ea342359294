use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("language {0:?} is not registered")]
    LanguageNotSupported(String),

    #[error("language {0:?} already registered")]
    LanguageAlreadyRegistered(String),

    #[error("language spec is invalid: {0}")]
    InvalidLanguageSpec(#[from] protoforge_types::TypesError),

    #[error("request is invalid: {0}")]
    InvalidRequest(protoforge_types::TypesError),

    #[error("job {0} not found")]
    JobNotFound(uuid::Uuid),

    #[error("{failure_count} of {total} languages failed, first error: {first_error}")]
    PartialFailure {
        failure_count: usize,
        total: usize,
        first_error: String,
    },

    #[error("worker pool has been shut down")]
    PoolShutDown,

    #[error(transparent)]
    Sandbox(#[from] protoforge_sandbox::SandboxError),

    #[error(transparent)]
    Store(#[from] protoforge_store::StoreError),

    #[error(transparent)]
    Manifest(#[from] protoforge_manifest::ManifestError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
