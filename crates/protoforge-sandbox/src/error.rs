use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("failed to pull image {image}: {source}")]
    ImagePullFailed {
        image: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("docker engine unavailable: {0}")]
    DockerNotAvailable(String),

    #[error("failed to create container: {0}")]
    ContainerCreateFailed(String),

    #[error("container exited with code {exit_code}: {stderr}")]
    ContainerFailed { exit_code: i64, stderr: String },

    #[error("container produced no output files")]
    NoGeneratedFiles,

    #[error("execution exceeded its timeout")]
    Timeout,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
