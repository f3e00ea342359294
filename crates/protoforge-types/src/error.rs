use thiserror::Error;

/// Core error type shared by the compilation pipeline's data model.
///
/// Every other crate in this workspace defines its own `thiserror` enum for
/// its own failure modes and wraps this one via `#[from]`/`#[source]` where a
/// validation failure can bubble up through it.
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("duplicate proto file path: {0}")]
    DuplicateProtoPath(String),

    #[error("invalid proto file path: {0}")]
    InvalidProtoPath(String),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("language is disabled: {0}")]
    LanguageDisabled(String),
}

pub type Result<T> = std::result::Result<T, TypesError>;
