use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("unknown package-manager ecosystem: {0}")]
    UnknownEcosystem(String),

    #[error("missing required field {field} for {ecosystem} manifest")]
    MissingRequiredField {
        ecosystem: &'static str,
        field: &'static str,
    },

    #[error("failed to execute {template} template for {ecosystem}: {source}")]
    TemplateExecutionFailed {
        ecosystem: &'static str,
        template: &'static str,
        #[source]
        source: std::fmt::Error,
    },
}

pub type Result<T> = std::result::Result<T, ManifestError>;
