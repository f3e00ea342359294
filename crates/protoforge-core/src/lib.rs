pub mod config;
pub mod error;
pub mod jobs;
pub mod orchestrator;
pub mod registry;

pub use config::OrchestratorConfig;
pub use error::{CoreError, Result};
pub use jobs::JobTracker;
pub use orchestrator::Orchestrator;
pub use registry::LanguageRegistry;
