//! In-memory `ContainerRuntime` double: no Docker, no filesystem, no
//! subprocess. Lets the orchestrator's own tests exercise cache/store/
//! registry wiring without a daemon available.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use protoforge_types::GeneratedFile;

use crate::error::{Result, SandboxError};
use crate::model::{ExecutionRequest, ExecutionResult};
use crate::runtime::ContainerRuntime;

pub type FixtureFn = std::sync::Arc<dyn Fn(&ExecutionRequest) -> Result<Vec<GeneratedFile>> + Send + Sync>;

/// Returns one fixed set of generated files for every call, or a
/// configured error.
pub struct MockRuntime {
    fixture: FixtureFn,
}

impl MockRuntime {
    pub fn always_succeeds(files: Vec<GeneratedFile>) -> Self {
        Self {
            fixture: std::sync::Arc::new(move |_| Ok(files.clone())),
        }
    }

    pub fn always_fails(error: impl Fn() -> SandboxError + Send + Sync + 'static) -> Self {
        Self {
            fixture: std::sync::Arc::new(move |_| Err(error())),
        }
    }

    pub fn with_fixture(fixture: FixtureFn) -> Self {
        Self { fixture }
    }
}

impl ContainerRuntime for MockRuntime {
    async fn run(&self, request: &ExecutionRequest, cancel: CancellationToken) -> Result<ExecutionResult> {
        if cancel.is_cancelled() {
            return Err(SandboxError::Timeout);
        }
        match (self.fixture)(request) {
            Ok(files) if files.is_empty() => Err(SandboxError::NoGeneratedFiles),
            Ok(files) => Ok(ExecutionResult::success(0, String::new(), String::new(), files, Duration::ZERO)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request() -> ExecutionRequest {
        ExecutionRequest {
            image: "protoforge/go".to_owned(),
            image_tag: "latest".to_owned(),
            proto_files: vec![],
            flags: vec!["--go_out=/output".to_owned()],
            env: BTreeMap::new(),
            limits: Default::default(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn always_succeeds_returns_configured_files() {
        let runtime = MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]);
        let result = runtime.run(&request(), CancellationToken::new()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.files.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn empty_fixture_fails_with_no_generated_files() {
        let runtime = MockRuntime::always_succeeds(vec![]);
        let err = runtime.run(&request(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SandboxError::NoGeneratedFiles));
    }

    #[test_log::test(tokio::test)]
    async fn cancelled_token_short_circuits() {
        let runtime = MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = runtime.run(&request(), cancel).await.unwrap_err();
        assert!(matches!(err, SandboxError::Timeout));
    }
}
