use std::collections::BTreeMap;
use std::time::Duration;

use protoforge_types::{GeneratedFile, ProtoFile};

/// Resource limits applied to a single container run. Defaults match
/// the floor this codebase enforces when a caller leaves them unset.
#[derive(Clone, Debug)]
pub struct ResourceLimits {
    pub cpu_cores: f64,
    pub memory_bytes: i64,
    pub timeout: Duration,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_cores: 1.0,
            memory_bytes: 512 * 1024 * 1024,
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Everything the runtime needs to run one `protoc` invocation in a
/// disposable container. `flags` is already fully assembled by the caller
/// (the orchestrator, from the language spec) — the sandbox only owns the
/// container lifecycle and `--proto_path`/input-file wiring.
#[derive(Clone, Debug)]
pub struct ExecutionRequest {
    pub image: String,
    pub image_tag: String,
    pub proto_files: Vec<ProtoFile>,
    pub flags: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub limits: ResourceLimits,
}

impl ExecutionRequest {
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.image_tag)
    }
}

#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub files: Vec<GeneratedFile>,
    pub duration: Duration,
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn success(exit_code: i64, stdout: String, stderr: String, files: Vec<GeneratedFile>, duration: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            files,
            duration,
            success: true,
            error: None,
        }
    }

    pub fn failure(exit_code: i64, stdout: String, stderr: String, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            files: Vec::new(),
            duration,
            success: false,
            error: Some(error.into()),
        }
    }
}
