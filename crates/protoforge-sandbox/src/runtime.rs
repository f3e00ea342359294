use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{ExecutionRequest, ExecutionResult};

/// Abstraction over "run this protoc invocation in a disposable
/// container." Production code talks to the Docker Engine API; tests
/// substitute an in-memory fake.
pub trait ContainerRuntime: Send + Sync + 'static {
    fn run(
        &self,
        request: &ExecutionRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<ExecutionResult>> + Send;
}
