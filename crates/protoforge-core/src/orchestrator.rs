use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use protoforge_cache::CacheStore;
use protoforge_manifest::{Ecosystem, ManifestRequest};
use protoforge_sandbox::{ContainerRuntime, ExecutionRequest, ResourceLimits};
use protoforge_store::{artifact_key, pack, ObjectStore};
use protoforge_types::{CacheKey, CompilationResult, CompileRequest};

use crate::config::OrchestratorConfig;
use crate::error::{CoreError, Result};
use crate::registry::LanguageRegistry;

/// Ties the language registry, sandbox, cache, and artifact store together
/// behind the two public entry points §4.7/§4.8 describe. Generic over its
/// three collaborators (rather than boxed trait objects) because all three
/// traits return `impl Future` from their methods, which is not
/// dyn-compatible — the same reason this codebase injects concrete generic
/// backends rather than `Box<dyn ...>`.
pub struct Orchestrator<R, C, O>
where
    R: ContainerRuntime,
    C: CacheStore,
    O: ObjectStore,
{
    registry: Arc<LanguageRegistry>,
    runtime: Arc<R>,
    cache: Arc<C>,
    store: Option<O>,
    config: OrchestratorConfig,
    shut_down: AtomicBool,
}

impl<R, C, O> Orchestrator<R, C, O>
where
    R: ContainerRuntime,
    C: CacheStore,
    O: ObjectStore,
{
    pub fn new(registry: Arc<LanguageRegistry>, runtime: Arc<R>, cache: Arc<C>, store: Option<O>, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            runtime,
            cache,
            store,
            config,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Cancels in-flight work is the caller's responsibility (via the
    /// `CancellationToken` passed into each call); this only flips the
    /// "accepting new work" switch so every subsequent `compile_single`/
    /// `compile_all` rejects with `PoolShutDown`, per §5's shutdown
    /// semantics. Safe to call more than once.
    pub fn close(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// §4.7: compile one language of one request.
    #[tracing::instrument(skip(self, request), fields(module = %request.module, version = %request.version, language = %language))]
    pub async fn compile_single(&self, request: &CompileRequest, language: &str, cancel: CancellationToken) -> Result<CompilationResult> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(CoreError::PoolShutDown);
        }
        request.validate().map_err(CoreError::InvalidRequest)?;
        let spec = self.registry.get(language)?;
        if !spec.enabled {
            return Err(CoreError::LanguageNotSupported(language.to_owned()));
        }

        let cache_key = CacheKey::from_request(request, &spec.id, &spec.plugin_version).map_err(CoreError::InvalidRequest)?;

        if self.config.enable_cache {
            if let Some(mut cached) = self.cache.get(&cache_key).await {
                cached.cache_hit = true;
                return Ok(cached);
            }
        }

        let started = Instant::now();

        let mut flags = spec.base_flags.clone();
        flags.push(spec.out_flag("/output"));
        if request.include_rpc && spec.supports_rpc {
            flags.extend(spec.rpc_flags.clone());
        }

        let exec_request = ExecutionRequest {
            image: spec.image.clone(),
            image_tag: spec.image_tag.clone(),
            proto_files: request.proto_files.clone(),
            flags,
            env: BTreeMap::new(),
            limits: ResourceLimits {
                timeout: self.config.compilation_timeout,
                ..Default::default()
            },
        };

        let execution = match self.runtime.run(&exec_request, cancel).await {
            Ok(execution) => execution,
            Err(err) => {
                return Ok(CompilationResult::failed(spec.id.clone(), err.to_string()));
            }
        };

        let mut manifest_files = Vec::new();
        let mut warning = None;
        if let Some(package_manager) = &spec.package_manager {
            let manifest_request = ManifestRequest {
                module: request.module.clone(),
                version: request.version.clone(),
                include_rpc: request.include_rpc,
                dependencies: request.dependencies.iter().map(|dep| format!("{}:{}", dep.module, dep.version)).collect(),
            };
            match Ecosystem::from_name(package_manager).and_then(|eco| eco.generate(&manifest_request)) {
                Ok(files) => manifest_files = files,
                Err(err) => warning = Some(format!("package generation warning: {err}")),
            }
        }

        let mut result = CompilationResult {
            language: spec.id.clone(),
            success: true,
            generated_files: execution.files,
            manifest_files,
            duration_ms: started.elapsed().as_millis() as u64,
            cache_hit: false,
            error: warning,
            archive_key: None,
            archive_namespace: None,
            archive_checksum: None,
        };

        if let Some(store) = &self.store {
            let mut archive_inputs = result.generated_files.clone();
            archive_inputs.extend(result.manifest_files.clone());
            match pack(&archive_inputs) {
                Ok(packed) => {
                    let prefix = request.upload_prefix.clone().unwrap_or_default();
                    let key = artifact_key(&prefix, &request.module, &request.version, &spec.id);
                    let mut metadata = BTreeMap::new();
                    metadata.insert("plugin_version".to_owned(), spec.plugin_version.clone());
                    metadata.insert("include_grpc".to_owned(), request.include_rpc.to_string());
                    match store.put(&key, packed.compressed, "application/gzip", metadata).await {
                        Ok(()) => {
                            result.archive_key = Some(key);
                            result.archive_namespace = Some(prefix);
                            result.archive_checksum = Some(packed.checksum);
                        }
                        Err(err) => warn!("artifact upload failed, continuing without archive: {err}"),
                    }
                }
                Err(err) => warn!("archive packaging failed, continuing without archive: {err}"),
            }
        }

        if self.config.enable_cache {
            self.cache.set(&cache_key, result.clone()).await;
        }

        Ok(result)
    }

    /// §4.8: fan out across languages with a bounded worker pool, preserving
    /// request order in the returned slice.
    #[tracing::instrument(skip(self, request, languages), fields(module = %request.module, version = %request.version, count = languages.len()))]
    pub async fn compile_all(&self, request: &CompileRequest, languages: &[String], cancel: CancellationToken) -> Result<Vec<CompilationResult>> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(CoreError::PoolShutDown);
        }
        if languages.is_empty() {
            return Err(CoreError::InvalidRequest(protoforge_types::TypesError::EmptyField { field: "languages" }));
        }
        for language in languages {
            let spec = self.registry.get(language)?;
            if !spec.enabled {
                return Err(CoreError::LanguageNotSupported(language.clone()));
            }
        }

        let worker_count = self.config.worker_count(languages.len());
        let work_queue = std::sync::Mutex::new(languages.iter().cloned().enumerate().collect::<Vec<_>>().into_iter());

        // Workers are plain futures joined within this call's own stack
        // frame (never `tokio::spawn`ed), so borrowing `self`/`request`
        // across their await points needs no `'static` bound and no
        // unsafe code.
        let worker = |_worker_id: usize| async {
            let mut completed = Vec::new();
            loop {
                let next = work_queue.lock().expect("work queue lock poisoned").next();
                let Some((index, language)) = next else { break };
                let outcome = self
                    .compile_single(request, &language, cancel.clone())
                    .await
                    .map_err(|err| err.to_string());
                completed.push((index, outcome));
            }
            completed
        };

        let batches = futures::future::join_all((0..worker_count).map(worker)).await;

        let mut results: Vec<Option<CompilationResult>> = (0..languages.len()).map(|_| None).collect();
        let mut first_error = None;
        let mut failure_count = 0usize;
        for (index, outcome) in batches.into_iter().flatten() {
            match outcome {
                Ok(result) => {
                    if !result.success {
                        failure_count += 1;
                        if first_error.is_none() {
                            first_error = Some(result.error.clone().unwrap_or_else(|| format!("{} compilation failed", result.language)));
                        }
                    }
                    results[index] = Some(result);
                }
                Err(message) => {
                    failure_count += 1;
                    if first_error.is_none() {
                        first_error = Some(message.clone());
                    }
                    results[index] = Some(CompilationResult::failed(languages[index].clone(), message));
                }
            }
        }

        let results: Vec<CompilationResult> = results.into_iter().map(|r| r.expect("every index received a result")).collect();
        info!(succeeded = results.iter().filter(|r| r.success).count(), failed = failure_count, "compile_all finished");

        if let Some(first_error) = first_error {
            return Err(CoreError::PartialFailure {
                failure_count,
                total: languages.len(),
                first_error,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoforge_cache::InMemoryCache;
    use protoforge_sandbox::MockRuntime;
    use protoforge_store::disk::Disk;
    use protoforge_types::{GeneratedFile, ProtoFile};

    fn request() -> CompileRequest {
        CompileRequest {
            module: "user".to_owned(),
            version: "1.0.0".to_owned(),
            proto_files: vec![ProtoFile::new("user.proto", "syntax = \"proto3\";")],
            dependencies: vec![],
            include_rpc: false,
            options: BTreeMap::new(),
            upload_prefix: None,
        }
    }

    fn orchestrator(runtime: MockRuntime) -> Orchestrator<MockRuntime, InMemoryCache, Disk> {
        Orchestrator::new(
            Arc::new(LanguageRegistry::with_defaults()),
            Arc::new(runtime),
            Arc::new(InMemoryCache::new()),
            None,
            OrchestratorConfig::default(),
        )
    }

    #[test_log::test(tokio::test)]
    async fn compile_single_rejects_unknown_language() {
        let orch = orchestrator(MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]));
        let err = orch.compile_single(&request(), "rustic", CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::LanguageNotSupported(_)));
    }

    #[test_log::test(tokio::test)]
    async fn compile_single_succeeds_and_then_cache_hits() {
        let orch = orchestrator(MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]));
        let req = request();

        let first = orch.compile_single(&req, "go", CancellationToken::new()).await.unwrap();
        assert!(first.success);
        assert!(!first.cache_hit);

        let second = orch.compile_single(&req, "go", CancellationToken::new()).await.unwrap();
        assert!(second.cache_hit);
    }

    #[test_log::test(tokio::test)]
    async fn compile_all_preserves_order() {
        let orch = orchestrator(MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]));
        let languages = vec!["go".to_owned(), "python".to_owned(), "java".to_owned()];
        let results = orch.compile_all(&request(), &languages, CancellationToken::new()).await.unwrap();
        assert_eq!(results.len(), 3);
        for (result, language) in results.iter().zip(languages.iter()) {
            assert_eq!(&result.language, language);
        }
    }

    #[test_log::test(tokio::test)]
    async fn compile_all_rejects_unknown_language_up_front() {
        let orch = orchestrator(MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]));
        let languages = vec!["go".to_owned(), "rustic".to_owned()];
        let err = orch.compile_all(&request(), &languages, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::LanguageNotSupported(_)));
    }

    #[test_log::test(tokio::test)]
    async fn compile_all_surfaces_a_per_language_executor_failure() {
        let runtime = MockRuntime::with_fixture(Arc::new(|request: &protoforge_sandbox::ExecutionRequest| {
            if request.image.ends_with("python") {
                Err(protoforge_sandbox::SandboxError::NoGeneratedFiles)
            } else {
                Ok(vec![GeneratedFile::new("a.go", "package a")])
            }
        }));
        let orch = orchestrator(runtime);
        let languages = vec!["go".to_owned(), "python".to_owned()];
        let err = orch.compile_all(&request(), &languages, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::PartialFailure { failure_count: 1, total: 2, .. }));
    }

    #[test_log::test(tokio::test)]
    async fn closed_orchestrator_rejects_further_work() {
        let orch = orchestrator(MockRuntime::always_succeeds(vec![GeneratedFile::new("a.go", "package a")]));
        orch.close().unwrap();
        let err = orch.compile_single(&request(), "go", CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::PoolShutDown));
    }
}
