use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::{Result, eyre::Context};
use derive_more::Debug;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protoforge_cache::Cache;
use protoforge_core::{LanguageRegistry, Orchestrator, OrchestratorConfig};
use protoforge_sandbox::MockRuntime;
use protoforge_store::disk::Disk;
use protoforge_types::{CompileRequest, GeneratedFile, ProtoFile};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compile a proto module for one or more target languages
    Compile(CompileConfig),
}

#[derive(Parser, Debug)]
struct CompileConfig {
    /// Module name
    #[arg(long, env = "PROTOFORGE_MODULE")]
    module: String,

    /// Module version
    #[arg(long, env = "PROTOFORGE_VERSION", default_value = "0.1.0")]
    version: String,

    /// Proto source files to compile
    #[arg(long = "proto", required = true)]
    proto_files: Vec<PathBuf>,

    /// Target languages, comma-separated
    #[arg(long, value_delimiter = ',', default_value = "go")]
    languages: Vec<String>,

    /// Also generate gRPC service stubs
    #[arg(long)]
    include_rpc: bool,

    /// Root path for the local-disk artifact store
    #[arg(long, env = "PROTOFORGE_CAS_ROOT")]
    cas_root: PathBuf,

    /// Upper bound on concurrent per-language compilations
    #[arg(long, env = "PROTOFORGE_MAX_PARALLEL_WORKERS", default_value = "5")]
    max_parallel_workers: usize,

    /// Per-compile wall-clock cap, in seconds
    #[arg(long, env = "PROTOFORGE_COMPILATION_TIMEOUT_SECS", default_value = "300")]
    compilation_timeout_secs: u64,

    /// Disable cache consultation and writes
    #[arg(long)]
    disable_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .pretty(),
        )
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile(config) => compile(config).await,
    }
}

async fn compile(config: CompileConfig) -> Result<()> {
    let request = build_request(&config)?;

    let orchestrator_config = OrchestratorConfig {
        max_parallel_workers: config.max_parallel_workers,
        compilation_timeout: Duration::from_secs(config.compilation_timeout_secs),
        enable_cache: !config.disable_cache,
        ..Default::default()
    };

    let registry = Arc::new(LanguageRegistry::with_defaults());
    let runtime = Arc::new(MockRuntime::with_fixture(Arc::new(|request: &protoforge_sandbox::ExecutionRequest| {
        Ok(vec![GeneratedFile::new(
            format!("generated.{}", request.image.rsplit('/').next().unwrap_or("out")),
            format!("// generated by {}\n", request.image),
        )])
    })));
    let cache = Arc::new(Cache::builder(
        256 * 1024 * 1024,
        64 * 1024,
        Duration::from_secs(60 * 60),
    ));
    let store = Disk::new(config.cas_root.clone());

    let orchestrator = Orchestrator::new(registry, runtime, cache, Some(store), orchestrator_config);

    tracing::info!(module = %request.module, version = %request.version, languages = ?config.languages, "starting compile");
    let results = orchestrator
        .compile_all(&request, &config.languages, CancellationToken::new())
        .await;

    match results {
        Ok(results) => {
            for result in &results {
                tracing::info!(
                    language = %result.language,
                    success = result.success,
                    cache_hit = result.cache_hit,
                    files = result.generated_files.len(),
                    archive = ?result.archive_key,
                    "compiled"
                );
            }
            orchestrator.close()?;
            Ok(())
        }
        Err(err) => {
            orchestrator.close()?;
            Err(err).context("compile_all failed")
        }
    }
}

fn build_request(config: &CompileConfig) -> Result<CompileRequest> {
    let mut proto_files = Vec::with_capacity(config.proto_files.len());
    for path in &config.proto_files {
        let content = std::fs::read(path).with_context(|| format!("reading proto file {}", path.display()))?;
        let relative = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        proto_files.push(ProtoFile::new(relative, content));
    }

    Ok(CompileRequest {
        module: config.module.clone(),
        version: config.version.clone(),
        proto_files,
        dependencies: vec![],
        include_rpc: config.include_rpc,
        options: Default::default(),
        upload_prefix: None,
    })
}
