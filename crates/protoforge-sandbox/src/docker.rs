//! `ContainerRuntime` implementation against the Docker Engine API. `bollard`
//! is already a workspace dependency (pulled in for `e2e`'s testcontainers
//! stack); this is its first direct use as a runtime dependency rather than
//! a transitive one.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use protoforge_types::{GeneratedFile, ProtoFile};

use crate::argv::build_protoc_argv;
use crate::error::{Result, SandboxError};
use crate::model::{ExecutionRequest, ExecutionResult};
use crate::runtime::ContainerRuntime;

const IMAGE_PULL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct DockerRuntime {
    client: Docker,
    pulled_images: Mutex<HashSet<String>>,
}

impl DockerRuntime {
    pub fn connect() -> Result<Self> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|err| SandboxError::DockerNotAvailable(err.to_string()))?;
        Ok(Self {
            client,
            pulled_images: Mutex::new(HashSet::new()),
        })
    }

    async fn ensure_image(&self, image_ref: &str) -> Result<()> {
        if self
            .pulled_images
            .lock()
            .expect("pulled-images lock poisoned")
            .contains(image_ref)
        {
            return Ok(());
        }

        if self.client.inspect_image(image_ref).await.is_ok() {
            self.pulled_images
                .lock()
                .expect("pulled-images lock poisoned")
                .insert(image_ref.to_owned());
            return Ok(());
        }

        let options = CreateImageOptions {
            from_image: image_ref,
            ..Default::default()
        };

        let pull = async {
            let mut stream = self.client.create_image(Some(options), None, None);
            while let Some(chunk) = stream.next().await {
                chunk.map_err(|source| SandboxError::ImagePullFailed {
                    image: image_ref.to_owned(),
                    source,
                })?;
            }
            Ok::<(), SandboxError>(())
        };

        tokio::time::timeout(IMAGE_PULL_TIMEOUT, pull)
            .await
            .map_err(|_| SandboxError::ImagePullFailed {
                image: image_ref.to_owned(),
                source: bollard::errors::Error::RequestTimeoutError,
            })??;

        self.pulled_images
            .lock()
            .expect("pulled-images lock poisoned")
            .insert(image_ref.to_owned());
        info!(image = image_ref, "pulled image");
        Ok(())
    }

    async fn materialize_inputs(root: &Path, files: &[ProtoFile]) -> Result<()> {
        for file in files {
            let dest = root.join(&file.path);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
                set_mode(parent, 0o755).await?;
            }
            tokio::fs::write(&dest, &file.content).await?;
            set_mode(&dest, 0o644).await?;
        }
        Ok(())
    }

    async fn harvest_outputs(root: &Path) -> Result<Vec<GeneratedFile>> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    let content = tokio::fs::read(&path).await?;
                    let relative = path
                        .strip_prefix(root)
                        .expect("walked path is under root")
                        .to_string_lossy()
                        .replace('\\', "/");
                    files.push(GeneratedFile::new(relative, content));
                }
            }
        }
        Ok(files)
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

impl ContainerRuntime for DockerRuntime {
    async fn run(&self, request: &ExecutionRequest, cancel: CancellationToken) -> Result<ExecutionResult> {
        let started = Instant::now();
        let image_ref = request.image_ref();
        self.ensure_image(&image_ref).await?;

        let input_dir = tempfile::tempdir()?;
        let output_dir = tempfile::tempdir()?;
        Self::materialize_inputs(input_dir.path(), &request.proto_files).await?;

        let proto_paths: Vec<String> = request.proto_files.iter().map(|f| f.path.clone()).collect();
        let argv = build_protoc_argv(&proto_paths, &request.flags);
        let mut cmd = vec!["protoc".to_owned()];
        cmd.extend(argv);

        let env: Vec<String> = request.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let name = format!("protoforge-{}", Uuid::new_v4());
        let host_config = HostConfig {
            binds: Some(vec![
                format!("{}:/input:ro", input_dir.path().display()),
                format!("{}:/output:rw", output_dir.path().display()),
            ]),
            memory: Some(request.limits.memory_bytes),
            nano_cpus: Some((request.limits.cpu_cores * 1_000_000_000.0) as i64),
            auto_remove: Some(false),
            ..Default::default()
        };

        let config = Config {
            image: Some(image_ref.clone()),
            cmd: Some(cmd),
            env: Some(env),
            host_config: Some(host_config),
            ..Default::default()
        };

        let container = self
            .client
            .create_container(Some(CreateContainerOptions { name: name.clone(), platform: None }), config)
            .await
            .map_err(|err| SandboxError::ContainerCreateFailed(err.to_string()))?;

        let cleanup = |client: Docker, id: String| async move {
            let _ = client
                .remove_container(&id, Some(RemoveContainerOptions { force: true, ..Default::default() }))
                .await;
        };

        let result = self.run_started(&container.id, request, cancel.clone()).await;

        let (stdout, stderr) = match self.collect_logs(&container.id).await {
            Ok(logs) => logs,
            Err(err) => {
                warn!("failed to collect container logs: {err}");
                (String::new(), String::new())
            }
        };

        cleanup(self.client.clone(), container.id.clone()).await;

        let duration = started.elapsed();
        match result {
            Ok(exit_code) if exit_code == 0 => {
                let files = Self::harvest_outputs(output_dir.path()).await?;
                if files.is_empty() {
                    return Err(SandboxError::NoGeneratedFiles);
                }
                Ok(ExecutionResult::success(exit_code, stdout, stderr, files, duration))
            }
            Ok(exit_code) => Err(SandboxError::ContainerFailed { exit_code, stderr }),
            Err(SandboxError::Timeout) => Err(SandboxError::Timeout),
            Err(err) => Err(err),
        }
    }
}

impl DockerRuntime {
    async fn run_started(&self, container_id: &str, request: &ExecutionRequest, cancel: CancellationToken) -> Result<i64> {
        self.client
            .start_container::<String>(container_id, None)
            .await
            .map_err(|err| SandboxError::ContainerCreateFailed(err.to_string()))?;

        let wait = async {
            let mut stream = self.client.wait_container(container_id, None::<WaitContainerOptions<String>>);
            match stream.next().await {
                Some(Ok(response)) => Ok(response.status_code),
                Some(Err(err)) => Err(SandboxError::ContainerCreateFailed(err.to_string())),
                None => Ok(0),
            }
        };

        tokio::select! {
            result = wait => result,
            _ = tokio::time::sleep(request.limits.timeout) => Err(SandboxError::Timeout),
            _ = cancel.cancelled() => Err(SandboxError::Timeout),
        }
    }

    async fn collect_logs(&self, container_id: &str) -> Result<(String, String)> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = self.client.logs(container_id, Some(options));
        let mut stdout = String::new();
        let mut stderr = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(|err| SandboxError::ContainerCreateFailed(err.to_string()))? {
                LogOutput::StdOut { message } => stdout.push_str(&String::from_utf8_lossy(&message)),
                LogOutput::StdErr { message } => stderr.push_str(&String::from_utf8_lossy(&message)),
                _ => {}
            }
        }
        Ok((stdout, stderr))
    }
}
