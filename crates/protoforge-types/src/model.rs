use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TypesError};

/// A single proto source file.
///
/// `path` is relative, forward-slash separated, and must not contain `..`
/// components or a leading `/`.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct ProtoFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl ProtoFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn validate_path(path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(TypesError::EmptyField { field: "proto path" });
        }
        if path.starts_with('/') || path.split('/').any(|part| part == "..") {
            return Err(TypesError::InvalidProtoPath(path.to_owned()));
        }
        Ok(())
    }
}

/// A named, versioned transitive proto closure contributed by another
/// module. Proto paths within a dependency are namespaced under its own
/// root so they never collide with the primary request's paths.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Dependency {
    pub module: String,
    pub version: String,
    pub proto_files: Vec<ProtoFile>,
}

impl Dependency {
    pub fn new(module: impl Into<String>, version: impl Into<String>, proto_files: Vec<ProtoFile>) -> Self {
        Self {
            module: module.into(),
            version: version.into(),
            proto_files,
        }
    }
}

/// Immutable registration record for a single target language.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub id: String,
    pub display_name: String,
    pub image: String,
    pub image_tag: String,
    pub plugin_version: String,
    pub base_flags: Vec<String>,
    pub supports_rpc: bool,
    pub rpc_flags: Vec<String>,
    pub output_extensions: Vec<String>,
    pub enabled: bool,
    pub package_manager: Option<String>,
}

impl LanguageSpec {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(TypesError::EmptyField { field: "language id" });
        }
        if self.display_name.is_empty() {
            return Err(TypesError::EmptyField {
                field: "language display_name",
            });
        }
        if self.image.is_empty() {
            return Err(TypesError::EmptyField { field: "language image" });
        }
        if self.plugin_version.is_empty() {
            return Err(TypesError::EmptyField {
                field: "language plugin_version",
            });
        }
        Ok(())
    }

    /// The `protoc` output flag for this language, e.g. `--go_out=/output`.
    pub fn out_flag(&self, output_dir: &str) -> String {
        format!("--{}_out={output_dir}", self.id)
    }
}

/// Name + emitted config files + dependency coordinate mapping for a single
/// package-manager ecosystem (go-modules, pip, maven, npm, ...).
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct PackageManagerSpec {
    pub name: String,
    pub config_files: Vec<String>,
    pub dependency_coordinates: BTreeMap<String, String>,
    pub default_runtime_versions: BTreeMap<String, String>,
}

/// A request to compile a proto file set for one or more target languages.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompileRequest {
    pub module: String,
    pub version: String,
    pub proto_files: Vec<ProtoFile>,
    pub dependencies: Vec<Dependency>,
    pub include_rpc: bool,
    pub options: BTreeMap<String, String>,
    pub upload_prefix: Option<String>,
}

impl CompileRequest {
    pub fn validate(&self) -> Result<()> {
        if self.module.is_empty() {
            return Err(TypesError::EmptyField { field: "module" });
        }
        if self.version.is_empty() {
            return Err(TypesError::EmptyField { field: "version" });
        }
        if self.proto_files.is_empty() {
            return Err(TypesError::EmptyField { field: "proto_files" });
        }

        let mut seen = std::collections::HashSet::with_capacity(self.proto_files.len());
        for file in &self.proto_files {
            ProtoFile::validate_path(&file.path)?;
            if !seen.insert(&file.path) {
                return Err(TypesError::DuplicateProtoPath(file.path.clone()));
            }
        }
        Ok(())
    }
}

/// One generated output or manifest file, relative to its output root.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: Vec<u8>,
    pub size: u64,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self {
            path: path.into(),
            content,
            size,
        }
    }
}

/// Outcome of compiling a single language for a single request.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompilationResult {
    pub language: String,
    pub success: bool,
    pub generated_files: Vec<GeneratedFile>,
    pub manifest_files: Vec<GeneratedFile>,
    pub duration_ms: u64,
    pub cache_hit: bool,
    pub error: Option<String>,
    pub archive_key: Option<String>,
    pub archive_namespace: Option<String>,
    pub archive_checksum: Option<String>,
}

impl CompilationResult {
    pub fn failed(language: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            success: false,
            generated_files: Vec::new(),
            manifest_files: Vec::new(),
            duration_ms: 0,
            cache_hit: false,
            error: Some(error.into()),
            archive_key: None,
            archive_namespace: None,
            archive_checksum: None,
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Async tracking record for a single language's compilation within a
/// request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilationJob {
    pub id: Uuid,
    pub language: String,
    pub status: JobStatus,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub result: Option<CompilationResult>,
    pub error: Option<String>,
}

impl CompilationJob {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            status: JobStatus::Pending,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_module() {
        let req = CompileRequest {
            module: String::new(),
            version: "1.0.0".into(),
            proto_files: vec![ProtoFile::new("a.proto", "syntax = \"proto3\";")],
            dependencies: vec![],
            include_rpc: false,
            options: BTreeMap::new(),
            upload_prefix: None,
        };
        assert!(matches!(req.validate(), Err(TypesError::EmptyField { field: "module" })));
    }

    #[test]
    fn rejects_duplicate_proto_path() {
        let req = CompileRequest {
            module: "user".into(),
            version: "1.0.0".into(),
            proto_files: vec![
                ProtoFile::new("a.proto", "one"),
                ProtoFile::new("a.proto", "two"),
            ],
            dependencies: vec![],
            include_rpc: false,
            options: BTreeMap::new(),
            upload_prefix: None,
        };
        assert!(matches!(
            req.validate(),
            Err(TypesError::DuplicateProtoPath(ref p)) if p == "a.proto"
        ));
    }

    #[test]
    fn rejects_traversal_path() {
        assert!(ProtoFile::validate_path("../etc/passwd").is_err());
        assert!(ProtoFile::validate_path("/abs/path.proto").is_err());
        assert!(ProtoFile::validate_path("nested/../x.proto").is_err());
        assert!(ProtoFile::validate_path("nested/ok.proto").is_ok());
    }
}
