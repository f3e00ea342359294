use std::fmt::Write as _;

use protoforge_types::GeneratedFile;

use crate::error::{ManifestError, Result};
use crate::request::ManifestRequest;

const ECOSYSTEM: &str = "go-modules";
const GRPC_RUNTIME: &str = "google.golang.org/grpc";
const PROTOBUF_RUNTIME: &str = "google.golang.org/protobuf";

pub fn generate(request: &ManifestRequest) -> Result<Vec<GeneratedFile>> {
    if request.module.is_empty() {
        return Err(ManifestError::MissingRequiredField {
            ecosystem: ECOSYSTEM,
            field: "module",
        });
    }
    if request.version.is_empty() {
        return Err(ManifestError::MissingRequiredField {
            ecosystem: ECOSYSTEM,
            field: "version",
        });
    }

    let mut go_mod = String::new();
    write_go_mod(&mut go_mod, request).map_err(|source| ManifestError::TemplateExecutionFailed {
        ecosystem: ECOSYSTEM,
        template: "go.mod",
        source,
    })?;

    let mut readme = String::new();
    write_readme(&mut readme, request).map_err(|source| ManifestError::TemplateExecutionFailed {
        ecosystem: ECOSYSTEM,
        template: "README",
        source,
    })?;

    Ok(vec![
        GeneratedFile::new("go.mod", go_mod),
        GeneratedFile::new("README.md", readme),
    ])
}

fn write_go_mod(out: &mut String, request: &ManifestRequest) -> std::fmt::Result {
    writeln!(out, "module {}", request.module)?;
    writeln!(out)?;
    writeln!(out, "go 1.22")?;
    writeln!(out)?;
    writeln!(out, "require (")?;
    writeln!(out, "\t{PROTOBUF_RUNTIME} latest")?;
    if request.include_rpc {
        writeln!(out, "\t{GRPC_RUNTIME} latest")?;
    }
    for dep in &request.dependencies {
        writeln!(out, "\t{dep} latest")?;
    }
    writeln!(out, ")")?;
    Ok(())
}

fn write_readme(out: &mut String, request: &ManifestRequest) -> std::fmt::Result {
    writeln!(out, "# {}", request.module)?;
    writeln!(out)?;
    writeln!(out, "Generated Go bindings, version {}.", request.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> ManifestRequest {
        ManifestRequest {
            module: "github.com/acme/user".into(),
            version: "1.0.0".into(),
            include_rpc: true,
            dependencies: vec!["github.com/acme/common".into()],
        }
    }

    #[test]
    fn emits_go_mod_and_readme() {
        let files = generate(&req()).unwrap();
        assert_eq!(files.len(), 2);
        let go_mod = files.iter().find(|f| f.path == "go.mod").unwrap();
        let body = String::from_utf8(go_mod.content.clone()).unwrap();
        assert!(body.contains("module github.com/acme/user"));
        assert!(body.contains(GRPC_RUNTIME));
        assert!(body.contains("github.com/acme/common"));
    }

    #[test]
    fn omits_grpc_runtime_without_rpc() {
        let mut req = req();
        req.include_rpc = false;
        let files = generate(&req).unwrap();
        let go_mod = files.iter().find(|f| f.path == "go.mod").unwrap();
        let body = String::from_utf8(go_mod.content.clone()).unwrap();
        assert!(!body.contains(GRPC_RUNTIME));
    }

    #[test]
    fn rejects_empty_module() {
        let mut req = req();
        req.module = String::new();
        assert!(matches!(
            generate(&req),
            Err(ManifestError::MissingRequiredField { field: "module", .. })
        ));
    }
}
