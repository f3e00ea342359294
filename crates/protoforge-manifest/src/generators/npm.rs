use std::fmt::Write as _;

use protoforge_types::GeneratedFile;

use crate::error::{ManifestError, Result};
use crate::names::npm_name;
use crate::request::ManifestRequest;

const ECOSYSTEM: &str = "npm";
const GRPC_RUNTIME: &str = "@grpc/grpc-js";
const PROTOBUF_RUNTIME: &str = "google-protobuf";

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

    let package_name = npm_name(&request.module);

    let mut package_json = String::new();
    write_package_json(&mut package_json, request, &package_name).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "package.json",
            source,
        }
    })?;

    let mut tsconfig = String::new();
    write_tsconfig(&mut tsconfig).map_err(|source| ManifestError::TemplateExecutionFailed {
        ecosystem: ECOSYSTEM,
        template: "tsconfig.json",
        source,
    })?;

    let mut readme = String::new();
    write_readme(&mut readme, request, &package_name).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "README",
            source,
        }
    })?;

    Ok(vec![
        GeneratedFile::new("package.json", package_json),
        GeneratedFile::new("tsconfig.json", tsconfig),
        GeneratedFile::new("README.md", readme),
    ])
}

fn write_package_json(out: &mut String, request: &ManifestRequest, name: &str) -> std::fmt::Result {
    writeln!(out, "{{")?;
    writeln!(out, "  \"name\": \"{name}\",")?;
    writeln!(out, "  \"version\": \"{}\",", request.version)?;
    writeln!(out, "  \"dependencies\": {{")?;

    let mut deps = vec![(PROTOBUF_RUNTIME.to_owned(), "latest".to_owned())];
    if request.include_rpc {
        deps.push((GRPC_RUNTIME.to_owned(), "latest".to_owned()));
    }
    for dep in &request.dependencies {
        deps.push((npm_name(dep), "latest".to_owned()));
    }

    for (i, (dep, version)) in deps.iter().enumerate() {
        let comma = if i + 1 == deps.len() { "" } else { "," };
        writeln!(out, "    \"{dep}\": \"{version}\"{comma}")?;
    }
    writeln!(out, "  }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn write_tsconfig(out: &mut String) -> std::fmt::Result {
    writeln!(out, "{{")?;
    writeln!(out, "  \"compilerOptions\": {{")?;
    writeln!(out, "    \"declaration\": true,")?;
    writeln!(out, "    \"module\": \"commonjs\"")?;
    writeln!(out, "  }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn write_readme(out: &mut String, request: &ManifestRequest, name: &str) -> std::fmt::Result {
    writeln!(out, "# {name}")?;
    writeln!(out)?;
    writeln!(out, "Generated TypeScript bindings, version {}.", request.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> ManifestRequest {
        ManifestRequest {
            module: "User_Service".into(),
            version: "1.0.0".into(),
            include_rpc: false,
            dependencies: vec![],
        }
    }

    #[test]
    fn normalizes_package_name_and_omits_grpc() {
        let files = generate(&req()).unwrap();
        let pkg = files.iter().find(|f| f.path == "package.json").unwrap();
        let body = String::from_utf8(pkg.content.clone()).unwrap();
        assert!(body.contains("\"name\": \"user-service\""));
        assert!(!body.contains(GRPC_RUNTIME));
    }

    #[test]
    fn emits_tsconfig() {
        let files = generate(&req()).unwrap();
        assert!(files.iter().any(|f| f.path == "tsconfig.json"));
    }
}
