use std::fmt::Write as _;

use protoforge_types::GeneratedFile;

use crate::error::{ManifestError, Result};
use crate::names::python_name;
use crate::request::ManifestRequest;

const ECOSYSTEM: &str = "pip";
const GRPC_RUNTIME: &str = "grpcio";
const PROTOBUF_RUNTIME: &str = "protobuf";

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

    let package_name = python_name(&request.module);

    let mut setup_py = String::new();
    write_setup_py(&mut setup_py, request, &package_name).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "setup.py",
            source,
        }
    })?;

    let mut pyproject = String::new();
    write_pyproject(&mut pyproject, request, &package_name).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "pyproject.toml",
            source,
        }
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
        GeneratedFile::new("setup.py", setup_py),
        GeneratedFile::new("pyproject.toml", pyproject),
        GeneratedFile::new("README.md", readme),
    ])
}

fn write_setup_py(out: &mut String, request: &ManifestRequest, name: &str) -> std::fmt::Result {
    writeln!(out, "from setuptools import setup, find_packages")?;
    writeln!(out)?;
    writeln!(out, "setup(")?;
    writeln!(out, "    name=\"{name}\",")?;
    writeln!(out, "    version=\"{}\",", request.version)?;
    writeln!(out, "    packages=find_packages(),")?;

    let mut install_requires = vec![PROTOBUF_RUNTIME.to_owned()];
    if request.include_rpc {
        install_requires.push(GRPC_RUNTIME.to_owned());
    }
    install_requires.extend(request.dependencies.iter().map(|d| python_name(d)));

    write!(out, "    install_requires=[")?;
    for (i, dep) in install_requires.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "\"{dep}\"")?;
    }
    writeln!(out, "],")?;
    writeln!(out, ")")?;
    Ok(())
}

fn write_pyproject(out: &mut String, request: &ManifestRequest, name: &str) -> std::fmt::Result {
    writeln!(out, "[project]")?;
    writeln!(out, "name = \"{name}\"")?;
    writeln!(out, "version = \"{}\"", request.version)?;
    Ok(())
}

fn write_readme(out: &mut String, request: &ManifestRequest, name: &str) -> std::fmt::Result {
    writeln!(out, "# {name}")?;
    writeln!(out)?;
    writeln!(out, "Generated Python bindings, version {}.", request.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> ManifestRequest {
        ManifestRequest {
            module: "User-Service".into(),
            version: "1.0.0".into(),
            include_rpc: true,
            dependencies: vec!["Common-Protos".into()],
        }
    }

    #[test]
    fn normalizes_package_name() {
        let files = generate(&req()).unwrap();
        let setup = files.iter().find(|f| f.path == "setup.py").unwrap();
        let body = String::from_utf8(setup.content.clone()).unwrap();
        assert!(body.contains("name=\"user_service\""));
        assert!(body.contains("common_protos"));
        assert!(body.contains(GRPC_RUNTIME));
    }

    #[test]
    fn rejects_empty_version() {
        let mut req = req();
        req.version = String::new();
        assert!(matches!(
            generate(&req),
            Err(ManifestError::MissingRequiredField { field: "version", .. })
        ));
    }
}
