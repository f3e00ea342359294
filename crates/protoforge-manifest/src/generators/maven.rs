use std::fmt::Write as _;

use protoforge_types::GeneratedFile;

use crate::error::{ManifestError, Result};
use crate::names::maven_coordinate;
use crate::request::ManifestRequest;

const ECOSYSTEM: &str = "maven";
const DEFAULT_GROUP: &str = "com.protoforge.generated";
const GRPC_RUNTIME: (&str, &str, &str) = ("io.grpc", "grpc-stub", "1.62.2");
const PROTOBUF_RUNTIME: (&str, &str, &str) = ("com.google.protobuf", "protobuf-java", "3.25.3");

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

    let (group, artifact) = maven_coordinate(&request.module, DEFAULT_GROUP);

    let mut pom = String::new();
    write_pom(&mut pom, request, group, artifact).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "pom.xml",
            source,
        }
    })?;

    let mut readme = String::new();
    write_readme(&mut readme, request, artifact).map_err(|source| {
        ManifestError::TemplateExecutionFailed {
            ecosystem: ECOSYSTEM,
            template: "README",
            source,
        }
    })?;

    Ok(vec![
        GeneratedFile::new("pom.xml", pom),
        GeneratedFile::new("README.md", readme),
    ])
}

fn write_pom(out: &mut String, request: &ManifestRequest, group: &str, artifact: &str) -> std::fmt::Result {
    writeln!(out, "<project>")?;
    writeln!(out, "  <modelVersion>4.0.0</modelVersion>")?;
    writeln!(out, "  <groupId>{group}</groupId>")?;
    writeln!(out, "  <artifactId>{artifact}</artifactId>")?;
    writeln!(out, "  <version>{}</version>", request.version)?;
    writeln!(out, "  <dependencies>")?;
    write_dependency(out, PROTOBUF_RUNTIME.0, PROTOBUF_RUNTIME.1, PROTOBUF_RUNTIME.2)?;
    if request.include_rpc {
        write_dependency(out, GRPC_RUNTIME.0, GRPC_RUNTIME.1, GRPC_RUNTIME.2)?;
    }
    for dep in &request.dependencies {
        let (dep_group, dep_artifact) = maven_coordinate(dep, DEFAULT_GROUP);
        write_dependency(out, dep_group, dep_artifact, "latest")?;
    }
    writeln!(out, "  </dependencies>")?;
    writeln!(out, "</project>")?;
    Ok(())
}

fn write_dependency(out: &mut String, group: &str, artifact: &str, version: &str) -> std::fmt::Result {
    writeln!(out, "    <dependency>")?;
    writeln!(out, "      <groupId>{group}</groupId>")?;
    writeln!(out, "      <artifactId>{artifact}</artifactId>")?;
    writeln!(out, "      <version>{version}</version>")?;
    writeln!(out, "    </dependency>")
}

fn write_readme(out: &mut String, request: &ManifestRequest, artifact: &str) -> std::fmt::Result {
    writeln!(out, "# {artifact}")?;
    writeln!(out)?;
    writeln!(out, "Generated Java bindings, version {}.", request.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> ManifestRequest {
        ManifestRequest {
            module: "com.acme:user-service".into(),
            version: "1.0.0".into(),
            include_rpc: true,
            dependencies: vec!["com.acme:common".into()],
        }
    }

    #[test]
    fn splits_group_and_artifact() {
        let files = generate(&req()).unwrap();
        let pom = files.iter().find(|f| f.path == "pom.xml").unwrap();
        let body = String::from_utf8(pom.content.clone()).unwrap();
        assert!(body.contains("<groupId>com.acme</groupId>"));
        assert!(body.contains("<artifactId>user-service</artifactId>"));
        assert!(body.contains("io.grpc"));
    }

    #[test]
    fn uses_default_group_when_coordinate_has_no_prefix() {
        let mut req = req();
        req.module = "user-service".into();
        let files = generate(&req).unwrap();
        let pom = files.iter().find(|f| f.path == "pom.xml").unwrap();
        let body = String::from_utf8(pom.content.clone()).unwrap();
        assert!(body.contains(&format!("<groupId>{DEFAULT_GROUP}</groupId>")));
    }
}
