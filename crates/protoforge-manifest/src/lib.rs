//! Per-ecosystem package-manifest generation.
//!
//! Each [`Ecosystem`] emits a module descriptor plus companion files (a
//! README, and sometimes a secondary config file) as a pure function of a
//! [`ManifestRequest`]. Bodies are assembled with `format!`/`write!` directly
//! rather than through a templating engine, matching how this codebase's own
//! response-body builders work.

pub mod error;
mod generators;
pub mod names;
mod request;

pub use error::{ManifestError, Result};
pub use request::ManifestRequest;

use protoforge_types::GeneratedFile;

/// A package-manager ecosystem a language spec can be paired with.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Ecosystem {
    GoModules,
    Pip,
    Maven,
    Npm,
}

impl Ecosystem {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "go-modules" => Ok(Self::GoModules),
            "pip" => Ok(Self::Pip),
            "maven" => Ok(Self::Maven),
            "npm" => Ok(Self::Npm),
            other => Err(ManifestError::UnknownEcosystem(other.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GoModules => "go-modules",
            Self::Pip => "pip",
            Self::Maven => "maven",
            Self::Npm => "npm",
        }
    }

    pub fn config_files(&self) -> &'static [&'static str] {
        match self {
            Self::GoModules => &["go.mod"],
            Self::Pip => &["setup.py", "pyproject.toml"],
            Self::Maven => &["pom.xml"],
            Self::Npm => &["package.json", "tsconfig.json"],
        }
    }

    #[tracing::instrument(skip(self, request), fields(ecosystem = self.name(), module = %request.module))]
    pub fn generate(&self, request: &ManifestRequest) -> Result<Vec<GeneratedFile>> {
        match self {
            Self::GoModules => generators::go::generate(request),
            Self::Pip => generators::pip::generate(request),
            Self::Maven => generators::maven::generate(request),
            Self::Npm => generators::npm::generate(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ecosystem_rejected() {
        assert!(matches!(
            Ecosystem::from_name("rustic"),
            Err(ManifestError::UnknownEcosystem(_))
        ));
    }

    #[test]
    fn known_ecosystems_roundtrip_name() {
        for eco in [Ecosystem::GoModules, Ecosystem::Pip, Ecosystem::Maven, Ecosystem::Npm] {
            assert_eq!(Ecosystem::from_name(eco.name()).unwrap().name(), eco.name());
        }
    }
}
