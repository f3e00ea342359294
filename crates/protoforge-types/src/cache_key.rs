//! Canonical content-addressed fingerprint for a compile request (algorithm
//! v1). Changing the byte layout here invalidates every existing cache
//! entry; bump [`CacheKey::ALGORITHM_VERSION`] and document the drain if that
//! ever happens.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{Result, TypesError};
use crate::model::{CompileRequest, Dependency, ProtoFile};

/// A fully-assembled cache key for one language of one compile request.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CacheKey {
    pub module: String,
    pub version: String,
    pub language: String,
    pub plugin_version: String,
    pub proto_hash: String,
    pub options_hash: Option<String>,
}

impl CacheKey {
    pub const ALGORITHM_VERSION: u8 = 1;

    pub fn new(
        module: impl Into<String>,
        version: impl Into<String>,
        language: impl Into<String>,
        plugin_version: impl Into<String>,
        proto_files: &[ProtoFile],
        dependencies: &[Dependency],
        options: &std::collections::BTreeMap<String, String>,
    ) -> Result<Self> {
        let module = module.into();
        let version = version.into();
        let language = language.into();
        let plugin_version = plugin_version.into();

        if module.is_empty() {
            return Err(TypesError::EmptyField { field: "module" });
        }
        if version.is_empty() {
            return Err(TypesError::EmptyField { field: "version" });
        }
        if language.is_empty() {
            return Err(TypesError::EmptyField { field: "language" });
        }

        let proto_hash = proto_fingerprint(proto_files, dependencies);
        let options_hash = options_fingerprint(options);

        Ok(Self {
            module,
            version,
            language,
            plugin_version,
            proto_hash,
            options_hash,
        })
    }

    pub fn from_request(req: &CompileRequest, language: &str, plugin_version: &str) -> Result<Self> {
        Self::new(
            req.module.clone(),
            req.version.clone(),
            language,
            plugin_version,
            &req.proto_files,
            &req.dependencies,
            &req.options,
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.module, self.version, self.language, self.plugin_version, self.proto_hash
        )?;
        if let Some(opt) = &self.options_hash {
            write!(f, ":{opt}")?;
        }
        Ok(())
    }
}

/// SHA-256 over the sorted, canonicalized proto file set and dependency
/// closure. Stable under any input ordering; sensitive to any byte of any
/// path or content.
fn proto_fingerprint(proto_files: &[ProtoFile], dependencies: &[Dependency]) -> String {
    let mut hasher = Sha256::new();

    let mut files: Vec<&ProtoFile> = proto_files.iter().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    for file in files {
        hash_file(&mut hasher, file);
    }

    let mut deps: Vec<&Dependency> = dependencies.iter().collect();
    deps.sort_by(|a, b| (&a.module, &a.version).cmp(&(&b.module, &b.version)));
    for dep in deps {
        hasher.update(dep.module.as_bytes());
        hasher.update([0u8]);
        hasher.update(dep.version.as_bytes());
        hasher.update([0u8]);

        let mut dep_files: Vec<&ProtoFile> = dep.proto_files.iter().collect();
        dep_files.sort_by(|a, b| a.path.cmp(&b.path));
        for file in dep_files {
            hash_file(&mut hasher, file);
        }
    }

    hex::encode(hasher.finalize())
}

fn hash_file(hasher: &mut Sha256, file: &ProtoFile) {
    hasher.update(file.path.as_bytes());
    hasher.update([0u8]);
    hasher.update(&file.content);
    hasher.update([0u8]);
}

/// First 16 hex characters of the SHA-256 over sorted `key\0value\0` pairs.
/// `None` when the option map is empty, so requests without options don't
/// carry a redundant constant suffix in their cache-key string.
fn options_fingerprint(options: &std::collections::BTreeMap<String, String>) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    let mut hasher = Sha256::new();
    for (key, value) in options {
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }
    let full = hex::encode(hasher.finalize());
    Some(full[..16].to_owned())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::{prop_assert_eq, prop_assert_ne, proptest};
    use simple_test_case::test_case;

    use super::*;
    use std::collections::BTreeMap;

    fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fingerprint_is_order_independent() {
        let a = vec![
            ProtoFile::new("a.proto", "one"),
            ProtoFile::new("b.proto", "two"),
        ];
        let b = vec![
            ProtoFile::new("b.proto", "two"),
            ProtoFile::new("a.proto", "one"),
        ];
        assert_eq!(proto_fingerprint(&a, &[]), proto_fingerprint(&b, &[]));
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let a = vec![ProtoFile::new("a.proto", "one")];
        let b = vec![ProtoFile::new("a.proto", "two")];
        assert_ne!(proto_fingerprint(&a, &[]), proto_fingerprint(&b, &[]));
    }

    #[test]
    fn fingerprint_changes_with_dependency_version() {
        let files = vec![ProtoFile::new("a.proto", "one")];
        let dep_v1 = Dependency::new("common", "1.0.0", vec![ProtoFile::new("c.proto", "x")]);
        let dep_v2 = Dependency::new("common", "2.0.0", vec![ProtoFile::new("c.proto", "x")]);
        assert_ne!(
            proto_fingerprint(&files, &[dep_v1]),
            proto_fingerprint(&files, &[dep_v2])
        );
    }

    #[test]
    fn options_hash_is_order_independent_and_absent_when_empty() {
        assert_eq!(options_fingerprint(&BTreeMap::new()), None);

        let a = opts(&[("x", "1"), ("y", "2")]);
        let b = opts(&[("y", "2"), ("x", "1")]);
        assert_eq!(options_fingerprint(&a), options_fingerprint(&b));

        let c = opts(&[("x", "1"), ("y", "3")]);
        assert_ne!(options_fingerprint(&a), options_fingerprint(&c));
    }

    #[test]
    fn display_format_omits_options_hash_when_absent() {
        let key = CacheKey::new(
            "user",
            "1.0.0",
            "go",
            "v1",
            &[ProtoFile::new("a.proto", "x")],
            &[],
            &BTreeMap::new(),
        )
        .unwrap();
        let rendered = key.to_string();
        assert_eq!(rendered.matches(':').count(), 4);
        assert!(rendered.starts_with("user:1.0.0:go:v1:"));
    }

    #[test_case("", "1.0.0", "go"; "empty_module")]
    #[test_case("user", "", "go"; "empty_version")]
    #[test_case("user", "1.0.0", ""; "empty_language")]
    #[test]
    fn rejects_empty_identity_field(module: &str, version: &str, language: &str) {
        let err = CacheKey::new(module, version, language, "v1", &[], &[], &BTreeMap::new());
        assert!(matches!(err, Err(TypesError::EmptyField { .. })));
    }

    proptest! {
        #[test]
        fn fingerprint_is_order_independent_for_arbitrary_files(
            contents in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..8),
        ) {
            let files: Vec<ProtoFile> = contents
                .iter()
                .enumerate()
                .map(|(i, content)| ProtoFile::new(format!("f{i}.proto"), content.clone()))
                .collect();
            let mut shuffled = files.clone();
            shuffled.reverse();

            prop_assert_eq!(proto_fingerprint(&files, &[]), proto_fingerprint(&shuffled, &[]));
        }

        #[test]
        fn fingerprint_changes_when_any_byte_changes(
            content in proptest::collection::vec(any::<u8>(), 1..64),
            flip_index in 0usize..63,
        ) {
            let index = flip_index % content.len();
            let files = vec![ProtoFile::new("a.proto", content.clone())];

            let mut mutated = content.clone();
            mutated[index] ^= 0xFF;
            let mutated_files = vec![ProtoFile::new("a.proto", mutated)];

            prop_assert_ne!(proto_fingerprint(&files, &[]), proto_fingerprint(&mutated_files, &[]));
        }
    }
}
