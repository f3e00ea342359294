use std::collections::BTreeMap;
use std::sync::RwLock;

use protoforge_types::LanguageSpec;

use crate::error::{CoreError, Result};

/// Guarded map of language id -> spec. `RwLock` favors readers, matching the
/// read-heavy access pattern the registry sees (most calls look languages
/// up; registration/enable/disable are comparatively rare).
pub struct LanguageRegistry {
    inner: RwLock<BTreeMap<String, LanguageSpec>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// A registry pre-populated with Go, Python, and Java — the minimum set
    /// this codebase recognizes out of the box.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for spec in default_language_specs() {
            registry.register(spec).expect("default language specs are valid");
        }
        registry
    }

    pub fn register(&self, spec: LanguageSpec) -> Result<()> {
        spec.validate()?;
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if inner.contains_key(&spec.id) {
            return Err(CoreError::LanguageAlreadyRegistered(spec.id));
        }
        inner.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<LanguageSpec> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::LanguageNotSupported(id.to_owned()))
    }

    pub fn list(&self) -> Vec<LanguageSpec> {
        self.inner.read().expect("registry lock poisoned").values().cloned().collect()
    }

    pub fn list_enabled(&self) -> Vec<LanguageSpec> {
        self.list().into_iter().filter(|spec| spec.enabled).collect()
    }

    pub fn update(&self, spec: LanguageSpec) -> Result<()> {
        spec.validate()?;
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if !inner.contains_key(&spec.id) {
            return Err(CoreError::LanguageNotSupported(spec.id));
        }
        inner.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::LanguageNotSupported(id.to_owned()))
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        let spec = inner.get_mut(id).ok_or_else(|| CoreError::LanguageNotSupported(id.to_owned()))?;
        spec.enabled = enabled;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").len()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_language_specs() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec {
            id: "go".to_owned(),
            display_name: "Go".to_owned(),
            image: "protoforge/protoc-go".to_owned(),
            image_tag: "latest".to_owned(),
            plugin_version: "v1".to_owned(),
            base_flags: vec![],
            supports_rpc: true,
            rpc_flags: vec!["--go-grpc_out=/output".to_owned()],
            output_extensions: vec!["go".to_owned()],
            enabled: true,
            package_manager: Some("go-modules".to_owned()),
        },
        LanguageSpec {
            id: "python".to_owned(),
            display_name: "Python".to_owned(),
            image: "protoforge/protoc-python".to_owned(),
            image_tag: "latest".to_owned(),
            plugin_version: "v1".to_owned(),
            base_flags: vec![],
            supports_rpc: true,
            rpc_flags: vec!["--grpc_python_out=/output".to_owned()],
            output_extensions: vec!["py".to_owned(), "pyi".to_owned()],
            enabled: true,
            package_manager: Some("pip".to_owned()),
        },
        LanguageSpec {
            id: "java".to_owned(),
            display_name: "Java".to_owned(),
            image: "protoforge/protoc-java".to_owned(),
            image_tag: "latest".to_owned(),
            plugin_version: "v1".to_owned(),
            base_flags: vec![],
            supports_rpc: true,
            rpc_flags: vec!["--grpc-java_out=/output".to_owned()],
            output_extensions: vec!["java".to_owned()],
            enabled: true,
            package_manager: Some("maven".to_owned()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_go_python_java() {
        let registry = LanguageRegistry::with_defaults();
        assert_eq!(registry.count(), 3);
        assert!(registry.get("go").is_ok());
        assert!(registry.get("python").is_ok());
        assert!(registry.get("java").is_ok());
    }

    #[test]
    fn unknown_language_fails() {
        let registry = LanguageRegistry::with_defaults();
        assert!(matches!(registry.get("rustic"), Err(CoreError::LanguageNotSupported(_))));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = LanguageRegistry::with_defaults();
        let go = registry.get("go").unwrap();
        assert!(matches!(
            registry.register(go),
            Err(CoreError::LanguageAlreadyRegistered(_))
        ));
    }

    #[test]
    fn disabling_removes_from_enabled_list() {
        let registry = LanguageRegistry::with_defaults();
        registry.set_enabled("python", false).unwrap();
        let enabled: Vec<_> = registry.list_enabled().into_iter().map(|s| s.id).collect();
        assert!(!enabled.contains(&"python".to_owned()));
        assert_eq!(enabled.len(), 2);
    }
}
