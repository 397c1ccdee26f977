//! Module loading.
//!
//! The linker never touches the file system itself. A [`ModuleLoader`]
//! hands it the source of a module given its id, and maps the specifiers
//! written in that source to module ids.

use crate::source::ModuleSource;
use esmlink_core::FxMap;
use esmlink_options::LinkerOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("module '{id}' not found")]
    NotFound { id: String },

    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("malformed module source '{id}': {message}")]
    Malformed { id: String, message: String },
}

pub trait ModuleLoader {
    fn load_module(&mut self, id: &str) -> Result<ModuleSource, LoadError>;

    /// Map `specifier`, written in module `containing`, to a module id.
    fn resolve_specifier(&self, containing: &str, specifier: &str) -> Option<String> {
        esmlink_path::module_id_for_specifier(containing, specifier)
    }
}

/// Sources held in memory, keyed by module id.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    modules: IndexMap<String, ModuleSource>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, source: ModuleSource) {
        self.modules.insert(id.into(), source);
    }

    pub fn with_module(mut self, id: impl Into<String>, source: ModuleSource) -> Self {
        self.insert(id, source);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for MemoryLoader {
    fn load_module(&mut self, id: &str) -> Result<ModuleSource, LoadError> {
        self.modules
            .get(id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound { id: id.to_string() })
    }
}

/// A project manifest (`esmlink.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub linker_options: LinkerOptions,
    /// Module linking starts from. Defaults to the first listed module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default)]
    pub modules: IndexMap<String, ModuleSource>,
}

impl Manifest {
    pub fn entry(&self) -> Option<&str> {
        self.entry
            .as_deref()
            .or_else(|| self.modules.keys().next().map(String::as_str))
    }
}

/// Parse a manifest from a JSON string.
pub fn parse_manifest(content: &str) -> Result<Manifest, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse a manifest from a file path.
pub fn parse_manifest_file(path: &str) -> Result<Manifest, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let manifest = parse_manifest(&content)?;
    Ok(manifest)
}

/// Loads modules listed inline in a manifest. Modules missing from the
/// manifest are read from `<root>/<id>.json` when a root directory is set;
/// those reads are cached.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    modules: IndexMap<String, ModuleSource>,
    root: Option<PathBuf>,
    cache: FxMap<String, ModuleSource>,
}

impl ManifestLoader {
    pub fn new(manifest: &Manifest) -> Self {
        Self {
            modules: manifest.modules.clone(),
            root: None,
            cache: FxMap::default(),
        }
    }

    /// Also look for `<root>/<id>.json` files.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    fn read_from_root(&mut self, id: &str) -> Result<ModuleSource, LoadError> {
        let Some(root) = &self.root else {
            return Err(LoadError::NotFound { id: id.to_string() });
        };
        let path = root.join(format!("{id}.json"));
        if !path.is_file() {
            return Err(LoadError::NotFound { id: id.to_string() });
        }
        let content = std::fs::read_to_string(&path).map_err(|err| LoadError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let source: ModuleSource = serde_json::from_str(&content).map_err(|err| LoadError::Malformed {
            id: id.to_string(),
            message: err.to_string(),
        })?;
        trace!(id, path = %path.display(), "module source read");
        self.cache.insert(id.to_string(), source.clone());
        Ok(source)
    }
}

impl ModuleLoader for ManifestLoader {
    fn load_module(&mut self, id: &str) -> Result<ModuleSource, LoadError> {
        if let Some(source) = self.modules.get(id).or_else(|| self.cache.get(id)) {
            return Ok(source.clone());
        }
        self.read_from_root(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esmlink_options::BindingSemantics;

    #[test]
    fn test_memory_loader() {
        let mut loader = MemoryLoader::new().with_module("a", ModuleSource::default());
        assert!(loader.load_module("a").is_ok());
        assert_eq!(
            loader.load_module("b"),
            Err(LoadError::NotFound { id: "b".to_string() })
        );
    }

    #[test]
    fn test_default_specifier_resolution() {
        let loader = MemoryLoader::new();
        assert_eq!(
            loader.resolve_specifier("chapter7/index", "./chapter7_1_1.js").as_deref(),
            Some("chapter7/chapter7_1_1")
        );
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(
            r#"{
                "linkerOptions": { "bindingSemantics": "live" },
                "modules": {
                    "main": { "imports": [{ "from": "./dep.js", "names": ["x"] }] },
                    "dep": { "declarations": [{ "name": "x", "value": 1 }] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.linker_options.binding_semantics(), BindingSemantics::Live);
        assert_eq!(manifest.entry(), Some("main"));
        assert_eq!(manifest.modules.len(), 2);

        let mut loader = ManifestLoader::new(&manifest);
        assert!(loader.load_module("dep").is_ok());
        assert!(matches!(loader.load_module("other"), Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_manifest_explicit_entry() {
        let manifest = parse_manifest(r#"{ "entry": "b", "modules": { "a": {}, "b": {} } }"#).unwrap();
        assert_eq!(manifest.entry(), Some("b"));
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(parse_manifest(r#"{ "modules": [] }"#).is_err());
    }
}
