//! esmlink_options: Linker options.
//!
//! Parsed from the `linkerOptions` object of a project manifest, or from a
//! standalone JSON file with the same shape.

use serde::{Deserialize, Serialize};

/// What an importer observes when the owning module rebinds an exported
/// binding after the import was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingSemantics {
    /// The importer keeps the value captured when its import was resolved.
    #[default]
    Snapshot,
    /// The importer reads through to the owner's current value.
    Live,
}

/// How a compilation unit scopes its top-level declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopingMode {
    /// Declarations are private to the unit unless exported.
    #[default]
    Module,
    /// Declarations land in the shared global scope; the unit may not import
    /// or export anything.
    Script,
}

/// Linker options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerOptions {
    pub binding_semantics: Option<BindingSemantics>,
    /// Scoping assumed for units that do not declare one.
    pub default_scoping: Option<ScopingMode>,
    /// Whether namespace views list type-only members.
    pub allow_type_only_namespace_members: Option<bool>,
}

impl LinkerOptions {
    pub fn binding_semantics(&self) -> BindingSemantics {
        self.binding_semantics.unwrap_or_default()
    }

    pub fn default_scoping(&self) -> ScopingMode {
        self.default_scoping.unwrap_or_default()
    }

    pub fn allow_type_only_namespace_members(&self) -> bool {
        self.allow_type_only_namespace_members.unwrap_or(true)
    }
}

/// Parse linker options from a JSON string.
pub fn parse_linker_options(content: &str) -> Result<LinkerOptions, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse linker options from a file path.
pub fn parse_linker_options_file(path: &str) -> Result<LinkerOptions, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let options = parse_linker_options(&content)?;
    Ok(options)
}
