//! Serialized module sources.
//!
//! A `ModuleSource` is the already-parsed linkage surface of one compilation
//! unit: its declarations and its import, export and re-export statements.
//! Specifiers are kept as written (`"./chapter7_1_1.js"`) and resolved
//! against the containing module when the program is loaded.

use crate::model::{Meaning, Mutability};
use esmlink_options::ScopingMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSource {
    /// Falls back to `linkerOptions.defaultScoping` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoping: Option<ScopingMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclarationSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<ExportSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub re_exports: Vec<ReExportSpec>,
}

impl ModuleSource {
    /// Whether the unit contains any import, export or re-export statement.
    pub fn has_linkage(&self) -> bool {
        !self.imports.is_empty() || !self.exports.is_empty() || !self.re_exports.is_empty()
    }
}

/// What sort of entity a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationKind {
    /// `const`, `let`, `function`.
    #[default]
    Value,
    /// `type`, `interface`.
    Type,
    /// `class`: both a value and a type.
    Class,
}

impl DeclarationKind {
    pub fn meaning(self) -> Meaning {
        match self {
            DeclarationKind::Value => Meaning::VALUE,
            DeclarationKind::Type => Meaning::TYPE,
            DeclarationKind::Class => Meaning::VALUE_AND_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSpec {
    pub name: String,
    #[serde(default)]
    pub kind: DeclarationKind,
    #[serde(default)]
    pub mutability: Mutability,
    /// Initial value; ignored for type declarations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// `export { local as exported }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSpec {
    pub local: String,
    /// Defaults to `local`.
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub exported: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub type_only: bool,
}

impl ExportSpec {
    pub fn exported_name(&self) -> &str {
        self.exported.as_deref().unwrap_or(&self.local)
    }
}

/// A name inside braces: `"x"` or `{ "name": "x", "as": "y" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameSpec {
    Plain(String),
    Renamed {
        name: String,
        #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(default, rename = "typeOnly", skip_serializing_if = "std::ops::Not::not")]
        type_only: bool,
    },
}

impl NameSpec {
    pub fn name(&self) -> &str {
        match self {
            NameSpec::Plain(name) | NameSpec::Renamed { name, .. } => name,
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            NameSpec::Plain(name) => name,
            NameSpec::Renamed { name, alias, .. } => alias.as_deref().unwrap_or(name),
        }
    }

    /// Per-name `type` modifier (`import { type T }`).
    pub fn is_type_only(&self) -> bool {
        matches!(self, NameSpec::Renamed { type_only: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReExportSpec {
    pub from: String,
    #[serde(flatten)]
    pub kind: ReExportSpecKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReExportSpecKind {
    /// `export { a, b as c } from`
    Named { names: Vec<NameSpec> },
    /// `export * from`
    Star,
    /// `export * as alias from`
    Namespace { alias: String },
}

/// One import statement. Any combination of a default alias, a namespace
/// alias and named clauses may be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpec {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameSpec>,
    /// `import type ...`: every clause is type-only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub type_only: bool,
}
