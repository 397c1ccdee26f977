//! Binding, export and import definitions.

use esmlink_core::{BindingId, ModuleId, Name};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Which declaration spaces a binding occupies. A class is both a value
    /// and a type; a type alias is only a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Meaning: u8 {
        const VALUE = 1 << 0;
        const TYPE  = 1 << 1;

        const VALUE_AND_TYPE = Self::VALUE.bits() | Self::TYPE.bits();
    }
}

/// Whether the owning module may rebind a binding (`let` vs `const`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    #[default]
    Constant,
    Rebindable,
}

/// A named entity declared in exactly one module.
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: BindingId,
    pub name: Name,
    pub meaning: Meaning,
    pub mutability: Mutability,
    /// The only module allowed to rebind this binding.
    pub owner: ModuleId,
    /// Current value, if the binding has a runtime representative.
    pub value: Option<serde_json::Value>,
}

impl Binding {
    pub fn is_value(&self) -> bool {
        self.meaning.contains(Meaning::VALUE)
    }
}

/// Visibility tag carried by every export table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Usable as a runtime value and as a type.
    Value,
    /// Usable for static checking only (`export type`).
    TypeOnly,
}

impl Visibility {
    pub fn from_type_only(type_only: bool) -> Self {
        if type_only {
            Visibility::TypeOnly
        } else {
            Visibility::Value
        }
    }

    /// Apply a `type`-only forwarding step: value entries become type-only,
    /// type-only entries stay as they are.
    pub fn downgrade(self, type_only: bool) -> Self {
        if type_only {
            Visibility::TypeOnly
        } else {
            self
        }
    }

    /// Combine two visibilities of the same target reaching one export name.
    pub fn merge(self, other: Visibility) -> Self {
        if self == Visibility::Value || other == Visibility::Value {
            Visibility::Value
        } else {
            Visibility::TypeOnly
        }
    }
}

/// What an export name ultimately refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTarget {
    /// A binding, identified by its origin regardless of how many aliases
    /// and re-exports it went through.
    Binding(BindingId),
    /// The namespace aggregate of a module (`export * as ns from`,
    /// `import * as ns from`).
    Namespace(ModuleId),
}

/// A resolved entry in a module's export table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedExport {
    pub target: ExportTarget,
    pub visibility: Visibility,
}

/// A module's flattened export table, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    entries: IndexMap<Name, ResolvedExport>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<&ResolvedExport> {
        self.entries.get(&name)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.entries.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, &ResolvedExport)> {
        self.entries.iter().map(|(name, export)| (*name, export))
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `export` under `name`. Returns the existing entry when `name`
    /// is already bound to a different target; the same target arriving
    /// twice (a diamond) merges its visibility instead.
    pub(crate) fn insert(&mut self, name: Name, export: ResolvedExport) -> Result<(), ResolvedExport> {
        match self.entries.get_mut(&name) {
            Some(existing) if existing.target == export.target => {
                existing.visibility = existing.visibility.merge(export.visibility);
                Ok(())
            }
            Some(existing) => Err(*existing),
            None => {
                self.entries.insert(name, export);
                Ok(())
            }
        }
    }
}

/// `export { local as exported }`, or `export type { ... }` when `type_only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportEntry {
    pub local: Name,
    pub exported: Name,
    pub type_only: bool,
}

impl ExportEntry {
    pub fn new(local: Name, exported: Name) -> Self {
        Self { local, exported, type_only: false }
    }

    pub fn type_only(local: Name, exported: Name) -> Self {
        Self { local, exported, type_only: true }
    }
}

/// Which part of the source table a re-export forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReExportKind {
    /// `export { a, b as c } from 'x'`: `(source name, exported name)` pairs.
    Named(Vec<(Name, Name)>),
    /// `export * from 'x'`: everything except `default`.
    Star,
    /// `export * as ns from 'x'`.
    Namespace(Name),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExportEntry {
    pub source: ModuleId,
    pub kind: ReExportKind,
    pub type_only: bool,
}

impl ReExportEntry {
    pub fn named(source: ModuleId, names: Vec<(Name, Name)>) -> Self {
        Self { source, kind: ReExportKind::Named(names), type_only: false }
    }

    pub fn star(source: ModuleId) -> Self {
        Self { source, kind: ReExportKind::Star, type_only: false }
    }

    pub fn namespace(source: ModuleId, alias: Name) -> Self {
        Self { source, kind: ReExportKind::Namespace(alias), type_only: false }
    }

    pub fn as_type_only(mut self) -> Self {
        self.type_only = true;
        self
    }

    /// Export names this entry introduces without looking at the source table.
    pub(crate) fn declared_names(&self) -> Vec<Name> {
        match &self.kind {
            ReExportKind::Named(pairs) => pairs.iter().map(|(_, exported)| *exported).collect(),
            ReExportKind::Namespace(alias) => vec![*alias],
            ReExportKind::Star => Vec::new(),
        }
    }
}

/// How the consumer intends to use an imported name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Value,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportClause {
    /// `import { imported as local }`
    Named { imported: Name, local: Name, kind: ImportKind },
    /// `import local from`
    Default { local: Name, kind: ImportKind },
    /// `import * as local from`
    Namespace { local: Name },
}

impl ImportClause {
    pub fn local(&self) -> Name {
        match *self {
            ImportClause::Named { local, .. }
            | ImportClause::Default { local, .. }
            | ImportClause::Namespace { local } => local,
        }
    }
}

/// One import statement: a source module plus the clauses pulled from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub source: ModuleId,
    pub clauses: Vec<ImportClause>,
}

impl ImportRequest {
    pub fn new(source: ModuleId) -> Self {
        Self { source, clauses: Vec::new() }
    }

    pub fn named(mut self, imported: Name, local: Name) -> Self {
        self.clauses.push(ImportClause::Named { imported, local, kind: ImportKind::Value });
        self
    }

    pub fn named_type(mut self, imported: Name, local: Name) -> Self {
        self.clauses.push(ImportClause::Named { imported, local, kind: ImportKind::Type });
        self
    }

    pub fn default_as(mut self, local: Name) -> Self {
        self.clauses.push(ImportClause::Default { local, kind: ImportKind::Value });
        self
    }

    pub fn namespace_as(mut self, local: Name) -> Self {
        self.clauses.push(ImportClause::Namespace { local });
        self
    }
}

/// A local alias in a consumer module bound to another module's export.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBinding {
    pub local: Name,
    pub source: ModuleId,
    pub target: ExportTarget,
    pub visibility: Visibility,
    pub kind: ImportKind,
    /// The value observed when the import was resolved. `None` for type-only
    /// imports, namespaces and bindings without a runtime representative.
    pub snapshot: Option<serde_json::Value>,
}

impl ImportedBinding {
    /// Whether the alias can be read as a runtime value.
    pub fn is_value(&self) -> bool {
        self.kind == ImportKind::Value && self.visibility == Visibility::Value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_downgrade() {
        assert_eq!(Visibility::Value.downgrade(true), Visibility::TypeOnly);
        assert_eq!(Visibility::Value.downgrade(false), Visibility::Value);
        assert_eq!(Visibility::TypeOnly.downgrade(true), Visibility::TypeOnly);
        assert_eq!(Visibility::TypeOnly.downgrade(false), Visibility::TypeOnly);
    }

    #[test]
    fn test_visibility_merge_prefers_value() {
        assert_eq!(Visibility::TypeOnly.merge(Visibility::Value), Visibility::Value);
        assert_eq!(Visibility::TypeOnly.merge(Visibility::TypeOnly), Visibility::TypeOnly);
    }

    #[test]
    fn test_meaning_class_is_value_and_type() {
        assert!(Meaning::VALUE_AND_TYPE.contains(Meaning::VALUE));
        assert!(Meaning::VALUE_AND_TYPE.contains(Meaning::TYPE));
        assert!(!Meaning::TYPE.contains(Meaning::VALUE));
    }

    #[test]
    fn test_export_table_insert_rules() {
        let interner = esmlink_core::NameInterner::new();
        let name = interner.intern("x");
        let mut table = ExportTable::new();
        let a = ResolvedExport { target: ExportTarget::Binding(BindingId(0)), visibility: Visibility::TypeOnly };
        let a_value = ResolvedExport { target: ExportTarget::Binding(BindingId(0)), visibility: Visibility::Value };
        let b = ResolvedExport { target: ExportTarget::Binding(BindingId(1)), visibility: Visibility::Value };

        assert!(table.insert(name, a).is_ok());
        assert!(table.insert(name, a_value).is_ok());
        assert_eq!(table.get(name).map(|e| e.visibility), Some(Visibility::Value));
        assert_eq!(table.insert(name, b), Err(a_value));
        assert_eq!(table.len(), 1);
    }
}
