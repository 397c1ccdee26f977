//! Read-only namespace objects (`import * as ns`, `export * as ns`).

use crate::graph::ModuleGraph;
use crate::model::{ExportTable, ExportTarget, ResolvedExport, Visibility};
use esmlink_core::{ModuleId, Name};

/// A projection of one module's export table. Values are read through to
/// the underlying bindings, so a namespace always observes the current
/// value even when plain imports are snapshots.
#[derive(Clone, Copy)]
pub struct NamespaceView<'l> {
    module: ModuleId,
    table: &'l ExportTable,
    graph: &'l ModuleGraph,
    include_type_only: bool,
}

/// One property of a namespace view.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceMember<'l> {
    pub name: Name,
    pub export: &'l ResolvedExport,
    graph: &'l ModuleGraph,
}

impl<'l> NamespaceMember<'l> {
    pub fn target(&self) -> ExportTarget {
        self.export.target
    }

    pub fn is_type_only(&self) -> bool {
        self.export.visibility == Visibility::TypeOnly
    }

    /// Whether the member has a runtime representative.
    pub fn is_value(&self) -> bool {
        if self.is_type_only() {
            return false;
        }
        match self.export.target {
            ExportTarget::Binding(id) => self.graph.binding(id).is_value(),
            ExportTarget::Namespace(_) => true,
        }
    }

    /// The current value of the member's binding. `None` for type-only
    /// members, nested namespaces and uninitialized bindings.
    pub fn value(&self) -> Option<&'l serde_json::Value> {
        match self.export.target {
            ExportTarget::Binding(id) if self.is_value() => self.graph.binding(id).value.as_ref(),
            _ => None,
        }
    }
}

impl<'l> NamespaceView<'l> {
    pub(crate) fn new(
        module: ModuleId,
        table: &'l ExportTable,
        graph: &'l ModuleGraph,
        include_type_only: bool,
    ) -> Self {
        Self { module, table, graph, include_type_only }
    }

    /// The module this namespace reflects.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn get(&self, name: Name) -> Option<NamespaceMember<'l>> {
        let export = self.table.get(name)?;
        self.member(name, export)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.get(name).is_some()
    }

    /// Current value of `name`, read through to the binding.
    pub fn value_of(&self, name: Name) -> Option<&'l serde_json::Value> {
        self.get(name)?.value()
    }

    /// Members in export-table order.
    pub fn members(&self) -> impl Iterator<Item = NamespaceMember<'l>> + '_ {
        self.table
            .iter()
            .filter_map(move |(name, export)| self.member(name, export))
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.members().map(|member| member.name)
    }

    pub fn len(&self) -> usize {
        self.members().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn member(&self, name: Name, export: &'l ResolvedExport) -> Option<NamespaceMember<'l>> {
        if export.visibility == Visibility::TypeOnly && !self.include_type_only {
            return None;
        }
        Some(NamespaceMember { name, export, graph: self.graph })
    }
}

impl std::fmt::Debug for NamespaceView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceView")
            .field("module", &self.module)
            .field("members", &self.len())
            .finish()
    }
}
