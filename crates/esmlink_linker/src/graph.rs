//! The module graph: module records, the binding arena and evaluation order.

use crate::model::{Binding, ExportEntry, ImportClause, ImportRequest, Meaning, Mutability, ReExportEntry};
use esmlink_core::{BindingId, FxHashSet, ModuleId, Name};
use esmlink_options::ScopingMode;
use indexmap::IndexMap;

/// Everything the linker knows about one compilation unit before linking.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub scoping: ScopingMode,
    pub(crate) locals: IndexMap<Name, BindingId>,
    pub(crate) imports: Vec<ImportRequest>,
    pub(crate) exports: Vec<ExportEntry>,
    pub(crate) re_exports: Vec<ReExportEntry>,
    /// Modules this one statically depends on (imports and re-export
    /// sources), in first-mention order.
    requested: Vec<ModuleId>,
}

impl ModuleRecord {
    fn new(id: ModuleId, scoping: ScopingMode) -> Self {
        Self {
            id,
            scoping,
            locals: IndexMap::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            re_exports: Vec::new(),
            requested: Vec::new(),
        }
    }

    pub fn is_script(&self) -> bool {
        self.scoping == ScopingMode::Script
    }

    /// The binding declared under `name` in this module.
    pub fn local(&self, name: Name) -> Option<BindingId> {
        self.locals.get(&name).copied()
    }

    pub fn locals(&self) -> impl Iterator<Item = (Name, BindingId)> + '_ {
        self.locals.iter().map(|(name, id)| (*name, *id))
    }

    pub fn imports(&self) -> &[ImportRequest] {
        &self.imports
    }

    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    pub fn re_exports(&self) -> &[ReExportEntry] {
        &self.re_exports
    }

    pub fn requested_modules(&self) -> &[ModuleId] {
        &self.requested
    }

    /// The import statement and clause that introduce `local`, if any.
    pub fn import_clause(&self, local: Name) -> Option<(&ImportRequest, &ImportClause)> {
        self.imports.iter().find_map(|request| {
            request
                .clauses
                .iter()
                .find(|clause| clause.local() == local)
                .map(|clause| (request, clause))
        })
    }

    /// Whether `name` is taken by a local declaration or an import alias.
    pub fn declares(&self, name: Name) -> bool {
        self.locals.contains_key(&name) || self.import_clause(name).is_some()
    }

    /// Whether an explicit export statement already claims `exported`.
    pub(crate) fn claims_export_name(&self, exported: Name) -> bool {
        self.exports.iter().any(|entry| entry.exported == exported)
            || self
                .re_exports
                .iter()
                .any(|entry| entry.declared_names().contains(&exported))
    }

    fn request(&mut self, dependency: ModuleId) {
        if !self.requested.contains(&dependency) {
            self.requested.push(dependency);
        }
    }

    pub(crate) fn push_import(&mut self, request: ImportRequest) {
        self.request(request.source);
        self.imports.push(request);
    }

    pub(crate) fn push_re_export(&mut self, entry: ReExportEntry) {
        self.request(entry.source);
        self.re_exports.push(entry);
    }
}

/// All modules plus the bindings they declare.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: IndexMap<ModuleId, ModuleRecord>,
    bindings: Vec<Binding>,
    /// Declarations of script units, shared by every unit.
    globals: IndexMap<Name, BindingId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Adding an id that is already present leaves the
    /// existing record untouched and returns it.
    pub fn add_module(&mut self, id: ModuleId, scoping: ScopingMode) -> &mut ModuleRecord {
        self.modules
            .entry(id)
            .or_insert_with(|| ModuleRecord::new(id, scoping))
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.modules.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ModuleId) -> Option<&mut ModuleRecord> {
        self.modules.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module ids in insertion order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.keys().copied()
    }

    pub(crate) fn alloc_binding(
        &mut self,
        name: Name,
        meaning: Meaning,
        mutability: Mutability,
        owner: ModuleId,
        value: Option<serde_json::Value>,
    ) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding { id, name, meaning, mutability, owner, value });
        id
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.index()]
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn global(&self, name: Name) -> Option<BindingId> {
        self.globals.get(&name).copied()
    }

    pub(crate) fn globals_mut(&mut self) -> &mut IndexMap<Name, BindingId> {
        &mut self.globals
    }

    /// An evaluation order where every module comes after the modules it
    /// statically imports. The iterator is lazy; call again after the graph
    /// changes instead of caching the result.
    pub fn topological_order(&self) -> EvaluationOrder<'_> {
        EvaluationOrder {
            graph: self,
            next_root: 0,
            stack: Vec::new(),
            visited: FxHashSet::default(),
        }
    }
}

/// Depth-first post-order over the graph's static dependencies.
///
/// Modules are roots in insertion order. Inside an import cycle, the module
/// entered first is emitted after the rest of its cycle. Dependencies that
/// are not part of the graph are skipped.
pub struct EvaluationOrder<'g> {
    graph: &'g ModuleGraph,
    next_root: usize,
    stack: Vec<(ModuleId, usize)>,
    visited: FxHashSet<ModuleId>,
}

impl<'g> Iterator for EvaluationOrder<'g> {
    type Item = ModuleId;

    fn next(&mut self) -> Option<ModuleId> {
        loop {
            if let Some(&(module, cursor)) = self.stack.last() {
                let requested = self
                    .graph
                    .get(module)
                    .map(ModuleRecord::requested_modules)
                    .unwrap_or(&[]);
                if let Some(&dependency) = requested.get(cursor) {
                    if let Some(top) = self.stack.last_mut() {
                        top.1 += 1;
                    }
                    if self.graph.contains(dependency) && self.visited.insert(dependency) {
                        self.stack.push((dependency, 0));
                    }
                    continue;
                }
                self.stack.pop();
                return Some(module);
            }

            let root = self.graph.modules.get_index(self.next_root).map(|(id, _)| *id)?;
            self.next_root += 1;
            if self.visited.insert(root) {
                self.stack.push((root, 0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esmlink_core::NameInterner;

    fn module(interner: &NameInterner, name: &str) -> ModuleId {
        ModuleId(interner.intern(name))
    }

    #[test]
    fn test_order_puts_dependencies_first() {
        let interner = NameInterner::new();
        let index = module(&interner, "index");
        let a = module(&interner, "a");
        let b = module(&interner, "b");
        let mut graph = ModuleGraph::new();
        graph.add_module(index, ScopingMode::Module).push_import(ImportRequest::new(a));
        graph.add_module(index, ScopingMode::Module).push_import(ImportRequest::new(b));
        graph.add_module(a, ScopingMode::Module);
        graph.add_module(b, ScopingMode::Module).push_import(ImportRequest::new(a));

        let order: Vec<ModuleId> = graph.topological_order().collect();
        assert_eq!(order, vec![a, b, index]);
    }

    #[test]
    fn test_order_is_restartable() {
        let interner = NameInterner::new();
        let a = module(&interner, "a");
        let b = module(&interner, "b");
        let mut graph = ModuleGraph::new();
        graph.add_module(a, ScopingMode::Module).push_import(ImportRequest::new(b));
        graph.add_module(b, ScopingMode::Module);

        let first: Vec<ModuleId> = graph.topological_order().collect();
        let second: Vec<ModuleId> = graph.topological_order().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![b, a]);
    }

    #[test]
    fn test_order_terminates_on_import_cycle() {
        let interner = NameInterner::new();
        let a = module(&interner, "a");
        let b = module(&interner, "b");
        let mut graph = ModuleGraph::new();
        graph.add_module(a, ScopingMode::Module).push_import(ImportRequest::new(b));
        graph.add_module(b, ScopingMode::Module).push_import(ImportRequest::new(a));

        let order: Vec<ModuleId> = graph.topological_order().collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn test_order_skips_unknown_dependencies() {
        let interner = NameInterner::new();
        let a = module(&interner, "a");
        let missing = module(&interner, "missing");
        let mut graph = ModuleGraph::new();
        graph.add_module(a, ScopingMode::Module).push_import(ImportRequest::new(missing));

        let order: Vec<ModuleId> = graph.topological_order().collect();
        assert_eq!(order, vec![a]);
    }
}
