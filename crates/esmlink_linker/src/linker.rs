//! The module linker.
//!
//! Resolves every module's flat export table by walking re-export and
//! import edges depth first, and binds import requests against the
//! resolved tables.
//!
//! Each module moves through `Unlinked -> Resolving -> Linked`. A module
//! that is re-entered while it is still `Resolving` closes a re-export
//! cycle: every module on the cycle becomes `CycleDetected`, and every
//! module below it on the resolution stack becomes `Failed` with the same
//! originating error.

use crate::error::LinkError;
use crate::graph::{ModuleGraph, ModuleRecord};
use crate::model::{
    ExportEntry, ExportTable, ExportTarget, ImportClause, ImportKind, ImportRequest,
    ImportedBinding, Meaning, Mutability, ReExportEntry, ReExportKind, ResolvedExport, Visibility,
};
use crate::namespace::NamespaceView;
use esmlink_core::ident::{is_binding_identifier, is_identifier_name};
use esmlink_core::{BindingId, FxMap, ModuleId, Name, NameInterner};
use esmlink_options::{BindingSemantics, LinkerOptions, ScopingMode};
use indexmap::IndexMap;
use tracing::{debug, debug_span, trace};

/// Link state of a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unlinked,
    Resolving,
    Linked,
    CycleDetected,
    Failed,
}

/// A module on the resolution stack.
struct Visit {
    module: ModuleId,
    /// Sources still to be linked, with the export name each is needed for.
    pending: std::vec::IntoIter<(ModuleId, String)>,
    /// The export name of the source this module is waiting on.
    via: String,
}

pub struct Linker {
    interner: NameInterner,
    options: LinkerOptions,
    graph: ModuleGraph,
    states: FxMap<ModuleId, ModuleState>,
    tables: FxMap<ModuleId, ExportTable>,
    failures: FxMap<ModuleId, LinkError>,
    /// Modules whose tables are currently being resolved, outermost first.
    stack: Vec<Visit>,
    /// Import aliases bound in each consumer module.
    scopes: FxMap<ModuleId, IndexMap<Name, ImportedBinding>>,
}

impl Linker {
    pub fn new(interner: NameInterner, options: LinkerOptions) -> Self {
        Self {
            interner,
            options,
            graph: ModuleGraph::new(),
            states: FxMap::default(),
            tables: FxMap::default(),
            failures: FxMap::default(),
            stack: Vec::new(),
            scopes: FxMap::default(),
        }
    }

    pub fn interner(&self) -> &NameInterner {
        &self.interner
    }

    pub fn options(&self) -> &LinkerOptions {
        &self.options
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn state_of(&self, module: ModuleId) -> ModuleState {
        self.states
            .get(&module)
            .copied()
            .unwrap_or(ModuleState::Unlinked)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add a compilation unit. Re-adding a known id is a no-op.
    pub fn add_module(&mut self, module: ModuleId, scoping: ScopingMode) {
        if !self.graph.contains(module) {
            self.reset_link_state();
            self.graph.add_module(module, scoping);
        }
    }

    /// Declare a binding owned by `module`.
    pub fn declare(
        &mut self,
        module: ModuleId,
        name: Name,
        meaning: Meaning,
        mutability: Mutability,
        value: Option<serde_json::Value>,
    ) -> Result<BindingId, LinkError> {
        if !is_binding_identifier(self.interner.resolve(name)) {
            return Err(self.invalid_identifier(module, name));
        }
        let record = self.record(module)?;
        let is_script = record.is_script();
        if record.declares(name) || (is_script && self.graph.global(name).is_some()) {
            return Err(LinkError::DuplicateLocalBinding {
                module: self.module_text(module),
                name: self.text(name),
            });
        }

        self.reset_link_state();
        let value = if meaning.contains(Meaning::VALUE) { value } else { None };
        let id = self.graph.alloc_binding(name, meaning, mutability, module, value);
        if let Some(record) = self.graph.get_mut(module) {
            record.locals.insert(name, id);
        }
        if is_script {
            self.graph.globals_mut().insert(name, id);
        }
        Ok(id)
    }

    /// Record an import statement of `module`. Local aliases must not clash
    /// with each other or with local declarations.
    pub fn register_import(&mut self, module: ModuleId, request: ImportRequest) -> Result<(), LinkError> {
        let record = self.record(module)?;
        if record.is_script() {
            return Err(self.linkage_in_script(module));
        }
        let mut seen: Vec<Name> = Vec::with_capacity(request.clauses.len());
        for clause in &request.clauses {
            let local = clause.local();
            if !is_binding_identifier(self.interner.resolve(local)) {
                return Err(self.invalid_identifier(module, local));
            }
            if let ImportClause::Named { imported, .. } = clause {
                if !is_identifier_name(self.interner.resolve(*imported)) {
                    return Err(self.invalid_identifier(module, *imported));
                }
            }
            if record.declares(local) || seen.contains(&local) {
                return Err(LinkError::DuplicateLocalBinding {
                    module: self.module_text(module),
                    name: self.text(local),
                });
            }
            seen.push(local);
        }

        self.reset_link_state();
        if let Some(record) = self.graph.get_mut(module) {
            record.push_import(request);
        }
        Ok(())
    }

    /// Record `export { local as exported }` for `module`.
    pub fn register_export(&mut self, module: ModuleId, entry: ExportEntry) -> Result<(), LinkError> {
        let record = self.record(module)?;
        if record.is_script() {
            return Err(self.linkage_in_script(module));
        }
        if !is_identifier_name(self.interner.resolve(entry.exported)) {
            return Err(self.invalid_identifier(module, entry.exported));
        }
        if !record.declares(entry.local) {
            return Err(LinkError::UnknownLocalBinding {
                module: self.module_text(module),
                name: self.text(entry.local),
            });
        }
        if record.claims_export_name(entry.exported) {
            return Err(self.duplicate_export(module, entry.exported));
        }

        self.reset_link_state();
        if let Some(record) = self.graph.get_mut(module) {
            record.exports.push(entry);
        }
        Ok(())
    }

    /// Record a re-export statement for `module`. Names it introduces
    /// explicitly are checked for collisions now; names arriving through
    /// `export *` are checked when the table is resolved.
    pub fn register_re_export(&mut self, module: ModuleId, entry: ReExportEntry) -> Result<(), LinkError> {
        let record = self.record(module)?;
        if record.is_script() {
            return Err(self.linkage_in_script(module));
        }
        let declared = entry.declared_names();
        for (i, exported) in declared.iter().enumerate() {
            if !is_identifier_name(self.interner.resolve(*exported)) {
                return Err(self.invalid_identifier(module, *exported));
            }
            if record.claims_export_name(*exported) || declared[..i].contains(exported) {
                return Err(self.duplicate_export(module, *exported));
            }
        }

        self.reset_link_state();
        if let Some(record) = self.graph.get_mut(module) {
            record.push_re_export(entry);
        }
        Ok(())
    }

    // ========================================================================
    // Export table resolution
    // ========================================================================

    /// Resolve (or fetch the cached) export table of `module`.
    pub fn resolve_exports(&mut self, module: ModuleId) -> Result<&ExportTable, LinkError> {
        self.ensure_linked(module, "*")?;
        self.tables
            .get(&module)
            .ok_or_else(|| self.module_not_found(module, module))
    }

    /// Resolve the export tables of every module in the graph. Stops at the
    /// first failure.
    pub fn link_all(&mut self) -> Result<(), LinkError> {
        let modules: Vec<ModuleId> = self.graph.module_ids().collect();
        for module in modules {
            self.ensure_linked(module, "*")?;
        }
        Ok(())
    }

    /// The resolved export table of `module`, available once it is `Linked`.
    pub fn export_table_of(&self, module: ModuleId) -> Option<&ExportTable> {
        match self.state_of(module) {
            ModuleState::Linked => self.tables.get(&module),
            _ => None,
        }
    }

    /// A read-only namespace view over the export table of `module`.
    pub fn namespace_of(&self, module: ModuleId) -> Option<NamespaceView<'_>> {
        let table = self.export_table_of(module)?;
        Some(NamespaceView::new(
            module,
            table,
            &self.graph,
            self.options.allow_type_only_namespace_members(),
        ))
    }

    /// Link `module` and every table it depends on. `via` names the export
    /// whose resolution led here; it labels the error if this call closes a
    /// cycle.
    ///
    /// Dependencies are walked with an explicit stack of [`Visit`]s, so
    /// long re-export chains cost heap rather than call depth.
    fn ensure_linked(&mut self, module: ModuleId, via: &str) -> Result<(), LinkError> {
        match self.state_of(module) {
            ModuleState::Linked => {
                trace!(module = %self.interner.display(module.name()), "export table cached");
                return Ok(());
            }
            ModuleState::Unlinked => {}
            _ => return Err(self.settled_error(module, via)),
        }

        let base = self.stack.len();
        if let Err(err) = self.enter(module) {
            return Err(self.unwind(base, err));
        }
        while self.stack.len() > base {
            let next = match self.stack.last_mut() {
                Some(visit) => visit.pending.next().map(|(source, needed)| {
                    visit.via = needed.clone();
                    (source, needed)
                }),
                None => break,
            };
            let step = match next {
                None => self.finish(),
                Some((source, needed)) => match self.state_of(source) {
                    ModuleState::Linked => Ok(()),
                    ModuleState::Unlinked => self.enter(source),
                    _ => Err(self.settled_error(source, &needed)),
                },
            };
            if let Err(err) = step {
                return Err(self.unwind(base, err));
            }
        }
        Ok(())
    }

    /// Push `module` onto the resolution stack.
    fn enter(&mut self, module: ModuleId) -> Result<(), LinkError> {
        let pending = self.dependencies(module)?;
        trace!(
            module = %self.interner.display(module.name()),
            dependencies = pending.len(),
            "resolving exports"
        );
        self.states.insert(module, ModuleState::Resolving);
        self.stack.push(Visit {
            module,
            pending: pending.into_iter(),
            via: "*".to_string(),
        });
        Ok(())
    }

    /// Build the table of the module on top of the stack, whose
    /// dependencies are all linked by now.
    fn finish(&mut self) -> Result<(), LinkError> {
        let Some(module) = self.stack.last().map(|visit| visit.module) else {
            return Ok(());
        };
        let record = self.record(module)?;
        let exports = record.exports.clone();
        let re_exports = record.re_exports.clone();

        let span = debug_span!("resolve_exports", module = %self.interner.display(module.name()));
        let _enter = span.enter();

        let table = self.build_table(module, &exports, &re_exports)?;
        debug!(exports = table.len(), "linked");
        self.stack.pop();
        self.states.insert(module, ModuleState::Linked);
        self.tables.insert(module, table);
        Ok(())
    }

    /// Pop every visit above `base`. Modules not already part of a cycle
    /// fail with `err`.
    fn unwind(&mut self, base: usize, err: LinkError) -> LinkError {
        let unwound = self.stack.split_off(base.min(self.stack.len()));
        for visit in unwound.into_iter().rev() {
            if self.state_of(visit.module) != ModuleState::CycleDetected {
                debug!(
                    module = %self.interner.display(visit.module.name()),
                    error = %err,
                    "link failed"
                );
                self.states.insert(visit.module, ModuleState::Failed);
                self.failures.insert(visit.module, err.clone());
            }
        }
        err
    }

    /// The error for reaching `module` while it is resolving or after it
    /// has already failed.
    fn settled_error(&mut self, module: ModuleId, via: &str) -> LinkError {
        match self.state_of(module) {
            ModuleState::Resolving => self.cycle_error(module, via),
            _ => match self.failures.get(&module) {
                Some(err) => err.clone(),
                None => self.cycle_error(module, via),
            },
        }
    }

    /// The tables `module` must wait for, in the order `build_table`
    /// consults them, each paired with the export name it is needed for.
    /// Collection stops at the first source `build_table` will reject.
    fn dependencies(&self, module: ModuleId) -> Result<Vec<(ModuleId, String)>, LinkError> {
        let record = self.record(module)?;
        let mut pending = Vec::new();

        for entry in &record.exports {
            if record.local(entry.local).is_some() {
                continue;
            }
            if let Some((request, clause)) = record.import_clause(entry.local) {
                let requested = match *clause {
                    ImportClause::Named { imported, .. } => imported,
                    ImportClause::Default { .. } => self.interner.default_name(),
                    ImportClause::Namespace { .. } => continue,
                };
                pending.push((request.source, self.text(requested)));
            }
        }
        for entry in &record.re_exports {
            match &entry.kind {
                ReExportKind::Named(pairs) if pairs.is_empty() => {
                    pending.push((entry.source, "*".to_string()));
                }
                ReExportKind::Named(pairs) => {
                    pending.extend(pairs.iter().map(|(name, _)| (entry.source, self.text(*name))));
                }
                ReExportKind::Star => pending.push((entry.source, "*".to_string())),
                ReExportKind::Namespace(_) => {}
            }
        }

        if let Some(rejected) = pending
            .iter()
            .position(|(source, _)| self.check_source(module, *source).is_err())
        {
            pending.truncate(rejected);
        }
        Ok(pending)
    }

    fn build_table(
        &mut self,
        module: ModuleId,
        exports: &[ExportEntry],
        re_exports: &[ReExportEntry],
    ) -> Result<ExportTable, LinkError> {
        let mut table = ExportTable::new();

        for entry in exports {
            let resolved = self.resolve_local_export(module, entry.local)?;
            let export = ResolvedExport {
                target: resolved.target,
                visibility: resolved.visibility.downgrade(entry.type_only),
            };
            self.insert_export(module, &mut table, entry.exported, export)?;
        }

        for entry in re_exports {
            self.check_source(module, entry.source)?;
            match &entry.kind {
                ReExportKind::Named(pairs) => {
                    self.ensure_linked(entry.source, "*")?;
                    for &(source_name, exported) in pairs {
                        let found = self.lookup(entry.source, source_name).ok_or_else(|| {
                            LinkError::UnresolvedExport {
                                module: self.module_text(module),
                                target: self.module_text(entry.source),
                                name: self.text(source_name),
                            }
                        })?;
                        let export = ResolvedExport {
                            target: found.target,
                            visibility: found.visibility.downgrade(entry.type_only),
                        };
                        self.insert_export(module, &mut table, exported, export)?;
                    }
                }
                ReExportKind::Star => {
                    self.ensure_linked(entry.source, "*")?;
                    let default_name = self.interner.default_name();
                    let forwarded: Vec<(Name, ResolvedExport)> = self
                        .tables
                        .get(&entry.source)
                        .map(|source| {
                            source
                                .iter()
                                .filter(|(name, _)| *name != default_name)
                                .map(|(name, export)| (name, *export))
                                .collect()
                        })
                        .unwrap_or_default();
                    for (name, found) in forwarded {
                        let export = ResolvedExport {
                            target: found.target,
                            visibility: found.visibility.downgrade(entry.type_only),
                        };
                        self.insert_export(module, &mut table, name, export)?;
                    }
                }
                ReExportKind::Namespace(alias) => {
                    let export = ResolvedExport {
                        target: ExportTarget::Namespace(entry.source),
                        visibility: Visibility::from_type_only(entry.type_only),
                    };
                    self.insert_export(module, &mut table, *alias, export)?;
                }
            }
        }

        Ok(table)
    }

    /// What exporting `local` from `module` refers to: its own binding, or
    /// whatever the import that introduced `local` resolves to.
    fn resolve_local_export(&mut self, module: ModuleId, local: Name) -> Result<ResolvedExport, LinkError> {
        let record = self.record(module)?;
        if let Some(id) = record.local(local) {
            return Ok(ResolvedExport {
                target: ExportTarget::Binding(id),
                visibility: Visibility::Value,
            });
        }
        if let Some((request, clause)) = record.import_clause(local) {
            let (source, clause) = (request.source, *clause);
            return self.resolve_clause(module, source, clause);
        }
        Err(LinkError::UnknownLocalBinding {
            module: self.module_text(module),
            name: self.text(local),
        })
    }

    fn insert_export(
        &self,
        module: ModuleId,
        table: &mut ExportTable,
        name: Name,
        export: ResolvedExport,
    ) -> Result<(), LinkError> {
        table
            .insert(name, export)
            .map_err(|_| self.duplicate_export(module, name))
    }

    fn lookup(&self, module: ModuleId, name: Name) -> Option<ResolvedExport> {
        self.tables.get(&module).and_then(|table| table.get(name)).copied()
    }

    // ========================================================================
    // Import resolution
    // ========================================================================

    /// Resolve one clause of an import from `source` on behalf of `consumer`.
    fn resolve_clause(
        &mut self,
        consumer: ModuleId,
        source: ModuleId,
        clause: ImportClause,
    ) -> Result<ResolvedExport, LinkError> {
        self.check_source(consumer, source)?;
        let (requested, kind) = match clause {
            ImportClause::Namespace { .. } => {
                return Ok(ResolvedExport {
                    target: ExportTarget::Namespace(source),
                    visibility: Visibility::Value,
                });
            }
            ImportClause::Named { imported, kind, .. } => (imported, kind),
            ImportClause::Default { kind, .. } => (self.interner.default_name(), kind),
        };

        let via = self.text(requested);
        self.ensure_linked(source, &via)?;
        let found = match self.lookup(source, requested) {
            Some(found) => found,
            None if self.interner.is_default(requested) => {
                return Err(LinkError::NoDefaultExport {
                    module: self.module_text(consumer),
                    target: self.module_text(source),
                });
            }
            None => {
                return Err(LinkError::UnresolvedExport {
                    module: self.module_text(consumer),
                    target: self.module_text(source),
                    name: via,
                });
            }
        };

        match kind {
            ImportKind::Value if found.visibility == Visibility::TypeOnly => {
                Err(LinkError::TypeOnlyValueAccess {
                    module: self.module_text(consumer),
                    target: self.module_text(source),
                    name: via,
                })
            }
            ImportKind::Value => Ok(found),
            ImportKind::Type => Ok(ResolvedExport {
                target: found.target,
                visibility: Visibility::TypeOnly,
            }),
        }
    }

    /// Resolve `request` and bind its local aliases in `consumer`.
    pub fn resolve_import(
        &mut self,
        consumer: ModuleId,
        request: &ImportRequest,
    ) -> Result<Vec<ImportedBinding>, LinkError> {
        let record = self.record(consumer)?;
        if record.is_script() {
            return Err(self.linkage_in_script(consumer));
        }

        let mut bound = Vec::with_capacity(request.clauses.len());
        for clause in &request.clauses {
            let local = clause.local();
            let resolved = self.resolve_clause(consumer, request.source, *clause)?;
            let kind = match *clause {
                ImportClause::Named { kind, .. } | ImportClause::Default { kind, .. } => kind,
                ImportClause::Namespace { .. } => ImportKind::Value,
            };
            if let ExportTarget::Namespace(namespace) = resolved.target {
                self.ensure_linked(namespace, "*")?;
            }

            let snapshot = match resolved.target {
                ExportTarget::Binding(id)
                    if kind == ImportKind::Value && resolved.visibility == Visibility::Value =>
                {
                    self.graph.binding(id).value.clone()
                }
                _ => None,
            };
            let imported = ImportedBinding {
                local,
                source: request.source,
                target: resolved.target,
                visibility: resolved.visibility,
                kind,
                snapshot,
            };

            let clashes_with_local = self
                .graph
                .get(consumer)
                .is_some_and(|record| record.local(local).is_some());
            let clashes_with_import = self
                .scopes
                .get(&consumer)
                .and_then(|scope| scope.get(&local))
                .is_some_and(|existing| existing.target != imported.target);
            if clashes_with_local || clashes_with_import {
                return Err(LinkError::DuplicateLocalBinding {
                    module: self.module_text(consumer),
                    name: self.text(local),
                });
            }

            trace!(
                consumer = %self.interner.display(consumer.name()),
                local = %self.interner.display(local),
                "import bound"
            );
            self.scopes
                .entry(consumer)
                .or_default()
                .insert(local, imported.clone());
            bound.push(imported);
        }
        Ok(bound)
    }

    /// Resolve every import statement registered for `module`.
    pub fn link_imports(&mut self, module: ModuleId) -> Result<(), LinkError> {
        let requests = self.record(module)?.imports.clone();
        for request in &requests {
            self.resolve_import(module, request)?;
        }
        Ok(())
    }

    /// The import bound under `local` in `module`, once resolved.
    pub fn imported(&self, module: ModuleId, local: Name) -> Option<&ImportedBinding> {
        self.scopes.get(&module).and_then(|scope| scope.get(&local))
    }

    /// What `local` refers to inside `module`: its own binding, a resolved
    /// import, or a script global.
    pub fn origin_of(&self, module: ModuleId, local: Name) -> Option<ExportTarget> {
        if let Some(id) = self.graph.get(module).and_then(|record| record.local(local)) {
            return Some(ExportTarget::Binding(id));
        }
        if let Some(imported) = self.imported(module, local) {
            return Some(imported.target);
        }
        self.graph.global(local).map(ExportTarget::Binding)
    }

    /// The namespace view bound to the import alias `local` in `module`.
    pub fn namespace(&self, module: ModuleId, local: Name) -> Option<NamespaceView<'_>> {
        match self.imported(module, local)?.target {
            ExportTarget::Namespace(source) => self.namespace_of(source),
            ExportTarget::Binding(_) => None,
        }
    }

    // ========================================================================
    // Runtime access
    // ========================================================================

    /// Rebind `local` in `module`. Only the owning module may rebind, and only
    /// bindings declared rebindable.
    pub fn assign(
        &mut self,
        module: ModuleId,
        local: Name,
        value: serde_json::Value,
    ) -> Result<(), LinkError> {
        let record = self.record(module)?;
        let is_import = record.import_clause(local).is_some()
            || self
                .scopes
                .get(&module)
                .is_some_and(|scope| scope.contains_key(&local));
        if is_import {
            return Err(LinkError::ImportedBindingIsReadOnly {
                module: self.module_text(module),
                name: self.text(local),
            });
        }

        let id = match record.local(local) {
            Some(id) if self.graph.binding(id).is_value() => id,
            _ => {
                return Err(LinkError::UnknownLocalBinding {
                    module: self.module_text(module),
                    name: self.text(local),
                });
            }
        };
        if self.graph.binding(id).mutability == Mutability::Constant {
            return Err(LinkError::ConstantAssignment {
                module: self.module_text(module),
                name: self.text(local),
            });
        }

        debug!(
            module = %self.interner.display(module.name()),
            name = %self.interner.display(local),
            "binding reassigned by owner"
        );
        self.graph.binding_mut(id).value = Some(value);
        Ok(())
    }

    /// The value `module` observes under `local`. Imports follow the
    /// configured binding semantics; namespace aliases read as `None`, use
    /// [`Linker::namespace`] for their members.
    pub fn read(&self, module: ModuleId, local: Name) -> Result<Option<serde_json::Value>, LinkError> {
        let record = self.record(module)?;
        if let Some(id) = record.local(local) {
            return Ok(self.graph.binding(id).value.clone());
        }
        if let Some(imported) = self.imported(module, local) {
            if !imported.is_value() {
                return Err(LinkError::TypeOnlyValueAccess {
                    module: self.module_text(module),
                    target: self.module_text(imported.source),
                    name: self.text(local),
                });
            }
            return Ok(match (imported.target, self.options.binding_semantics()) {
                (ExportTarget::Binding(id), BindingSemantics::Live) => self.graph.binding(id).value.clone(),
                (ExportTarget::Binding(_), BindingSemantics::Snapshot) => imported.snapshot.clone(),
                (ExportTarget::Namespace(_), _) => None,
            });
        }
        if let Some(id) = self.graph.global(local) {
            return Ok(self.graph.binding(id).value.clone());
        }
        Err(LinkError::UnknownLocalBinding {
            module: self.module_text(module),
            name: self.text(local),
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Registration changes the graph, so anything linked so far is stale.
    fn reset_link_state(&mut self) {
        if self.states.is_empty() && self.scopes.is_empty() {
            return;
        }
        trace!("graph changed; discarding link results");
        self.states.clear();
        self.tables.clear();
        self.failures.clear();
        self.scopes.clear();
    }

    fn record(&self, module: ModuleId) -> Result<&ModuleRecord, LinkError> {
        let requester = self.stack.last().map_or(module, |visit| visit.module);
        self.graph
            .get(module)
            .ok_or_else(|| self.module_not_found(requester, module))
    }

    fn check_source(&self, consumer: ModuleId, source: ModuleId) -> Result<(), LinkError> {
        match self.graph.get(source) {
            None => Err(self.module_not_found(consumer, source)),
            Some(record) if record.is_script() => Err(LinkError::NotAModule {
                module: self.module_text(consumer),
                target: self.module_text(source),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Mark every module on the stack from `module` upward as part of a
    /// cycle and return the error for `module`. Each member's error names
    /// the export it was resolving when the cycle closed; `via` is the one
    /// the top of the stack was after.
    fn cycle_error(&mut self, module: ModuleId, via: &str) -> LinkError {
        if let Some(top) = self.stack.last_mut() {
            top.via = via.to_string();
        }
        let start = self
            .stack
            .iter()
            .position(|visit| visit.module == module)
            .unwrap_or(self.stack.len());
        let members: Vec<(ModuleId, String)> = self.stack[start..]
            .iter()
            .map(|visit| (visit.module, visit.via.clone()))
            .collect();
        let names: Vec<String> = members.iter().map(|(m, _)| self.module_text(*m)).collect();
        debug!(cycle = %names.join(" -> "), "re-export cycle detected");

        for (i, (member, name)) in members.into_iter().enumerate() {
            let mut cycle: Vec<String> = names[i..].iter().chain(names[..i].iter()).cloned().collect();
            cycle.push(names[i].clone());
            let err = LinkError::CyclicReExport {
                module: names[i].clone(),
                name,
                cycle,
            };
            self.states.insert(member, ModuleState::CycleDetected);
            self.failures.insert(member, err);
        }

        self.failures
            .get(&module)
            .cloned()
            .unwrap_or_else(|| LinkError::CyclicReExport {
                module: self.module_text(module),
                name: via.to_string(),
                cycle: vec![self.module_text(module), self.module_text(module)],
            })
    }

    fn text(&self, name: Name) -> String {
        self.interner.resolve(name).to_string()
    }

    fn module_text(&self, module: ModuleId) -> String {
        self.text(module.name())
    }

    fn module_not_found(&self, requester: ModuleId, module: ModuleId) -> LinkError {
        LinkError::ModuleNotFound {
            module: self.module_text(requester),
            specifier: self.module_text(module),
        }
    }

    fn duplicate_export(&self, module: ModuleId, name: Name) -> LinkError {
        LinkError::DuplicateExport {
            module: self.module_text(module),
            name: self.text(name),
        }
    }

    fn invalid_identifier(&self, module: ModuleId, name: Name) -> LinkError {
        LinkError::InvalidIdentifier {
            module: self.module_text(module),
            name: self.text(name),
        }
    }

    fn linkage_in_script(&self, module: ModuleId) -> LinkError {
        LinkError::LinkageInScript {
            module: self.module_text(module),
        }
    }
}

impl std::fmt::Debug for Linker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linker")
            .field("modules", &self.graph.len())
            .field("linked", &self.tables.len())
            .finish()
    }
}
