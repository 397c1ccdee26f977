//! Program driver: load a module graph from an entry point, link it, and
//! give hosts read/assign access to the linked bindings.

use crate::error::LinkError;
use crate::linker::Linker;
use crate::loader::{LoadError, ModuleLoader};
use crate::model::{
    ExportEntry, ExportTable, ExportTarget, ImportClause, ImportKind, ImportRequest, Meaning,
    ReExportEntry, Visibility,
};
use crate::namespace::NamespaceView;
use crate::source::{ImportSpec, ModuleSource, NameSpec, ReExportSpec, ReExportSpecKind};
use esmlink_core::{ModuleId, Name, NameInterner};
use esmlink_options::{LinkerOptions, ScopingMode};
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, debug_span};

pub struct Program {
    linker: Linker,
    /// Loaded modules by id, in load order.
    loaded: IndexMap<String, ModuleId>,
    entry: Option<ModuleId>,
    /// Set when a module was only partly registered. The graph can no
    /// longer be linked, so every later `load` and `link` reports it.
    poisoned: Option<LinkError>,
}

impl Program {
    pub fn new(options: LinkerOptions) -> Self {
        Self::with_interner(NameInterner::new(), options)
    }

    pub fn with_interner(interner: NameInterner, options: LinkerOptions) -> Self {
        Self {
            linker: Linker::new(interner, options),
            loaded: IndexMap::new(),
            entry: None,
            poisoned: None,
        }
    }

    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    /// Ids of loaded modules, in load order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    /// Load `entry` and everything it statically imports or re-exports.
    /// Modules already loaded by an earlier call are not loaded again.
    pub fn load(&mut self, loader: &mut dyn ModuleLoader, entry: &str) -> Result<ModuleId, LinkError> {
        let span = debug_span!("load", entry);
        let _enter = span.enter();
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }

        let entry_id = self.module_id(entry);
        self.entry.get_or_insert(entry_id);

        let mut queue = VecDeque::from([entry.to_string()]);
        while let Some(id) = queue.pop_front() {
            if self.loaded.contains_key(&id) {
                continue;
            }
            let source = loader.load_module(&id).map_err(|err| match err {
                LoadError::NotFound { id: missing } => LinkError::ModuleNotFound {
                    module: self
                        .requester_of(&missing)
                        .unwrap_or_else(|| missing.clone()),
                    specifier: missing,
                },
                other => LinkError::LoadFailed {
                    module: id.clone(),
                    message: other.to_string(),
                },
            })?;
            let dependencies = match self.add_source(&*loader, &id, &source) {
                Ok(dependencies) => dependencies,
                Err(err) => {
                    debug!(module = %id, error = %err, "module rejected; program poisoned");
                    self.poisoned = Some(err.clone());
                    return Err(err);
                }
            };
            debug!(module = %id, dependencies = dependencies.len(), "module loaded");
            queue.extend(dependencies);
        }
        Ok(entry_id)
    }

    /// Resolve every export table, then bind every import in evaluation
    /// order. Stops at the first error.
    pub fn link(mut self) -> Result<LinkedProgram, LinkError> {
        let span = debug_span!("link", modules = self.loaded.len());
        let _enter = span.enter();
        if let Some(err) = self.poisoned {
            return Err(err);
        }

        self.linker.link_all()?;
        let order: Vec<ModuleId> = self.linker.graph().topological_order().collect();
        for module in &order {
            self.linker.link_imports(*module)?;
        }
        debug!("program linked");

        let entry = self.entry.or_else(|| order.last().copied());
        Ok(LinkedProgram {
            linker: self.linker,
            order,
            entry,
        })
    }

    fn module_id(&self, id: &str) -> ModuleId {
        ModuleId(self.linker.interner().intern(id))
    }

    fn name(&self, text: &str) -> Name {
        self.linker.interner().intern(text)
    }

    /// The first loaded module that requests `id`, for error reporting.
    fn requester_of(&self, id: &str) -> Option<String> {
        let target = self.linker.interner().get(id).map(ModuleId)?;
        self.loaded.iter().find_map(|(name, module)| {
            let record = self.linker.graph().get(*module)?;
            record
                .requested_modules()
                .contains(&target)
                .then(|| name.clone())
        })
    }

    /// Register one module's declarations and statements. Returns the ids
    /// of the modules it depends on.
    fn add_source(
        &mut self,
        loader: &dyn ModuleLoader,
        id: &str,
        source: &ModuleSource,
    ) -> Result<Vec<String>, LinkError> {
        let module = self.module_id(id);
        let scoping = source
            .scoping
            .unwrap_or_else(|| self.linker.options().default_scoping());
        if scoping == ScopingMode::Script && source.has_linkage() {
            return Err(LinkError::LinkageInScript { module: id.to_string() });
        }
        self.linker.add_module(module, scoping);
        self.loaded.insert(id.to_string(), module);

        for declaration in &source.declarations {
            let name = self.name(&declaration.name);
            self.linker.declare(
                module,
                name,
                declaration.kind.meaning(),
                declaration.mutability,
                declaration.value.clone(),
            )?;
        }

        let mut dependencies = Vec::new();
        let mut resolve = |specifier: &str| -> Result<String, LinkError> {
            let target = loader
                .resolve_specifier(id, specifier)
                .ok_or_else(|| LinkError::ModuleNotFound {
                    module: id.to_string(),
                    specifier: specifier.to_string(),
                })?;
            if !dependencies.contains(&target) {
                dependencies.push(target.clone());
            }
            Ok(target)
        };

        let mut imports = Vec::with_capacity(source.imports.len());
        for import in &source.imports {
            imports.push((resolve(&import.from)?, import));
        }
        let mut re_exports = Vec::with_capacity(source.re_exports.len());
        for re_export in &source.re_exports {
            re_exports.push((resolve(&re_export.from)?, re_export));
        }

        for (target, import) in imports {
            let request = self.import_request(self.module_id(&target), import);
            self.linker.register_import(module, request)?;
        }
        for export in &source.exports {
            let local = self.name(&export.local);
            let exported = self.name(export.exported_name());
            let entry = if export.type_only {
                ExportEntry::type_only(local, exported)
            } else {
                ExportEntry::new(local, exported)
            };
            self.linker.register_export(module, entry)?;
        }
        for (target, re_export) in re_exports {
            for entry in self.re_export_entries(self.module_id(&target), re_export) {
                self.linker.register_re_export(module, entry)?;
            }
        }

        Ok(dependencies)
    }

    fn import_request(&self, source: ModuleId, spec: &ImportSpec) -> ImportRequest {
        let statement_kind = if spec.type_only { ImportKind::Type } else { ImportKind::Value };
        let mut request = ImportRequest::new(source);
        if let Some(local) = &spec.default {
            request.clauses.push(ImportClause::Default {
                local: self.name(local),
                kind: statement_kind,
            });
        }
        if let Some(local) = &spec.namespace {
            request.clauses.push(ImportClause::Namespace { local: self.name(local) });
        }
        for name in &spec.names {
            let kind = if name.is_type_only() { ImportKind::Type } else { statement_kind };
            request.clauses.push(ImportClause::Named {
                imported: self.name(name.name()),
                local: self.name(name.alias()),
                kind,
            });
        }
        request
    }

    /// A named re-export mixing `type` and plain names becomes two entries.
    fn re_export_entries(&self, source: ModuleId, spec: &ReExportSpec) -> Vec<ReExportEntry> {
        let entry = match &spec.kind {
            ReExportSpecKind::Star => ReExportEntry::star(source),
            ReExportSpecKind::Namespace { alias } => ReExportEntry::namespace(source, self.name(alias)),
            ReExportSpecKind::Named { names } => {
                let (types, values): (Vec<_>, Vec<_>) =
                    names.iter().partition(|name| name.is_type_only() && !spec.type_only);
                let pairs = |names: Vec<&NameSpec>| -> Vec<(Name, Name)> {
                    names
                        .into_iter()
                        .map(|name| (self.name(name.name()), self.name(name.alias())))
                        .collect()
                };
                let mut entries = Vec::new();
                if !values.is_empty() || types.is_empty() {
                    let entry = ReExportEntry::named(source, pairs(values));
                    entries.push(if spec.type_only { entry.as_type_only() } else { entry });
                }
                if !types.is_empty() {
                    entries.push(ReExportEntry::named(source, pairs(types)).as_type_only());
                }
                return entries;
            }
        };
        vec![if spec.type_only { entry.as_type_only() } else { entry }]
    }
}

/// One row of a module's resolved export table, in display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDescription {
    pub name: String,
    /// `value`, `type`, `class` or `namespace`.
    pub kind: &'static str,
    pub visibility: Visibility,
    /// `module.binding` for bindings, `* as module` for namespaces.
    pub origin: String,
}

/// A fully linked program.
pub struct LinkedProgram {
    linker: Linker,
    order: Vec<ModuleId>,
    entry: Option<ModuleId>,
}

impl LinkedProgram {
    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    pub fn entry(&self) -> Option<ModuleId> {
        self.entry
    }

    /// Modules in the order they would be evaluated.
    pub fn evaluation_order(&self) -> &[ModuleId] {
        &self.order
    }

    pub fn evaluation_order_names(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|module| self.linker.interner().resolve(module.name()))
            .collect()
    }

    pub fn module(&self, id: &str) -> Option<ModuleId> {
        let module = ModuleId(self.linker.interner().get(id)?);
        self.linker.graph().contains(module).then_some(module)
    }

    pub fn export_table(&self, module: &str) -> Option<&ExportTable> {
        self.linker.export_table_of(self.module(module)?)
    }

    pub fn describe_exports(&self, module: &str) -> Option<Vec<ExportDescription>> {
        let table = self.export_table(module)?;
        let interner = self.linker.interner();
        let graph = self.linker.graph();
        let rows = table
            .iter()
            .map(|(name, export)| {
                let (kind, origin) = match export.target {
                    ExportTarget::Binding(id) => {
                        let binding = graph.binding(id);
                        let kind = match (binding.is_value(), binding.meaning.contains(Meaning::TYPE)) {
                            (true, true) => "class",
                            (true, false) => "value",
                            _ => "type",
                        };
                        let origin = format!(
                            "{}.{}",
                            interner.resolve(binding.owner.name()),
                            interner.resolve(binding.name)
                        );
                        (kind, origin)
                    }
                    ExportTarget::Namespace(source) => {
                        ("namespace", format!("* as {}", interner.resolve(source.name())))
                    }
                };
                ExportDescription {
                    name: interner.resolve(name).to_string(),
                    kind,
                    visibility: export.visibility,
                    origin,
                }
            })
            .collect();
        Some(rows)
    }

    /// The value `module` observes under `local`.
    pub fn read(&self, module: &str, local: &str) -> Result<Option<serde_json::Value>, LinkError> {
        let (module, local) = self.resolve_names(module, local);
        self.linker.read(module, local)
    }

    /// Rebind `local` in `module`; only the owner may rebind.
    pub fn assign(&mut self, module: &str, local: &str, value: serde_json::Value) -> Result<(), LinkError> {
        let (module, local) = self.resolve_names(module, local);
        self.linker.assign(module, local, value)
    }

    /// The namespace object bound to `import * as local` in `module`.
    pub fn namespace(&self, module: &str, local: &str) -> Option<NamespaceView<'_>> {
        let module = self.module(module)?;
        let local = self.linker.interner().get(local)?;
        self.linker.namespace(module, local)
    }

    /// Where `local` in `module` ultimately comes from.
    pub fn origin_of(&self, module: &str, local: &str) -> Option<ExportTarget> {
        let module = self.module(module)?;
        let local = self.linker.interner().get(local)?;
        self.linker.origin_of(module, local)
    }

    fn resolve_names(&self, module: &str, local: &str) -> (ModuleId, Name) {
        let interner = self.linker.interner();
        (ModuleId(interner.intern(module)), interner.intern(local))
    }
}

impl std::fmt::Debug for LinkedProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("linker", &self.linker)
            .field("modules", &self.order.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::model::ReExportKind;

    fn source(json: &str) -> ModuleSource {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_load_follows_relative_specifiers() {
        let mut loader = MemoryLoader::new()
            .with_module("app/main", source(r#"{ "imports": [{ "from": "./lib/x.js", "names": ["x"] }] }"#))
            .with_module(
                "app/lib/x",
                source(r#"{ "declarations": [{ "name": "x", "value": 1 }], "exports": [{ "local": "x" }] }"#),
            );
        let mut program = Program::new(LinkerOptions::default());
        program.load(&mut loader, "app/main").unwrap();
        assert_eq!(program.module_names().collect::<Vec<_>>(), vec!["app/main", "app/lib/x"]);

        let linked = program.link().unwrap();
        assert_eq!(linked.evaluation_order_names(), vec!["app/lib/x", "app/main"]);
        assert_eq!(linked.read("app/main", "x").unwrap(), Some(serde_json::json!(1)));
    }

    #[test]
    fn test_missing_dependency_names_requester() {
        let mut loader = MemoryLoader::new()
            .with_module("main", source(r#"{ "imports": [{ "from": "./gone.js", "names": ["x"] }] }"#));
        let mut program = Program::new(LinkerOptions::default());
        let err = program.load(&mut loader, "main").unwrap_err();
        assert_eq!(
            err,
            LinkError::ModuleNotFound { module: "main".to_string(), specifier: "gone".to_string() }
        );
    }

    #[test]
    fn test_script_with_imports_is_rejected() {
        let mut loader = MemoryLoader::new().with_module(
            "legacy",
            source(r#"{ "scoping": "script", "imports": [{ "from": "./a.js", "names": ["x"] }] }"#),
        );
        let mut program = Program::new(LinkerOptions::default());
        let err = program.load(&mut loader, "legacy").unwrap_err();
        assert!(matches!(err, LinkError::LinkageInScript { .. }));
    }

    #[test]
    fn test_mixed_named_re_export_splits_type_names() {
        let mut loader = MemoryLoader::new()
            .with_module(
                "barrel",
                source(r#"{ "reExports": [{ "from": "./m.js", "kind": "named", "names": ["v", { "name": "T", "typeOnly": true }] }] }"#),
            )
            .with_module(
                "m",
                source(
                    r#"{ "declarations": [{ "name": "v", "value": 1 }, { "name": "T", "kind": "type" }],
                         "exports": [{ "local": "v" }, { "local": "T" }] }"#,
                ),
            );
        let mut program = Program::new(LinkerOptions::default());
        program.load(&mut loader, "barrel").unwrap();
        let linked = program.link().unwrap();
        let rows = linked.describe_exports("barrel").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].visibility, Visibility::Value);
        assert_eq!(rows[1].visibility, Visibility::TypeOnly);
        assert_eq!(rows[1].kind, "type");
        assert_eq!(rows[1].origin, "m.T");
    }

    #[test]
    fn test_reexport_kind_is_preserved() {
        let program = Program::new(LinkerOptions::default());
        let spec: ReExportSpec =
            serde_json::from_str(r#"{ "from": "./m.js", "kind": "star", "typeOnly": true }"#).unwrap();
        let entries = program.re_export_entries(ModuleId(program.name("m")), &spec);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ReExportKind::Star);
        assert!(entries[0].type_only);
    }
}
