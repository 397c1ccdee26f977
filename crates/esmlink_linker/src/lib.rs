//! esmlink_linker: Module linking for ES/TS-style import and export
//! statements.
//!
//! Given each module's declarations and its import, export and re-export
//! statements, the linker computes every module's flat export table,
//! binds every import to the binding it ultimately refers to, and rejects
//! ill-formed graphs (duplicate exports, re-export cycles, unresolved names,
//! value use of type-only exports, writes through imports).
//!
//! The entry point for hosts is [`Program`]: load a graph through a
//! [`ModuleLoader`], call [`Program::link`], then read or assign bindings
//! on the resulting [`LinkedProgram`]. [`Linker`] exposes the individual
//! operations for finer-grained use.

pub mod error;
pub mod graph;
pub mod linker;
pub mod loader;
pub mod model;
pub mod namespace;
pub mod program;
pub mod source;

pub use error::LinkError;
pub use graph::{EvaluationOrder, ModuleGraph, ModuleRecord};
pub use linker::{Linker, ModuleState};
pub use loader::{parse_manifest, parse_manifest_file, LoadError, Manifest, ManifestLoader, MemoryLoader, ModuleLoader};
pub use model::{
    Binding, ExportEntry, ExportTable, ExportTarget, ImportClause, ImportKind, ImportRequest,
    ImportedBinding, Meaning, Mutability, ReExportEntry, ReExportKind, ResolvedExport, Visibility,
};
pub use namespace::{NamespaceMember, NamespaceView};
pub use program::{ExportDescription, LinkedProgram, Program};
pub use source::{
    DeclarationKind, DeclarationSpec, ExportSpec, ImportSpec, ModuleSource, NameSpec, ReExportSpec,
    ReExportSpecKind,
};
