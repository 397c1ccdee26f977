//! Link errors.
//!
//! Every error is fatal to the linking pass. Each variant names the module
//! where the problem was detected and, where there is one, the offending name.

use esmlink_diagnostics::{messages, Diagnostic, DiagnosticMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("module '{module}' has already exported a member named '{name}'")]
    DuplicateExport { module: String, name: String },

    #[error("'{name}' is not declared or imported in module '{module}'")]
    UnknownLocalBinding { module: String, name: String },

    #[error("circular re-export in module '{module}' ({})", .cycle.join(" -> "))]
    CyclicReExport { module: String, name: String, cycle: Vec<String> },

    #[error("module '{target}' has no exported member '{name}' (requested by '{module}')")]
    UnresolvedExport { module: String, target: String, name: String },

    #[error("'{name}' from '{target}' was exported using 'export type' and cannot be used as a value in '{module}'")]
    TypeOnlyValueAccess { module: String, target: String, name: String },

    #[error("module '{target}' has no default export (requested by '{module}')")]
    NoDefaultExport { module: String, target: String },

    #[error("cannot assign to '{name}' in module '{module}' because it is an import")]
    ImportedBindingIsReadOnly { module: String, name: String },

    #[error("duplicate identifier '{name}' in module '{module}'")]
    DuplicateLocalBinding { module: String, name: String },

    #[error("cannot assign to '{name}' in module '{module}' because it is a constant")]
    ConstantAssignment { module: String, name: String },

    #[error("cannot find module '{specifier}' (imported by '{module}')")]
    ModuleNotFound { module: String, specifier: String },

    #[error("'{target}' is a script and cannot be imported by '{module}'")]
    NotAModule { module: String, target: String },

    #[error("'{module}' is declared as a script and cannot contain import or export statements")]
    LinkageInScript { module: String },

    #[error("'{name}' is not a valid identifier in module '{module}'")]
    InvalidIdentifier { module: String, name: String },

    #[error("cannot read module '{module}': {message}")]
    LoadFailed { module: String, message: String },
}

impl LinkError {
    /// The module where the error was detected.
    pub fn module(&self) -> &str {
        match self {
            LinkError::DuplicateExport { module, .. }
            | LinkError::UnknownLocalBinding { module, .. }
            | LinkError::CyclicReExport { module, .. }
            | LinkError::UnresolvedExport { module, .. }
            | LinkError::TypeOnlyValueAccess { module, .. }
            | LinkError::NoDefaultExport { module, .. }
            | LinkError::ImportedBindingIsReadOnly { module, .. }
            | LinkError::DuplicateLocalBinding { module, .. }
            | LinkError::ConstantAssignment { module, .. }
            | LinkError::ModuleNotFound { module, .. }
            | LinkError::NotAModule { module, .. }
            | LinkError::LinkageInScript { module }
            | LinkError::InvalidIdentifier { module, .. }
            | LinkError::LoadFailed { module, .. } => module.as_str(),
        }
    }

    /// The offending name, if the error is about one.
    pub fn name(&self) -> Option<&str> {
        match self {
            LinkError::DuplicateExport { name, .. }
            | LinkError::UnknownLocalBinding { name, .. }
            | LinkError::CyclicReExport { name, .. }
            | LinkError::UnresolvedExport { name, .. }
            | LinkError::TypeOnlyValueAccess { name, .. }
            | LinkError::ImportedBindingIsReadOnly { name, .. }
            | LinkError::DuplicateLocalBinding { name, .. }
            | LinkError::ConstantAssignment { name, .. }
            | LinkError::InvalidIdentifier { name, .. } => Some(name.as_str()),
            LinkError::NoDefaultExport { .. } => Some("default"),
            LinkError::ModuleNotFound { specifier, .. } => Some(specifier.as_str()),
            LinkError::NotAModule { .. }
            | LinkError::LinkageInScript { .. }
            | LinkError::LoadFailed { .. } => None,
        }
    }

    /// Convert into a diagnostic carrying the TypeScript-style code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let located = |message: &DiagnosticMessage, args: &[&str]| {
            Diagnostic::with_location(
                self.module().to_string(),
                self.name().map(str::to_string),
                message,
                args,
            )
        };
        match self {
            LinkError::DuplicateExport { module, name } => located(
                &messages::MODULE_0_HAS_ALREADY_EXPORTED_A_MEMBER_NAMED_1,
                &[module.as_str(), name.as_str()],
            ),
            LinkError::UnknownLocalBinding { name, .. } => {
                located(&messages::CANNOT_FIND_NAME_0, &[name.as_str()])
            }
            LinkError::CyclicReExport { module, name, .. } => located(
                &messages::CIRCULAR_DEFINITION_OF_EXPORT_0_IN_MODULE_1,
                &[name.as_str(), module.as_str()],
            ),
            LinkError::UnresolvedExport { target, name, .. } => located(
                &messages::MODULE_0_HAS_NO_EXPORTED_MEMBER_1,
                &[target.as_str(), name.as_str()],
            ),
            LinkError::TypeOnlyValueAccess { target, name, .. } => {
                let related = Diagnostic::with_location(
                    target.clone(),
                    Some(name.clone()),
                    &messages::_0_WAS_EXPORTED_HERE,
                    &[name.as_str()],
                );
                located(
                    &messages::_0_CANNOT_BE_USED_AS_A_VALUE_BECAUSE_IT_WAS_EXPORTED_USING_EXPORT_TYPE,
                    &[name.as_str()],
                )
                .with_related(related)
            }
            LinkError::NoDefaultExport { target, .. } => {
                located(&messages::MODULE_0_HAS_NO_DEFAULT_EXPORT, &[target.as_str()])
            }
            LinkError::ImportedBindingIsReadOnly { name, .. } => {
                located(&messages::CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_AN_IMPORT, &[name.as_str()])
            }
            LinkError::DuplicateLocalBinding { name, .. } => {
                located(&messages::DUPLICATE_IDENTIFIER_0, &[name.as_str()])
            }
            LinkError::ConstantAssignment { name, .. } => {
                located(&messages::CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_A_CONSTANT, &[name.as_str()])
            }
            LinkError::ModuleNotFound { specifier, .. } => {
                located(&messages::CANNOT_FIND_MODULE_0, &[specifier.as_str()])
            }
            LinkError::NotAModule { target, .. } => {
                located(&messages::FILE_0_IS_NOT_A_MODULE, &[target.as_str()])
            }
            LinkError::LinkageInScript { module } => {
                located(&messages::SCRIPT_0_CANNOT_CONTAIN_IMPORTS_OR_EXPORTS, &[module.as_str()])
            }
            LinkError::InvalidIdentifier { name, .. } => {
                located(&messages::_0_IS_NOT_A_VALID_IDENTIFIER, &[name.as_str()])
            }
            LinkError::LoadFailed { module, message } => {
                located(&messages::CANNOT_READ_FILE_0_1, &[module.as_str(), message.as_str()])
            }
        }
    }
}
