//! esmlink_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Diagnostics carry structured information about linking failures. Codes
//! reuse TypeScript's numbering where TypeScript reports the same condition,
//! so output reads like `tsc` output to anyone used to it.

use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Suggestion => write!(f, "suggestion"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic error code (e.g., 2305, 1362).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The module where this diagnostic occurred, if any.
    pub module: Option<String>,
    /// The offending binding or export name, if any.
    pub name: Option<String>,
    /// The formatted message.
    pub message_text: String,
    /// The diagnostic error code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
    /// Related diagnostics.
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a new diagnostic without location info (global diagnostic).
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            module: None,
            name: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Create a new diagnostic attached to a module and, optionally, a name in it.
    pub fn with_location(
        module: String,
        name: Option<String>,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            module: Some(module),
            name,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Add related diagnostic information.
    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref module) = self.module {
            write!(f, "{}", module)?;
            if let Some(ref name) = self.name {
                write!(f, "({})", name)?;
            }
            write!(f, ": ")?;
        }
        write!(
            f,
            "{} TS{}: {}",
            self.category, self.code, self.message_text
        )
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated while loading and linking.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by module, then by code.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.module
                .cmp(&b.module)
                .then_with(|| a.code.cmp(&b.code))
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // ========================================================================
    // Declaration and export registration
    // ========================================================================
    pub const DUPLICATE_IDENTIFIER_0: DiagnosticMessage = diag!(2300, Error, "Duplicate identifier '{0}'.");
    pub const MODULE_0_HAS_ALREADY_EXPORTED_A_MEMBER_NAMED_1: DiagnosticMessage = diag!(2308, Error, "Module '{0}' has already exported a member named '{1}'.");
    pub const CANNOT_FIND_NAME_0: DiagnosticMessage = diag!(2304, Error, "Cannot find name '{0}'.");
    pub const _0_IS_NOT_A_VALID_IDENTIFIER: DiagnosticMessage = diag!(1003, Error, "'{0}' is not a valid identifier.");

    // ========================================================================
    // Re-export resolution
    // ========================================================================
    pub const CIRCULAR_DEFINITION_OF_EXPORT_0_IN_MODULE_1: DiagnosticMessage = diag!(2303, Error, "Circular definition of export '{0}' in module '{1}'.");
    pub const MODULE_0_HAS_NO_EXPORTED_MEMBER_1: DiagnosticMessage = diag!(2305, Error, "Module '{0}' has no exported member '{1}'.");

    // ========================================================================
    // Import resolution
    // ========================================================================
    pub const _0_CANNOT_BE_USED_AS_A_VALUE_BECAUSE_IT_WAS_EXPORTED_USING_EXPORT_TYPE: DiagnosticMessage = diag!(1362, Error, "'{0}' cannot be used as a value because it was exported using 'export type'.");
    pub const MODULE_0_HAS_NO_DEFAULT_EXPORT: DiagnosticMessage = diag!(1192, Error, "Module '{0}' has no default export.");
    pub const CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_AN_IMPORT: DiagnosticMessage = diag!(2632, Error, "Cannot assign to '{0}' because it is an import.");
    pub const CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_A_CONSTANT: DiagnosticMessage = diag!(2588, Error, "Cannot assign to '{0}' because it is a constant.");
    pub const CANNOT_FIND_MODULE_0: DiagnosticMessage = diag!(2307, Error, "Cannot find module '{0}' or its corresponding type declarations.");
    pub const FILE_0_IS_NOT_A_MODULE: DiagnosticMessage = diag!(2306, Error, "File '{0}' is not a module.");
    pub const CANNOT_READ_FILE_0_1: DiagnosticMessage = diag!(5012, Error, "Cannot read file '{0}': {1}.");
    pub const SCRIPT_0_CANNOT_CONTAIN_IMPORTS_OR_EXPORTS: DiagnosticMessage = diag!(1208, Error, "'{0}' is declared as a script and cannot contain import or export statements.");

    // ========================================================================
    // Informational
    // ========================================================================
    pub const _0_WAS_EXPORTED_HERE: DiagnosticMessage = diag!(1377, Message, "'{0}' was exported here.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let text = format_message(messages::MODULE_0_HAS_NO_EXPORTED_MEMBER_1.message, &["chapter7/chapter7_1_1", "privateData"]);
        assert_eq!(text, "Module 'chapter7/chapter7_1_1' has no exported member 'privateData'.");
    }

    #[test]
    fn test_display_with_location() {
        let diag = Diagnostic::with_location(
            "chapter7/index".to_string(),
            Some("language".to_string()),
            &messages::CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_AN_IMPORT,
            &["language"],
        );
        assert_eq!(
            diag.to_string(),
            "chapter7/index(language): error TS2632: Cannot assign to 'language' because it is an import."
        );
    }

    #[test]
    fn test_collection_counts_and_sorts() {
        let mut diags = DiagnosticCollection::new();
        diags.add(Diagnostic::with_location("b".to_string(), None, &messages::CANNOT_FIND_NAME_0, &["x"]));
        diags.add(Diagnostic::with_location("a".to_string(), None, &messages::_0_WAS_EXPORTED_HERE, &["x"]));
        diags.add(Diagnostic::with_location("a".to_string(), None, &messages::DUPLICATE_IDENTIFIER_0, &["x"]));
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.error_count(), 2);
        diags.sort();
        let codes: Vec<u32> = diags.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![1377, 2300, 2304]);
    }
}
