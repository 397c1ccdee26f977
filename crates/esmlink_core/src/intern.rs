//! Name interning for the linker.
//!
//! Every binding name, export name and module id is interned so that export
//! tables can be keyed and compared by a `u32` handle.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// The reserved export slot used by `export default` and `import x from`.
pub const DEFAULT_EXPORT: &str = "default";

/// An interned name. This is a lightweight handle (u32) that can be used to
/// look up the actual string content through a [`NameInterner`].
///
/// Comparing two `Name` values is an O(1) integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(Spur);

impl Name {
    /// Create from a raw lasso key.
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    /// Get the raw lasso key.
    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Shared name interner.
///
/// Cloning is cheap: clones share the same underlying table, so the loader,
/// the graph and the linker all hand out comparable `Name`s.
#[derive(Clone)]
pub struct NameInterner {
    rodeo: Arc<ThreadedRodeo>,
    default_name: Name,
}

impl NameInterner {
    /// Create a new interner with the reserved `default` name pre-interned.
    pub fn new() -> Self {
        let rodeo = Arc::new(ThreadedRodeo::new());
        let default_name = Name::from_spur(rodeo.get_or_intern_static(DEFAULT_EXPORT));
        Self { rodeo, default_name }
    }

    /// Intern a string, returning a handle to the interned value.
    /// If the string was already interned, returns the existing handle.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        Name::from_spur(self.rodeo.get_or_intern(s))
    }

    /// Look up an already-interned string without interning it if absent.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Name> {
        self.rodeo.get(s).map(Name::from_spur)
    }

    /// Resolve a name handle back to its string content.
    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.as_spur())
    }

    /// The reserved `default` export name.
    #[inline]
    pub fn default_name(&self) -> Name {
        self.default_name
    }

    /// Whether `name` is the reserved `default` export name.
    #[inline]
    pub fn is_default(&self, name: Name) -> bool {
        name == self.default_name
    }

    /// Wrap a name so it can be formatted with `{}`.
    pub fn display(&self, name: Name) -> DisplayName<'_> {
        DisplayName { name, interner: self }
    }

    /// Returns the number of interned names.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns true if no names have been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameInterner")
            .field("len", &self.len())
            .finish()
    }
}

/// Displaying a `Name` requires access to the interner.
/// This wrapper provides a Display impl.
pub struct DisplayName<'a> {
    pub name: Name,
    pub interner: &'a NameInterner,
}

impl<'a> fmt::Display for DisplayName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interner.resolve(self.name))
    }
}
