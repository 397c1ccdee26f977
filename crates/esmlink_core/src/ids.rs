//! Id newtypes shared across the workspace.

use crate::intern::Name;

/// Identifies a module by its normalized, interned module id
/// (e.g. `chapter7/chapter7_1_1`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ModuleId(pub Name);

impl ModuleId {
    #[inline]
    pub fn name(self) -> Name {
        self.0
    }
}

impl From<Name> for ModuleId {
    fn from(name: Name) -> Self {
        ModuleId(name)
    }
}

/// Index of a binding in the linker's binding arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindingId(pub u32);

impl BindingId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
