//! esmlink_core: Core utilities for the esmlink module linker.
//!
//! Provides interned names, the id newtypes shared by every crate in the
//! workspace, and identifier validation.

pub mod ident;
pub mod ids;
pub mod intern;

// Re-export commonly used types
pub use ids::{BindingId, ModuleId};
pub use intern::{DisplayName, Name, NameInterner};

/// A set that uses FxHash for fast hashing, suitable for linker internals
/// where DoS resistance is not needed.
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;

/// Re-export FxHashMap for convenience.
pub type FxMap<K, V> = rustc_hash::FxHashMap<K, V>;
