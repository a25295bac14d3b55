//! # sx Atom System
//!
//! Atoms are the native functions every sx program starts with. Each atom is
//! a `NativeFn`: it receives its arguments already evaluated, plus the
//! evaluation context so higher-order atoms can call back into sx.
//!
//! ## Module Structure
//!
//! - **`helpers`**: argument checks and extraction shared by all atoms
//! - **`math`**: arithmetic (`+`, `-`, `*`, `/`, `mod`)
//! - **`logic`**: comparison and negation (`=`, `<`, `not`, ...)
//! - **`collections`**: lists and maps (`list`, `len`, `map`, `assoc`, ...)
//! - **`string`**: string building (`str`, `upper`, `lower`)
//! - **`execution`**: errors, types and the doctest queue

use im::HashMap;

use crate::runtime::value::{NativeFn, NativeFunction};

// ============================================================================
// REGISTRY
// ============================================================================

/// Registry for all atoms, inspectable at runtime.
#[derive(Debug, Default, Clone)]
pub struct AtomRegistry {
    pub atoms: HashMap<String, NativeFunction>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every standard atom.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        register_all_atoms(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &'static str, func: NativeFn) {
        self.atoms.insert(name.to_string(), NativeFunction { name, func });
    }
}

// ============================================================================
// MODULAR ATOM IMPLEMENTATIONS
// ============================================================================

pub mod helpers;

pub mod collections;
pub mod execution;
pub mod logic;
pub mod math;
pub mod string;

/// Registers all standard atoms from all modules with the given registry.
pub fn register_all_atoms(registry: &mut AtomRegistry) {
    math::register_math_atoms(registry);
    logic::register_logic_atoms(registry);
    collections::register_collection_atoms(registry);
    string::register_string_atoms(registry);
    execution::register_execution_atoms(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_core_atoms() {
        let registry = AtomRegistry::standard();
        for name in ["+", "=", "list", "str", "error", "raise", "enqueue!", "doctest/queue"] {
            assert!(registry.atoms.contains_key(name), "missing atom {name}");
        }
        assert_eq!(registry.atoms.get("+").map(|atom| atom.name), Some("+"));
    }
}
