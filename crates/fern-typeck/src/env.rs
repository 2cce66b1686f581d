//! Type environment with a scope stack.
//!
//! The environment maps names to type schemes. Entering a scope
//! (function body, block, match arm) pushes a frame; leaving pops it.
//! Lookups search from the innermost scope outward. Top-level bindings
//! live in the bottom (global) frame.

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

/// A type environment: a stack of scopes mapping names to type schemes.
pub struct TypeEnv {
    /// The scope stack. Index 0 is the global scope.
    scopes: Vec<FxHashMap<String, Scheme>>,
}

impl TypeEnv {
    /// Create a new environment with one empty global scope.
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Push a new empty scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the top scope.
    ///
    /// # Panics
    ///
    /// Panics if only the global scope remains.
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Insert a binding into the current (topmost) scope.
    pub fn insert(&mut self, name: String, scheme: Scheme) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, scheme);
    }

    /// Look up a name, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        for scope in self.scopes.iter().rev() {
            if let Some(scheme) = scope.get(name) {
                return Some(scheme);
            }
        }
        None
    }

    /// Number of scopes on the stack.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// All currently visible bindings, shadowed names resolved, sorted
    /// by name. Used by the REPL's environment listing.
    pub fn visible_bindings(&self) -> Vec<(&str, &Scheme)> {
        let mut seen = FxHashMap::default();
        for scope in self.scopes.iter().rev() {
            for (name, scheme) in scope {
                seen.entry(name.as_str()).or_insert(scheme);
            }
        }
        let mut out: Vec<_> = seen.into_iter().collect();
        out.sort_by_key(|(name, _)| *name);
        out
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Scheme, Ty};

    #[test]
    fn lookup_in_current_scope() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::int()));
        assert!(env.lookup("x").is_some());
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn lookup_in_outer_scope() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::int()));
        env.push_scope();
        assert!(env.lookup("x").is_some());
    }

    #[test]
    fn shadowing() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::int()));

        env.push_scope();
        env.insert("x".into(), Scheme::mono(Ty::string()));
        assert_eq!(env.lookup("x").unwrap().ty, Ty::string());

        env.pop_scope();
        assert_eq!(env.lookup("x").unwrap().ty, Ty::int());
    }

    #[test]
    fn scope_cleanup() {
        let mut env = TypeEnv::new();
        env.push_scope();
        env.insert("y".into(), Scheme::mono(Ty::bool()));
        assert!(env.lookup("y").is_some());
        env.pop_scope();
        assert!(env.lookup("y").is_none());
    }

    #[test]
    #[should_panic(expected = "cannot pop the global scope")]
    fn pop_global_scope_panics() {
        let mut env = TypeEnv::new();
        env.pop_scope();
    }

    #[test]
    fn visible_bindings_resolves_shadowing() {
        let mut env = TypeEnv::new();
        env.insert("a".into(), Scheme::mono(Ty::int()));
        env.push_scope();
        env.insert("a".into(), Scheme::mono(Ty::string()));
        env.insert("b".into(), Scheme::mono(Ty::bool()));

        let bindings = env.visible_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].0, "a");
        assert_eq!(bindings[0].1.ty, Ty::string());
        assert_eq!(bindings[1].0, "b");
    }
}
