//! Arena-backed string interner.
//!
//! Identifiers are interned once per pipeline run; equal identifiers
//! share the same `&str`, so downstream comparisons can use pointer
//! identity (byte-wise equality still holds regardless).

use rustc_hash::FxHashSet;

use crate::arena::Arena;

/// Deduplicating interner handing out string slices owned by the arena.
pub struct Interner<'a> {
    arena: &'a Arena,
    seen: FxHashSet<&'a str>,
}

impl<'a> Interner<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Interner {
            arena,
            seen: FxHashSet::default(),
        }
    }

    /// Intern a string, returning an arena-owned slice. Repeated calls
    /// with equal input return the identical slice.
    pub fn intern(&mut self, s: &str) -> &'a str {
        if let Some(&existing) = self.seen.get(s) {
            return existing;
        }
        let owned = self.arena.alloc_str(s);
        self.seen.insert(owned);
        owned
    }

    /// Look up an already-interned string without inserting.
    pub fn lookup(&self, s: &str) -> Option<&'a str> {
        self.seen.get(s).copied()
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let arena = Arena::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, "foo");
        // Same allocation for equal strings.
        assert!(std::ptr::eq(a, b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_slices() {
        let arena = Arena::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn lookup_does_not_insert() {
        let arena = Arena::new();
        let mut interner = Interner::new(&arena);
        assert!(interner.lookup("x").is_none());
        interner.intern("x");
        assert_eq!(interner.lookup("x"), Some("x"));
    }
}
