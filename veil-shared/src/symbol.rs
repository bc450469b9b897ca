//! Symbol tokens
//!
//! Symbols are unique, copyable property keys. The well-known symbols occupy a
//! fixed id range below [`FIRST_USER_SYMBOL`]; every other symbol is allocated
//! from a process-wide counter, so two calls to [`Symbol::new`] never collide.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// First id handed out by [`Symbol::new`]
pub const FIRST_USER_SYMBOL: u32 = 64;

static NEXT_SYMBOL: AtomicU32 = AtomicU32::new(FIRST_USER_SYMBOL);

/// A unique property-key token
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    id: u32,
    description: &'static str,
}

impl Symbol {
    pub const ASYNC_ITERATOR: Symbol = Symbol::well_known(1, "Symbol.asyncIterator");
    pub const HAS_INSTANCE: Symbol = Symbol::well_known(2, "Symbol.hasInstance");
    pub const IS_CONCAT_SPREADABLE: Symbol = Symbol::well_known(3, "Symbol.isConcatSpreadable");
    pub const ITERATOR: Symbol = Symbol::well_known(4, "Symbol.iterator");
    pub const MATCH: Symbol = Symbol::well_known(5, "Symbol.match");
    pub const MATCH_ALL: Symbol = Symbol::well_known(6, "Symbol.matchAll");
    pub const REPLACE: Symbol = Symbol::well_known(7, "Symbol.replace");
    pub const SEARCH: Symbol = Symbol::well_known(8, "Symbol.search");
    pub const SPECIES: Symbol = Symbol::well_known(9, "Symbol.species");
    pub const SPLIT: Symbol = Symbol::well_known(10, "Symbol.split");
    pub const TO_PRIMITIVE: Symbol = Symbol::well_known(11, "Symbol.toPrimitive");
    pub const TO_STRING_TAG: Symbol = Symbol::well_known(12, "Symbol.toStringTag");
    pub const UNSCOPABLES: Symbol = Symbol::well_known(13, "Symbol.unscopables");

    /// Every built-in symbol, in id order
    pub const WELL_KNOWN: [Symbol; 13] = [
        Symbol::ASYNC_ITERATOR,
        Symbol::HAS_INSTANCE,
        Symbol::IS_CONCAT_SPREADABLE,
        Symbol::ITERATOR,
        Symbol::MATCH,
        Symbol::MATCH_ALL,
        Symbol::REPLACE,
        Symbol::SEARCH,
        Symbol::SPECIES,
        Symbol::SPLIT,
        Symbol::TO_PRIMITIVE,
        Symbol::TO_STRING_TAG,
        Symbol::UNSCOPABLES,
    ];

    const fn well_known(id: u32, description: &'static str) -> Self {
        Symbol { id, description }
    }

    /// Allocate a fresh symbol
    pub fn new(description: &'static str) -> Self {
        let id = NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed);
        Symbol { id, description }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Whether this is one of the built-in symbols
    pub fn is_well_known(&self) -> bool {
        self.id > 0 && self.id < FIRST_USER_SYMBOL
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_symbols_are_distinct() {
        let a = Symbol::new("a");
        let b = Symbol::new("a");
        assert_ne!(a, b);
        assert!(!a.is_well_known());
    }

    #[test]
    fn test_well_known_range() {
        assert!(Symbol::WELL_KNOWN.iter().all(Symbol::is_well_known));
        assert_eq!(Symbol::ITERATOR.to_string(), "Symbol(Symbol.iterator)");
    }
}
