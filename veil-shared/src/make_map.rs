//! Membership sets built from comma-separated key lists

use crate::key::PropertyKey;
use std::collections::HashSet;

/// Set of string keys parsed from `"a,b,c"`
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashSet<String>,
}

impl KeySet {
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Symbol keys are never members
    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        key.as_str().is_some_and(|s| self.contains(s))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn make_map(list: &str) -> KeySet {
    KeySet {
        keys: list.split(',').map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    #[test]
    fn test_make_map() {
        let set = make_map("__proto__,constructor");
        assert!(set.contains("__proto__"));
        assert!(set.contains("constructor"));
        assert!(!set.contains("proto"));
        assert_eq!(set.len(), 2);
        assert!(!set.contains_key(&Symbol::ITERATOR.into()));
    }
}
