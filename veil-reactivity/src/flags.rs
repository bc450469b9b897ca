//! Reserved flags, variants and operation kinds

use once_cell::sync::Lazy;
use std::fmt;
use veil_shared::{PropertyKey, Symbol};

static FLAG_SYMBOLS: Lazy<[Symbol; 4]> = Lazy::new(|| {
    [
        Symbol::new("__v_isReactive"),
        Symbol::new("__v_isReadonly"),
        Symbol::new("__v_isShallow"),
        Symbol::new("__v_raw"),
    ]
});

/// Capability flags answered by every view's `get` trap
///
/// The flags are keyed by private symbols, so they never collide with real
/// properties and never show up in key enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactiveFlag {
    /// True for every view, mutable or readonly
    IsReactive,
    IsReadonly,
    IsShallow,
    /// The underlying raw object, for authorized receivers only
    Raw,
}

impl ReactiveFlag {
    pub const ALL: [ReactiveFlag; 4] = [
        ReactiveFlag::IsReactive,
        ReactiveFlag::IsReadonly,
        ReactiveFlag::IsShallow,
        ReactiveFlag::Raw,
    ];

    fn index(self) -> usize {
        match self {
            ReactiveFlag::IsReactive => 0,
            ReactiveFlag::IsReadonly => 1,
            ReactiveFlag::IsShallow => 2,
            ReactiveFlag::Raw => 3,
        }
    }

    pub fn symbol(self) -> Symbol {
        FLAG_SYMBOLS[self.index()]
    }

    pub fn key(self) -> PropertyKey {
        PropertyKey::Symbol(self.symbol())
    }

    pub fn from_key(key: &PropertyKey) -> Option<Self> {
        let symbol = key.as_symbol()?;
        Self::ALL.into_iter().find(|flag| flag.symbol() == symbol)
    }
}

/// One of the four kinds of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    MutableDeep,
    MutableShallow,
    ReadonlyDeep,
    ReadonlyShallow,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::MutableDeep,
        Variant::MutableShallow,
        Variant::ReadonlyDeep,
        Variant::ReadonlyShallow,
    ];

    pub fn new(readonly: bool, shallow: bool) -> Self {
        match (readonly, shallow) {
            (false, false) => Variant::MutableDeep,
            (false, true) => Variant::MutableShallow,
            (true, false) => Variant::ReadonlyDeep,
            (true, true) => Variant::ReadonlyShallow,
        }
    }

    pub fn is_readonly(self) -> bool {
        matches!(self, Variant::ReadonlyDeep | Variant::ReadonlyShallow)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, Variant::MutableShallow | Variant::ReadonlyShallow)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Variant::MutableDeep => 0,
            Variant::MutableShallow => 1,
            Variant::ReadonlyDeep => 2,
            Variant::ReadonlyShallow => 3,
        }
    }

    /// Variant used for values read through a deep view
    pub(crate) fn nested(self) -> Variant {
        Variant::new(self.is_readonly(), false)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::MutableDeep => "mutable-deep",
            Variant::MutableShallow => "mutable-shallow",
            Variant::ReadonlyDeep => "readonly-deep",
            Variant::ReadonlyShallow => "readonly-shallow",
        })
    }
}

/// Kind of observed read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackOp {
    Get,
    /// `in` and `hasOwnProperty`
    Has,
    /// Key enumeration or whole-array reads
    Iterate,
}

impl fmt::Display for TrackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrackOp::Get => "get",
            TrackOp::Has => "has",
            TrackOp::Iterate => "iterate",
        })
    }
}

/// Kind of observed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerOp {
    Set,
    Add,
    Delete,
    Clear,
}

impl fmt::Display for TriggerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerOp::Set => "set",
            TriggerOp::Add => "add",
            TriggerOp::Delete => "delete",
            TriggerOp::Clear => "clear",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_keys_round_trip() {
        for flag in ReactiveFlag::ALL {
            assert_eq!(ReactiveFlag::from_key(&flag.key()), Some(flag));
        }
        assert_eq!(ReactiveFlag::from_key(&"__v_raw".into()), None);
        assert_eq!(ReactiveFlag::from_key(&Symbol::ITERATOR.into()), None);
    }

    #[test]
    fn test_flag_symbols_are_private() {
        assert!(ReactiveFlag::ALL.iter().all(|flag| !flag.symbol().is_well_known()));
    }

    #[test]
    fn test_variant_properties() {
        for variant in Variant::ALL {
            assert_eq!(Variant::new(variant.is_readonly(), variant.is_shallow()), variant);
        }
        assert_eq!(Variant::ReadonlyShallow.nested(), Variant::ReadonlyDeep);
        assert_eq!(Variant::MutableShallow.to_string(), "mutable-shallow");
    }
}
