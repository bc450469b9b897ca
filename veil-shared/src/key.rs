//! Property keys

use crate::symbol::Symbol;
use crate::value::number_to_string;
use std::fmt;
use std::rc::Rc;

/// A property key: either a string or a symbol
///
/// Array indices are string keys in canonical decimal form (`"0"`, `"12"`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Rc<str>),
    Symbol(Symbol),
}

impl PropertyKey {
    /// Key for an array index
    pub fn index(index: usize) -> Self {
        PropertyKey::String(index.to_string().into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            PropertyKey::String(_) => None,
            PropertyKey::Symbol(sym) => Some(*sym),
        }
    }

    /// The array index this key names, if it is a canonical integer string
    /// below `2^32 - 1`
    pub fn as_index(&self) -> Option<usize> {
        let s = self.as_str()?;
        let index: u32 = s.parse().ok()?;
        (index != u32::MAX && index.to_string() == s).then_some(index as usize)
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.into())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s.into())
    }
}

impl From<Rc<str>> for PropertyKey {
    fn from(s: Rc<str>) -> Self {
        PropertyKey::String(s)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(sym: Symbol) -> Self {
        PropertyKey::Symbol(sym)
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        PropertyKey::index(index)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::String(index.to_string().into())
    }
}

impl From<i32> for PropertyKey {
    fn from(n: i32) -> Self {
        PropertyKey::String(n.to_string().into())
    }
}

impl From<f64> for PropertyKey {
    fn from(n: f64) -> Self {
        PropertyKey::String(number_to_string(n).into())
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{:?}", s),
            PropertyKey::Symbol(sym) => write!(f, "{:?}", sym),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => f.write_str(s),
            PropertyKey::Symbol(sym) => write!(f, "{}", sym),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_keys() {
        assert_eq!(PropertyKey::from("3").as_index(), Some(3));
        assert_eq!(PropertyKey::from(7usize), PropertyKey::from("7"));
        assert_eq!(PropertyKey::from("03").as_index(), None);
        assert_eq!(PropertyKey::from("-1").as_index(), None);
        assert_eq!(PropertyKey::from("NaN").as_index(), None);
        assert_eq!(PropertyKey::from(Symbol::ITERATOR).as_index(), None);
        assert_eq!(PropertyKey::from("4294967294").as_index(), Some(4_294_967_294));
        assert_eq!(PropertyKey::from("4294967295").as_index(), None);
        assert_eq!(PropertyKey::from("18446744073709551615").as_index(), None);
    }

    #[test]
    fn test_number_keys_are_canonical() {
        assert_eq!(PropertyKey::from(2.0), PropertyKey::from("2"));
        assert_eq!(PropertyKey::from(1.5), PropertyKey::from("1.5"));
    }
}
