//! Capability predicates
//!
//! Pure type tests over [`Value`]. All of them accept any value, including
//! `null` and `undefined`, and none of them track or trigger anything beyond
//! the property reads `is_promise` performs.

use crate::key::PropertyKey;
use crate::value::{same_value, Value};

/// Objects and arrays; `null` and functions are excluded
pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Object(obj) if !obj.is_callable())
}

pub fn is_array(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| obj.is_array())
}

pub fn is_string(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

pub fn is_function(value: &Value) -> bool {
    value.is_callable()
}

pub fn is_symbol(value: &Value) -> bool {
    matches!(value, Value::Symbol(_))
}

/// An object exposing callable `then` and `catch`
pub fn is_promise(value: &Value) -> bool {
    let callable = |name: &str| value.get(name).is_ok_and(|method| method.is_callable());
    is_object(value) && callable("then") && callable("catch")
}

/// Own-property check that ignores the prototype chain
pub fn has_own(value: &Value, key: impl Into<PropertyKey>) -> bool {
    let key = key.into();
    value
        .as_object()
        .is_some_and(|obj| obj.get_own_property(&key).is_some())
}

/// Whether a write of `new` over `old` is an observable change
///
/// `NaN` over `NaN` is not a change; `-0` over `+0` is.
pub fn has_changed(new: &Value, old: &Value) -> bool {
    !same_value(new, old)
}

/// Canonical array index keys (`"0"`, `"17"`, not `"01"` or `"4294967295"`)
pub fn is_integer_key(key: &PropertyKey) -> bool {
    key.as_index().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::function;
    use crate::object::ObjectRef;
    use crate::symbol::Symbol;

    #[test]
    fn test_is_object() {
        assert!(is_object(&Value::object([("a", Value::from(1))])));
        assert!(is_object(&Value::array(vec![])));
        assert!(!is_object(&Value::Null));
        assert!(!is_object(&Value::Undefined));
        assert!(!is_object(&function("f", 0, |_, _| Ok(Value::Undefined))));
    }

    #[test]
    fn test_is_promise() {
        let noop = || function("noop", 0, |this, _| Ok(this.clone()));
        let thenable = Value::object([("then", noop()), ("catch", noop())]);
        assert!(is_promise(&thenable));
        assert!(!is_promise(&Value::object([("then", noop())])));
        assert!(!is_promise(&Value::Null));
    }

    #[test]
    fn test_primitive_predicates() {
        assert!(is_array(&Value::array(vec![])));
        assert!(!is_array(&Value::from(ObjectRef::new_object())));
        assert!(is_string(&Value::from("111")));
        assert!(is_function(&function("f", 0, |_, _| Ok(Value::Undefined))));
        assert!(is_symbol(&Value::from(Symbol::new("s"))));
        assert!(!is_symbol(&Value::from("s")));
    }

    #[test]
    fn test_has_changed() {
        assert!(!has_changed(&1.into(), &1.into()));
        assert!(has_changed(&1.into(), &2.into()));
        assert!(!has_changed(&f64::NAN.into(), &f64::NAN.into()));
        assert!(has_changed(&0.0.into(), &(-0.0).into()));
    }

    #[test]
    fn test_has_own() {
        let obj = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
        assert!(has_own(&obj, "a"));
        assert!(!has_own(&obj, "c"));
        assert!(!has_own(&obj, "hasOwnProperty"));
        assert!(!has_own(&Value::Undefined, "a"));
    }

    #[test]
    fn test_is_integer_key() {
        assert!(is_integer_key(&"0".into()));
        assert!(is_integer_key(&"42".into()));
        assert!(!is_integer_key(&"042".into()));
        assert!(!is_integer_key(&"-1".into()));
        assert!(!is_integer_key(&"NaN".into()));
        assert!(!is_integer_key(&Symbol::ITERATOR.into()));
        assert!(!is_integer_key(&"4294967295".into()));
    }
}
