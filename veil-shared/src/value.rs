//! Runtime values
//!
//! [`Value`] is the dynamically-typed value stored in object properties and
//! passed to native functions. Primitive variants are immutable; the
//! `Object` variant is a shared handle, so cloning a `Value` never copies an
//! object.

use crate::error::{ObjectError, Result};
use crate::key::PropertyKey;
use crate::object::ObjectRef;
use crate::symbol::Symbol;
use std::fmt;
use std::rc::Rc;

/// A dynamically-typed value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(Symbol),
    Object(ObjectRef),
}

impl Value {
    /// Build a new array value from its elements
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Object(ObjectRef::new_array(elements))
    }

    /// Build a new plain object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(ObjectRef::from_entries(entries))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(ObjectRef::is_callable)
    }

    /// Identity comparison for objects; false for primitives
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Name reported by `typeof`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(obj) if obj.is_callable() => "function",
            Value::Object(_) => "object",
        }
    }

    /// Truthiness used by predicates such as `filter` and `every`
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(n.is_nan() || *n == 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// Numeric conversion for the primitive cases the array methods need
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Symbol(_) | Value::Object(_) => f64::NAN,
        }
    }

    /// Convert to a property key
    pub fn to_property_key(&self) -> PropertyKey {
        match self {
            Value::Symbol(sym) => PropertyKey::Symbol(*sym),
            Value::String(s) => PropertyKey::String(s.clone()),
            Value::Number(n) => PropertyKey::from(*n),
            Value::Undefined => PropertyKey::from("undefined"),
            Value::Null => PropertyKey::from("null"),
            Value::Bool(b) => PropertyKey::from(b.to_string()),
            Value::Object(_) => PropertyKey::from("[object Object]"),
        }
    }

    /// String conversion; arrays join their elements with `,`
    pub fn to_display_string(&self) -> Result<String> {
        Ok(match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Symbol(sym) => sym.to_string(),
            Value::Object(obj) if obj.is_array() => {
                return self
                    .call_method("join", &[])?
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ObjectError::type_error("join returned a non-string"));
            }
            Value::Object(obj) => match obj.function_name() {
                Some(name) => format!("function {}() {{ [native code] }}", name),
                None => "[object Object]".to_string(),
            },
        })
    }

    /// Read a property, using this value as the receiver
    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value> {
        match self {
            Value::Object(obj) => obj.get(&key.into(), self),
            _ => Ok(Value::Undefined),
        }
    }

    /// Write a property, using this value as the receiver
    ///
    /// Writes to primitives are ignored and report `false`.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<bool> {
        match self {
            Value::Object(obj) => obj.set(&key.into(), value.into(), self),
            _ => Ok(false),
        }
    }

    /// The `in` operator
    pub fn has(&self, key: impl Into<PropertyKey>) -> Result<bool> {
        match self {
            Value::Object(obj) => obj.has(&key.into()),
            _ => Err(ObjectError::type_error(
                "cannot use 'in' operator on a primitive",
            )),
        }
    }

    /// The `delete` operator
    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool> {
        match self {
            Value::Object(obj) => obj.delete(&key.into()),
            _ => Ok(true),
        }
    }

    /// Call this value as a function with an explicit `this`
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        match self {
            Value::Object(obj) if obj.is_callable() => obj.call(this, args),
            other => Err(ObjectError::NotCallable(format!("{:?}", other))),
        }
    }

    /// Look up a method on this value and call it with this value as `this`
    pub fn call_method(&self, name: impl Into<PropertyKey>, args: &[Value]) -> Result<Value> {
        let key = name.into();
        let method = self.get(&key)?;
        if !method.is_callable() {
            return Err(ObjectError::NotCallable(key.to_string()));
        }
        method.call(self, args)
    }
}

/// Same-value comparison: `NaN` equals itself, `+0` and `-0` differ
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        _ => a == b,
    }
}

/// Same-value-zero comparison used by `includes`: `NaN` equals itself and
/// both zeroes are equal
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        _ => a == b,
    }
}

/// Canonical decimal rendering of a number
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Strict equality: objects by identity, `NaN` is not equal to itself
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(sym) => write!(f, "{:?}", sym),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Value::Object(obj.clone())
    }
}

impl From<Option<ObjectRef>> for Value {
    fn from(obj: Option<ObjectRef>) -> Self {
        obj.map_or(Value::Null, Value::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_value() {
        assert!(same_value(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!same_value(&Value::from(0.0), &Value::from(-0.0)));
        assert!(same_value(&Value::from(1), &Value::from(1.0)));
        assert!(!same_value(&Value::from("1"), &Value::from(1)));
    }

    #[test]
    fn test_strict_equality() {
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_eq!(Value::from(0.0), Value::from(-0.0));

        let a = Value::object([("x", Value::from(1))]);
        let b = Value::object([("x", Value::from(1))]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NAN), "NaN");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "object");
        assert_eq!(Value::array(vec![]).type_name(), "object");
        assert_eq!(Value::from(Symbol::ITERATOR).type_name(), "symbol");
    }

    #[test]
    fn test_display_string_of_array() {
        let list = Value::array(vec![1.into(), Value::Null, "x".into()]);
        assert_eq!(list.to_display_string().unwrap(), "1,,x");
    }

    #[test]
    fn test_call_non_function() {
        let err = Value::from(1).call(&Value::Undefined, &[]).unwrap_err();
        assert!(matches!(err, ObjectError::NotCallable(_)));
    }
}
