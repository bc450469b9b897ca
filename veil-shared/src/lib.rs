//! Shared object model for veil
//!
//! This crate provides the dynamic object graph that the observation layer
//! wraps: values, property keys, symbols, ordinary objects, arrays, native
//! functions and proxies, together with the native `Array.prototype` methods
//! and the capability predicates (`is_object`, `has_changed`, ...) consumed by
//! `veil-reactivity`.
//!
//! # Model
//!
//! Objects live behind reference-counted [`ObjectRef`] handles that compare by
//! identity. Every object exposes the same small set of internal operations
//! (`get`, `set`, `has`, `delete`, `own_keys`). A proxy object forwards those
//! operations to a [`ProxyHandler`], which is how interception is expressed
//! without runtime property hooks.
//!
//! ```rust
//! use veil_shared::{Value, ObjectRef};
//!
//! let point = Value::from(ObjectRef::from_entries([("x", 1.into()), ("y", 2.into())]));
//! assert_eq!(point.get("x").unwrap(), Value::from(1));
//!
//! let list = Value::array(vec![1.into(), 2.into()]);
//! list.call_method("push", &[3.into()]).unwrap();
//! assert_eq!(list.get("length").unwrap(), Value::from(3));
//! ```

#![warn(missing_debug_implementations)]

pub mod array;
pub mod error;
pub mod function;
pub mod general;
pub mod intrinsics;
pub mod iter;
pub mod json;
pub mod key;
pub mod make_map;
pub mod object;
pub mod proxy;
pub mod symbol;
pub mod value;

pub use error::{ObjectError, Result};
pub use function::{arg, function, NativeFunction};
pub use general::{
    has_changed, has_own, is_array, is_function, is_integer_key, is_object, is_promise,
    is_string, is_symbol,
};
pub use iter::{iterate, IterationKind};
pub use key::PropertyKey;
pub use make_map::{make_map, KeySet};
pub use object::{
    for_in_keys, object_keys, ObjectId, ObjectRef, Property, Slot, WeakObjectRef, MAX_DENSE_LENGTH,
};
pub use proxy::ProxyHandler;
pub use symbol::Symbol;
pub use value::{number_to_string, same_value, same_value_zero, Value};
