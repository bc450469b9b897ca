//! Heap objects and their internal operations
//!
//! An [`ObjectRef`] is a shared handle to one of four object kinds: an
//! ordinary object, an array, a native function or a proxy. All kinds answer
//! the same internal operations:
//!
//! | operation            | proxy behaviour                         |
//! |----------------------|-----------------------------------------|
//! | `get`                | handler `get` trap                      |
//! | `set`                | handler `set` trap                      |
//! | `has`                | handler `has` trap                      |
//! | `delete`             | handler `delete_property` trap          |
//! | `own_keys`           | handler `own_keys` trap                 |
//! | `get_own_property`   | forwarded to the target                 |
//! | `define_property`    | forwarded to the target                 |
//! | `get_prototype_of`   | forwarded to the target                 |
//!
//! `get` and `set` take an explicit receiver. Accessors run with the receiver
//! as `this`, and data writes that reach the end of the prototype chain land
//! on the receiver, not on the object where the lookup started.
//!
//! No `RefCell` borrow is held while user code (accessors, handlers) runs.

use crate::error::{ObjectError, Result};
use crate::function::NativeFunction;
use crate::intrinsics;
use crate::key::PropertyKey;
use crate::proxy::ProxyHandler;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Identity of a live object (its allocation address)
pub type ObjectId = usize;

/// Largest array length accepted by `length` writes
const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Arrays are stored densely; writes that would grow one past this many
/// elements fail with [`ObjectError::Range`]
pub const MAX_DENSE_LENGTH: usize = 1 << 24;

/// Storage for one property
#[derive(Debug, Clone)]
pub enum Slot {
    Data(Value),
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
    },
}

/// A property slot plus its enumerability
#[derive(Debug, Clone)]
pub struct Property {
    pub slot: Slot,
    pub enumerable: bool,
}

impl Property {
    /// Enumerable data property
    pub fn data(value: Value) -> Self {
        Property {
            slot: Slot::Data(value),
            enumerable: true,
        }
    }

    /// Non-enumerable data property
    pub fn hidden(value: Value) -> Self {
        Property {
            slot: Slot::Data(value),
            enumerable: false,
        }
    }

    pub fn accessor(get: Option<Value>, set: Option<Value>) -> Self {
        Property {
            slot: Slot::Accessor { get, set },
            enumerable: true,
        }
    }

    /// The stored value of a data property
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data(value) => Some(value),
            Slot::Accessor { .. } => None,
        }
    }
}

enum ObjectKind {
    Ordinary,
    Array(Vec<Value>),
    Function(NativeFunction),
    Proxy {
        target: ObjectRef,
        handler: Rc<dyn ProxyHandler>,
    },
}

struct ObjectData {
    kind: ObjectKind,
    properties: IndexMap<PropertyKey, Property>,
    prototype: Option<ObjectRef>,
}

/// Shared handle to a heap object, compared by identity
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

/// Non-owning handle to a heap object
#[derive(Clone)]
pub struct WeakObjectRef(Weak<RefCell<ObjectData>>);

impl ObjectRef {
    fn alloc(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        ObjectRef(Rc::new(RefCell::new(ObjectData {
            kind,
            properties: IndexMap::new(),
            prototype,
        })))
    }

    /// Plain object inheriting from `Object.prototype`
    pub fn new_object() -> Self {
        Self::alloc(ObjectKind::Ordinary, Some(intrinsics::object_prototype()))
    }

    /// Plain object with an explicit prototype (`None` for a null prototype)
    pub fn with_prototype(prototype: Option<ObjectRef>) -> Self {
        Self::alloc(ObjectKind::Ordinary, prototype)
    }

    /// Array inheriting from `Array.prototype`
    pub fn new_array(elements: Vec<Value>) -> Self {
        Self::alloc(
            ObjectKind::Array(elements),
            Some(intrinsics::array_prototype()),
        )
    }

    pub fn new_function(function: NativeFunction) -> Self {
        Self::alloc(ObjectKind::Function(function), None)
    }

    /// Proxy whose internal operations dispatch to `handler`
    pub fn new_proxy(target: ObjectRef, handler: Rc<dyn ProxyHandler>) -> Self {
        Self::alloc(ObjectKind::Proxy { target, handler }, None)
    }

    /// Plain object with enumerable data properties
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let obj = Self::new_object();
        {
            let mut data = obj.0.borrow_mut();
            for (key, value) in entries {
                data.properties.insert(key.into(), Property::data(value));
            }
        }
        obj
    }

    pub fn id(&self) -> ObjectId {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Rc::downgrade(&self.0))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Function(_))
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Proxy { .. })
    }

    /// Whether this is an array, looking through proxies
    pub fn is_array(&self) -> bool {
        let target = match &self.0.borrow().kind {
            ObjectKind::Array(_) => return true,
            ObjectKind::Proxy { target, .. } => target.clone(),
            _ => return false,
        };
        target.is_array()
    }

    /// The proxied object, if this is a proxy
    pub fn proxy_target(&self) -> Option<ObjectRef> {
        match &self.0.borrow().kind {
            ObjectKind::Proxy { target, .. } => Some(target.clone()),
            _ => None,
        }
    }

    fn proxy_parts(&self) -> Option<(ObjectRef, Rc<dyn ProxyHandler>)> {
        match &self.0.borrow().kind {
            ObjectKind::Proxy { target, handler } => Some((target.clone(), Rc::clone(handler))),
            _ => None,
        }
    }

    pub fn native_function(&self) -> Option<NativeFunction> {
        match &self.0.borrow().kind {
            ObjectKind::Function(function) => Some(function.clone()),
            _ => None,
        }
    }

    pub fn function_name(&self) -> Option<String> {
        self.native_function().map(|f| f.name().to_string())
    }

    /// Element count of a raw array; `None` for anything else, proxies included
    pub fn array_len(&self) -> Option<usize> {
        match &self.0.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.len()),
            _ => None,
        }
    }

    /// Snapshot of a raw array's elements
    pub fn elements(&self) -> Option<Vec<Value>> {
        match &self.0.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        let function = self
            .native_function()
            .ok_or_else(|| ObjectError::NotCallable(format!("{:?}", self)))?;
        function.call(this, args)
    }

    pub fn get_prototype_of(&self) -> Option<ObjectRef> {
        let target = {
            let data = self.0.borrow();
            match &data.kind {
                ObjectKind::Proxy { target, .. } => target.clone(),
                _ => return data.prototype.clone(),
            }
        };
        target.get_prototype_of()
    }

    /// Replace the prototype; refuses to create a cycle
    pub fn set_prototype_of(&self, prototype: Option<ObjectRef>) -> bool {
        if let Some(target) = self.proxy_target() {
            return target.set_prototype_of(prototype);
        }
        let mut cursor = prototype.clone();
        while let Some(ancestor) = cursor {
            if ancestor.ptr_eq(self) {
                return false;
            }
            cursor = ancestor.get_prototype_of();
        }
        let previous = std::mem::replace(&mut self.0.borrow_mut().prototype, prototype);
        drop(previous);
        true
    }

    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        let target = {
            let data = self.0.borrow();
            match &data.kind {
                ObjectKind::Proxy { target, .. } => target.clone(),
                ObjectKind::Array(elements) => {
                    if let Some(index) = key.as_index() {
                        return elements.get(index).cloned().map(Property::data);
                    }
                    if key.as_str() == Some("length") {
                        return Some(Property::hidden(Value::from(elements.len())));
                    }
                    return data.properties.get(key).cloned();
                }
                _ => return data.properties.get(key).cloned(),
            }
        };
        target.get_own_property(key)
    }

    /// Create or replace an own property
    ///
    /// Array indices accept data properties only; writing an index at or past
    /// the end extends the array with `undefined`. Writing `length` truncates
    /// or extends. Growing an array past [`MAX_DENSE_LENGTH`] is a range error.
    pub fn define_property(&self, key: &PropertyKey, property: Property) -> Result<bool> {
        if let Some(target) = self.proxy_target() {
            return target.define_property(key, property);
        }
        let mut displaced: Vec<Value> = Vec::new();
        let defined = {
            let mut guard = self.0.borrow_mut();
            let data = &mut *guard;
            match &mut data.kind {
                ObjectKind::Array(elements) if key.as_index().is_some() => {
                    match (key.as_index(), property.slot) {
                        (Some(index), Slot::Data(value)) => {
                            if index >= elements.len() {
                                let len = dense_length(index.checked_add(1))?;
                                elements.resize(len, Value::Undefined);
                            }
                            if let Some(slot) = elements.get_mut(index) {
                                displaced.push(std::mem::replace(slot, value));
                            }
                            true
                        }
                        _ => false,
                    }
                }
                ObjectKind::Array(elements) if key.as_str() == Some("length") => {
                    match property.slot {
                        Slot::Data(value) => {
                            let len = array_length_from(&value)?;
                            if len < elements.len() {
                                displaced.extend(elements.drain(len..));
                            } else {
                                elements.resize(dense_length(Some(len))?, Value::Undefined);
                            }
                            true
                        }
                        Slot::Accessor { .. } => false,
                    }
                }
                _ => {
                    if let Some(old) = data.properties.insert(key.clone(), property) {
                        if let Slot::Data(value) = old.slot {
                            displaced.push(value);
                        }
                    }
                    true
                }
            }
        };
        drop(displaced);
        Ok(defined)
    }

    /// Define a non-enumerable data property
    pub fn define_hidden(&self, key: impl Into<PropertyKey>, value: Value) -> Result<bool> {
        self.define_property(&key.into(), Property::hidden(value))
    }

    /// Define an enumerable accessor property
    ///
    /// Returns `Ok(false)` on array indices and `length`, which only hold data.
    pub fn define_accessor(
        &self,
        key: impl Into<PropertyKey>,
        get: Option<Value>,
        set: Option<Value>,
    ) -> Result<bool> {
        self.define_property(&key.into(), Property::accessor(get, set))
    }

    /// Insert straight into the named property map, for building built-ins
    /// on freshly allocated ordinary objects
    pub(crate) fn insert_builtin(&self, key: impl Into<PropertyKey>, property: Property) {
        let previous = self.0.borrow_mut().properties.insert(key.into(), property);
        drop(previous);
    }

    /// `[[Get]]`
    pub fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        if let Some((target, handler)) = self.proxy_parts() {
            return handler.get(&target, key, receiver);
        }
        match self.get_own_property(key) {
            Some(Property {
                slot: Slot::Data(value),
                ..
            }) => Ok(value),
            Some(Property {
                slot: Slot::Accessor {
                    get: Some(getter), ..
                },
                ..
            }) => getter.call(receiver, &[]),
            Some(_) => Ok(Value::Undefined),
            None => match self.get_prototype_of() {
                Some(prototype) => prototype.get(key, receiver),
                None => Ok(Value::Undefined),
            },
        }
    }

    /// `[[Set]]`
    pub fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool> {
        if let Some((target, handler)) = self.proxy_parts() {
            return handler.set(&target, key, value, receiver);
        }
        let own = match self.get_own_property(key) {
            Some(property) => property,
            None => match self.get_prototype_of() {
                Some(prototype) => return prototype.set(key, value, receiver),
                None => Property::data(Value::Undefined),
            },
        };
        match own.slot {
            Slot::Data(_) => {
                let Some(receiver) = receiver.as_object() else {
                    return Ok(false);
                };
                match receiver.get_own_property(key) {
                    Some(Property {
                        slot: Slot::Accessor { .. },
                        ..
                    }) => Ok(false),
                    Some(existing) => receiver.define_property(
                        key,
                        Property {
                            slot: Slot::Data(value),
                            enumerable: existing.enumerable,
                        },
                    ),
                    None => receiver.define_property(key, Property::data(value)),
                }
            }
            Slot::Accessor {
                set: Some(setter), ..
            } => {
                setter.call(receiver, &[value])?;
                Ok(true)
            }
            Slot::Accessor { set: None, .. } => Ok(false),
        }
    }

    /// `[[HasProperty]]`
    pub fn has(&self, key: &PropertyKey) -> Result<bool> {
        if let Some((target, handler)) = self.proxy_parts() {
            return handler.has(&target, key);
        }
        if self.get_own_property(key).is_some() {
            return Ok(true);
        }
        match self.get_prototype_of() {
            Some(prototype) => prototype.has(key),
            None => Ok(false),
        }
    }

    /// `[[Delete]]`
    ///
    /// Arrays are dense: deleting an index stores `undefined` in place.
    /// `length` cannot be deleted.
    pub fn delete(&self, key: &PropertyKey) -> Result<bool> {
        if let Some((target, handler)) = self.proxy_parts() {
            return handler.delete_property(&target, key);
        }
        let (deleted, removed) = {
            let mut guard = self.0.borrow_mut();
            let data = &mut *guard;
            match &mut data.kind {
                ObjectKind::Array(elements) if key.as_index().is_some() => {
                    let removed = key
                        .as_index()
                        .and_then(|index| elements.get_mut(index))
                        .map(|slot| std::mem::take(slot));
                    (true, removed)
                }
                ObjectKind::Array(_) if key.as_str() == Some("length") => (false, None),
                _ => {
                    let removed = data.properties.shift_remove(key);
                    (true, removed.and_then(|p| p.value().cloned()))
                }
            }
        };
        drop(removed);
        Ok(deleted)
    }

    /// `[[OwnPropertyKeys]]`: integer keys ascending, then strings in
    /// insertion order, then symbols
    pub fn own_keys(&self) -> Result<Vec<PropertyKey>> {
        if let Some((target, handler)) = self.proxy_parts() {
            return handler.own_keys(&target);
        }
        let data = self.0.borrow();
        let mut keys = Vec::new();
        if let ObjectKind::Array(elements) = &data.kind {
            keys.extend((0..elements.len()).map(PropertyKey::index));
            keys.push(PropertyKey::from("length"));
        }
        let mut integers = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in data.properties.keys() {
            if let Some(index) = key.as_index() {
                integers.push((index, key.clone()));
            } else if key.is_symbol() {
                symbols.push(key.clone());
            } else {
                strings.push(key.clone());
            }
        }
        integers.sort_by_key(|(index, _)| *index);
        keys.extend(integers.into_iter().map(|(_, key)| key));
        keys.extend(strings);
        keys.extend(symbols);
        Ok(keys)
    }
}

fn array_length_from(value: &Value) -> Result<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_ARRAY_LENGTH => {
            Ok(*n as usize)
        }
        other => Err(ObjectError::Range(format!(
            "invalid array length: {:?}",
            other
        ))),
    }
}

fn dense_length(len: Option<usize>) -> Result<usize> {
    match len {
        Some(len) if len <= MAX_DENSE_LENGTH => Ok(len),
        _ => Err(ObjectError::Range(format!(
            "array length exceeds dense capacity of {}",
            MAX_DENSE_LENGTH
        ))),
    }
}

/// Own enumerable string keys (`Object.keys`)
pub fn object_keys(obj: &ObjectRef) -> Result<Vec<PropertyKey>> {
    Ok(obj
        .own_keys()?
        .into_iter()
        .filter(|key| !key.is_symbol())
        .filter(|key| obj.get_own_property(key).is_some_and(|p| p.enumerable))
        .collect())
}

/// Enumerable string keys along the prototype chain (`for..in`)
pub fn for_in_keys(obj: &ObjectRef) -> Result<Vec<PropertyKey>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut cursor = Some(obj.clone());
    while let Some(current) = cursor {
        for key in current.own_keys()? {
            if key.is_symbol() || !seen.insert(key.clone()) {
                continue;
            }
            if current.get_own_property(&key).is_some_and(|p| p.enumerable) {
                keys.push(key);
            }
        }
        cursor = current.get_prototype_of();
    }
    Ok(keys)
}

impl WeakObjectRef {
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    /// Whether the object is still alive
    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(data) = self.0.try_borrow() else {
            return write!(f, "Object#{:x}", self.id());
        };
        match &data.kind {
            ObjectKind::Ordinary => write!(f, "Object#{:x}", self.id()),
            ObjectKind::Array(elements) => write!(f, "Array({})#{:x}", elements.len(), self.id()),
            ObjectKind::Function(function) => write!(f, "Function({})", function.name()),
            ObjectKind::Proxy { target, .. } => write!(f, "Proxy({:?})", target),
        }
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "Weak({:?})", obj),
            None => f.write_str("Weak(<dropped>)"),
        }
    }
}
