//! Trap sets for the four view variants
//!
//! Every variant shares [`BaseHandler::read`] for `get`. Mutable variants
//! ([`MutableHandler`]) observe writes, `in`, deletion and key enumeration;
//! readonly variants ([`ReadonlyHandler`]) refuse writes and deletions and
//! observe nothing.

use crate::array_instrumentations::ArrayMethod;
use crate::dep::DepKey;
use crate::flags::{ReactiveFlag, TrackOp, TriggerOp, Variant};
use crate::reactive::{is_readonly_view, is_shallow_view, unwrap, Reactivity};
use once_cell::sync::Lazy;
use std::rc::Rc;
use veil_shared::array::length_of;
use veil_shared::{
    has_changed, has_own, is_integer_key, is_object, make_map, KeySet, ObjectId, ObjectRef,
    PropertyKey, ProxyHandler, Result, Value,
};

/// String keys that are never tracked nor wrapped
static NON_TRACKABLE_KEYS: Lazy<KeySet> = Lazy::new(|| make_map("__proto__"));

/// Built-in symbols and `__proto__` bypass tracking and wrapping
fn is_non_trackable(key: &PropertyKey) -> bool {
    match key.as_symbol() {
        Some(symbol) => symbol.is_well_known(),
        None => NON_TRACKABLE_KEYS.contains_key(key),
    }
}

/// Handler for `variant`, bound to the raw object `raw_id`
pub(crate) fn for_variant(ctx: Reactivity, variant: Variant, raw_id: ObjectId) -> Rc<dyn ProxyHandler> {
    let base = BaseHandler {
        ctx,
        variant,
        raw_id,
    };
    if variant.is_readonly() {
        Rc::new(ReadonlyHandler { base })
    } else {
        Rc::new(MutableHandler { base })
    }
}

pub(crate) struct BaseHandler {
    ctx: Reactivity,
    variant: Variant,
    raw_id: ObjectId,
}

impl BaseHandler {
    /// The `get` trap shared by all variants
    fn read(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        let variant = self.variant;

        if let Some(flag) = ReactiveFlag::from_key(key) {
            return Ok(match flag {
                ReactiveFlag::IsReactive => Value::from(true),
                ReactiveFlag::IsReadonly => Value::from(variant.is_readonly()),
                ReactiveFlag::IsShallow => Value::from(variant.is_shallow()),
                ReactiveFlag::Raw if self.authorizes_raw(target, receiver) => {
                    Value::Object(target.clone())
                }
                ReactiveFlag::Raw => Value::Undefined,
            });
        }

        if !variant.is_readonly() {
            if target.is_array() {
                if let Some(method) = ArrayMethod::from_key(key) {
                    return Ok(self.ctx.instrumented(method));
                }
            }
            if key.as_str() == Some("hasOwnProperty") {
                return Ok(self.ctx.has_own_property_fn());
            }
        }

        let result = target.get(key, receiver)?;

        if is_non_trackable(key) {
            return Ok(result);
        }

        if !variant.is_readonly() {
            self.ctx.track(target, TrackOp::Get, &DepKey::from(key));
        }

        if variant.is_shallow() {
            return Ok(result);
        }

        if is_object(&result) {
            return Ok(self.ctx.wrap(&result, variant.nested()));
        }

        Ok(result)
    }

    /// `RAW` is only answered for the registered view itself or for a
    /// receiver sharing the target's prototype
    fn authorizes_raw(&self, target: &ObjectRef, receiver: &Value) -> bool {
        let Some(receiver) = receiver.as_object() else {
            return false;
        };
        let registered = self
            .ctx
            .registry(self.variant)
            .get(target)
            .is_some_and(|view| view.ptr_eq(receiver));
        if registered {
            return true;
        }
        match (target.get_prototype_of(), receiver.get_prototype_of()) {
            (Some(a), Some(b)) => a.ptr_eq(&b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Drop for BaseHandler {
    fn drop(&mut self) {
        self.ctx.registry(self.variant).evict(self.raw_id);
    }
}

/// Trap set of the mutable variants
pub(crate) struct MutableHandler {
    base: BaseHandler,
}

impl ProxyHandler for MutableHandler {
    fn get(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        self.base.read(target, key, receiver)
    }

    fn set(
        &self,
        target: &ObjectRef,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool> {
        let target_value = Value::Object(target.clone());
        let mut old_value = target.get(key, &target_value)?;
        let mut value = value;
        if !self.base.variant.is_shallow() && !is_shallow_view(&value) && !is_readonly_view(&value)
        {
            old_value = unwrap(&old_value);
            value = unwrap(&value);
        }

        let had_key = match key.as_index() {
            Some(index) if target.is_array() && is_integer_key(key) => {
                index < length_of(&target_value)?
            }
            _ => has_own(&target_value, key),
        };

        let result = target.set(key, value.clone(), receiver)?;

        // Writes that merely pass through this view on a prototype chain
        // belong to the receiver, not to this target.
        if unwrap(receiver).ptr_eq(&target_value) {
            let dep = DepKey::from(key);
            if !had_key {
                self.base
                    .ctx
                    .trigger(target, TriggerOp::Add, Some(&dep), Some(&value), None);
            } else if has_changed(&value, &old_value) {
                self.base.ctx.trigger(
                    target,
                    TriggerOp::Set,
                    Some(&dep),
                    Some(&value),
                    Some(&old_value),
                );
            }
        }
        Ok(result)
    }

    fn has(&self, target: &ObjectRef, key: &PropertyKey) -> Result<bool> {
        let result = target.has(key)?;
        if !key.as_symbol().is_some_and(|symbol| symbol.is_well_known()) {
            self.base.ctx.track(target, TrackOp::Has, &DepKey::from(key));
        }
        Ok(result)
    }

    fn delete_property(&self, target: &ObjectRef, key: &PropertyKey) -> Result<bool> {
        let own = target.get_own_property(key);
        let result = target.delete(key)?;
        if let Some(property) = own {
            if result {
                self.base.ctx.trigger(
                    target,
                    TriggerOp::Delete,
                    Some(&DepKey::from(key)),
                    None,
                    property.value(),
                );
            }
        }
        Ok(result)
    }

    fn own_keys(&self, target: &ObjectRef) -> Result<Vec<PropertyKey>> {
        self.base.ctx.track(target, TrackOp::Iterate, &DepKey::Iterate);
        target.own_keys()
    }
}

/// Trap set of the readonly variants
pub(crate) struct ReadonlyHandler {
    base: BaseHandler,
}

impl ReadonlyHandler {
    fn refuse(&self, operation: &str, target: &ObjectRef, key: &PropertyKey) {
        if self.base.ctx.config().warn_on_readonly_mutation {
            tracing::warn!(
                key = %key,
                target = ?target,
                variant = %self.base.variant,
                "{} operation on key `{}` failed: target is readonly",
                operation,
                key
            );
        }
    }
}

impl ProxyHandler for ReadonlyHandler {
    fn get(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        self.base.read(target, key, receiver)
    }

    fn set(
        &self,
        target: &ObjectRef,
        key: &PropertyKey,
        _value: Value,
        _receiver: &Value,
    ) -> Result<bool> {
        self.refuse("Set", target, key);
        Ok(true)
    }

    fn delete_property(&self, target: &ObjectRef, key: &PropertyKey) -> Result<bool> {
        self.refuse("Delete", target, key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_shared::Symbol;

    #[test]
    fn test_non_trackable_keys() {
        assert!(is_non_trackable(&"__proto__".into()));
        assert!(is_non_trackable(&Symbol::ITERATOR.into()));
        assert!(is_non_trackable(&Symbol::TO_STRING_TAG.into()));
        assert!(!is_non_trackable(&Symbol::new("user").into()));
        assert!(!is_non_trackable(&"proto".into()));
    }

    #[test]
    fn test_raw_access_requires_authorized_receiver() {
        struct Forge;
        impl ProxyHandler for Forge {}

        let ctx = Reactivity::new();
        let raw = Value::object([("a", Value::from(1))]);
        let view = ctx.wrap_mutable_deep(&raw);

        assert!(view.get(ReactiveFlag::Raw.key()).unwrap().ptr_eq(&raw));

        // a receiver with an unrelated prototype is refused
        let stranger = Value::from(ObjectRef::with_prototype(None));
        let target = raw.as_object().unwrap();
        let via_stranger = view
            .as_object()
            .unwrap()
            .get(&ReactiveFlag::Raw.key(), &stranger)
            .unwrap();
        assert!(via_stranger.is_undefined());

        // a hand-built proxy over the same target shares its prototype
        let forged = Value::from(ObjectRef::new_proxy(target.clone(), Rc::new(Forge)));
        let via_forged = view
            .as_object()
            .unwrap()
            .get(&ReactiveFlag::Raw.key(), &forged)
            .unwrap();
        assert!(via_forged.ptr_eq(&raw));
    }
}
