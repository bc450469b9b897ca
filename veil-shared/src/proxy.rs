//! Proxy handlers
//!
//! A proxy object forwards its `get`, `set`, `has`, `delete` and `own_keys`
//! operations to a [`ProxyHandler`]. Every trap defaults to plain forwarding,
//! so a handler only overrides what it intercepts.

use crate::error::Result;
use crate::key::PropertyKey;
use crate::object::ObjectRef;
use crate::value::Value;

/// Trap set for a proxy object
pub trait ProxyHandler {
    fn get(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        target.get(key, receiver)
    }

    fn set(
        &self,
        target: &ObjectRef,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool> {
        target.set(key, value, receiver)
    }

    fn has(&self, target: &ObjectRef, key: &PropertyKey) -> Result<bool> {
        target.has(key)
    }

    fn delete_property(&self, target: &ObjectRef, key: &PropertyKey) -> Result<bool> {
        target.delete(key)
    }

    fn own_keys(&self, target: &ObjectRef) -> Result<Vec<PropertyKey>> {
        target.own_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Spy {
        log: RefCell<Vec<String>>,
    }

    impl ProxyHandler for Spy {
        fn get(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
            self.log.borrow_mut().push(format!("get {}", key));
            target.get(key, receiver)
        }
    }

    #[test]
    fn test_forwarding_defaults() {
        let target = ObjectRef::from_entries([("a", Value::from(1))]);
        let spy = Rc::new(Spy::default());
        let proxy = Value::from(ObjectRef::new_proxy(target.clone(), spy.clone()));

        assert_eq!(proxy.get("a").unwrap(), Value::from(1));
        proxy.set("b", 2).unwrap();
        assert!(proxy.has("b").unwrap());
        assert_eq!(Value::from(target.clone()).get("b").unwrap(), Value::from(2));
        assert!(proxy.delete("a").unwrap());
        assert!(target.get_own_property(&"a".into()).is_none());

        assert_eq!(spy.log.borrow().as_slice(), ["get a"]);
    }

    #[test]
    fn test_proxy_is_array_and_prototype() {
        let target = ObjectRef::new_array(vec![]);
        let proxy = ObjectRef::new_proxy(target.clone(), Rc::new(Spy::default()));

        assert!(proxy.is_array());
        assert!(proxy.is_proxy());
        assert!(proxy.get_prototype_of().unwrap().ptr_eq(&target.get_prototype_of().unwrap()));
    }
}
