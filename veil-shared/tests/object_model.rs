use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use veil_shared::{
    for_in_keys, function, has_changed, iterate, object_keys, ObjectRef, PropertyKey,
    ProxyHandler, Result, Value,
};

/// Handler that records the keys it sees and otherwise forwards
#[derive(Default)]
struct KeyLog {
    keys: RefCell<Vec<String>>,
}

impl ProxyHandler for KeyLog {
    fn get(&self, target: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        self.keys.borrow_mut().push(format!("get {}", key));
        target.get(key, receiver)
    }

    fn set(
        &self,
        target: &ObjectRef,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool> {
        self.keys.borrow_mut().push(format!("set {}", key));
        target.set(key, value, receiver)
    }
}

#[test]
fn test_native_push_through_proxy_reads_and_writes_via_traps() {
    let raw = ObjectRef::new_array(vec![1.into()]);
    let log = Rc::new(KeyLog::default());
    let proxy = Value::from(ObjectRef::new_proxy(raw.clone(), log.clone()));

    proxy.call_method("push", &[2.into()]).unwrap();

    assert_eq!(raw.elements().unwrap(), vec![Value::from(1), Value::from(2)]);
    assert_eq!(
        log.keys.borrow().as_slice(),
        ["get push", "get length", "set 1", "set length"]
    );
}

#[test]
fn test_getter_runs_with_proxy_receiver() {
    let raw = ObjectRef::from_entries([("first", Value::from("Ada")), ("last", Value::from("L"))]);
    raw.define_accessor(
        "full",
        Some(function("full", 0, |this, _| {
            Ok(Value::from(format!(
                "{} {}",
                this.get("first")?.to_display_string()?,
                this.get("last")?.to_display_string()?
            )))
        })),
        None,
    )
    .unwrap();
    let log = Rc::new(KeyLog::default());
    let proxy = Value::from(ObjectRef::new_proxy(raw, log.clone()));

    assert_eq!(proxy.get("full").unwrap(), Value::from("Ada L"));
    assert_eq!(log.keys.borrow().as_slice(), ["get full", "get first", "get last"]);
}

#[test]
fn test_enumeration_skips_hidden_and_symbol_keys() {
    let obj = ObjectRef::from_entries([("a", Value::from(1))]);
    obj.define_hidden("hidden", Value::from(2)).unwrap();
    obj.define_hidden(veil_shared::Symbol::new("tag"), Value::from(3)).unwrap();

    let keys: Vec<String> = object_keys(&obj).unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(keys, ["a"]);
    assert_eq!(for_in_keys(&obj).unwrap().len(), 1);
}

#[test]
fn test_json_fixture_iterates() {
    let list = Value::from_json(&serde_json::json!([1, "two", null]));
    let items = iterate(&list).unwrap();
    assert_eq!(items, vec![Value::from(1), Value::from("two"), Value::Null]);
}

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
    Shift,
    Unshift(i32),
    Splice(usize, usize, Vec<i32>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Push),
        Just(Op::Pop),
        Just(Op::Shift),
        any::<i32>().prop_map(Op::Unshift),
        (0usize..8, 0usize..4, prop::collection::vec(any::<i32>(), 0..3))
            .prop_map(|(start, count, items)| Op::Splice(start, count, items)),
    ]
}

proptest! {
    #[test]
    fn prop_mutators_match_vec_model(ops in prop::collection::vec(op(), 0..24)) {
        let list = Value::array(vec![]);
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(n) => {
                    list.call_method("push", &[n.into()]).unwrap();
                    model.push(n);
                }
                Op::Pop => {
                    list.call_method("pop", &[]).unwrap();
                    model.pop();
                }
                Op::Shift => {
                    list.call_method("shift", &[]).unwrap();
                    if !model.is_empty() {
                        model.remove(0);
                    }
                }
                Op::Unshift(n) => {
                    list.call_method("unshift", &[n.into()]).unwrap();
                    model.insert(0, n);
                }
                Op::Splice(start, count, items) => {
                    let mut args: Vec<Value> = vec![start.into(), count.into()];
                    args.extend(items.iter().map(|&n| Value::from(n)));
                    list.call_method("splice", &args).unwrap();
                    let start = start.min(model.len());
                    let end = (start + count).min(model.len());
                    model.splice(start..end, items);
                }
            }
        }

        let actual: Vec<Value> = list.as_object().unwrap().elements().unwrap();
        let expected: Vec<Value> = model.into_iter().map(Value::from).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_has_changed_is_reflexive_false(n in any::<f64>()) {
        prop_assert!(!has_changed(&Value::from(n), &Value::from(n)));
    }
}
