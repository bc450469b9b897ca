//! Iterator protocol
//!
//! Array iterators are plain objects with a native `next` method returning
//! `{ value, done }` result objects, plus a `[Symbol.iterator]` method
//! returning the iterator itself.

use crate::array::length_of;
use crate::error::Result;
use crate::function::function;
use crate::object::{ObjectRef, Property};
use crate::symbol::Symbol;
use crate::value::Value;
use std::cell::Cell;
use std::rc::Rc;

/// What an array iterator yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    Keys,
    Values,
    /// `[index, value]` pairs
    Entries,
}

/// Iterator over `array`, reading through its `get` on every step
pub fn create_array_iterator(array: Value, kind: IterationKind) -> Value {
    let position = Rc::new(Cell::new(0usize));
    let next = function("next", 0, move |_, _| {
        let index = position.get();
        if index >= length_of(&array)? {
            return Ok(iter_result(Value::Undefined, true));
        }
        position.set(index + 1);
        let value = match kind {
            IterationKind::Keys => Value::from(index),
            IterationKind::Values => array.get(index)?,
            IterationKind::Entries => Value::array(vec![Value::from(index), array.get(index)?]),
        };
        Ok(iter_result(value, false))
    });

    let iterator = ObjectRef::new_object();
    iterator.insert_builtin("next", Property::hidden(next));
    iterator.insert_builtin(
        Symbol::ITERATOR,
        Property::hidden(function("[Symbol.iterator]", 0, |this, _| Ok(this.clone()))),
    );
    Value::from(iterator)
}

/// `{ value, done }`
pub fn iter_result(value: Value, done: bool) -> Value {
    Value::object([("value", value), ("done", Value::from(done))])
}

/// Drain an iterable into a vector
pub fn iterate(iterable: &Value) -> Result<Vec<Value>> {
    let iterator = iterable.call_method(Symbol::ITERATOR, &[])?;
    let mut out = Vec::new();
    loop {
        let step = iterator.call_method("next", &[])?;
        if step.get("done")?.truthy() {
            return Ok(out);
        }
        out.push(step.get("value")?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterator_sees_appended_elements() {
        let list = Value::array(vec![1.into()]);
        let iterator = create_array_iterator(list.clone(), IterationKind::Values);

        let first = iterator.call_method("next", &[]).unwrap();
        assert_eq!(first.get("value").unwrap(), Value::from(1));

        list.call_method("push", &[2.into()]).unwrap();
        let second = iterator.call_method("next", &[]).unwrap();
        assert_eq!(second.get("value").unwrap(), Value::from(2));

        let done = iterator.call_method("next", &[]).unwrap();
        assert_eq!(done.get("done").unwrap(), Value::from(true));
    }

    #[test]
    fn test_iterator_is_iterable() {
        let iterator = create_array_iterator(Value::array(vec!["a".into()]), IterationKind::Values);
        assert_eq!(iterate(&iterator).unwrap(), vec![Value::from("a")]);
    }
}
