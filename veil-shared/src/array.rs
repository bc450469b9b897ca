//! Native `Array.prototype` methods
//!
//! Every method is written against the generic internal operations of its
//! `this` value (`get`, `set`, `has`, `delete`), never against the element
//! vector directly. Run on a raw array they touch raw storage; run on a proxy
//! every step goes through the proxy's traps.

use crate::error::{ObjectError, Result};
use crate::function::{arg, function};
use crate::iter::{create_array_iterator, IterationKind};
use crate::object::{ObjectRef, Property};
use crate::symbol::Symbol;
use crate::value::{same_value_zero, Value};
use std::cmp::Ordering;

type Native = fn(&Value, &[Value]) -> Result<Value>;

const METHODS: &[(&str, usize, Native)] = &[
    ("push", 1, push),
    ("pop", 0, pop),
    ("shift", 0, shift),
    ("unshift", 1, unshift),
    ("splice", 2, splice),
    ("forEach", 1, for_each),
    ("map", 1, map),
    ("filter", 1, filter),
    ("every", 1, every),
    ("some", 1, some),
    ("find", 1, find),
    ("findIndex", 1, find_index),
    ("findLast", 1, find_last),
    ("findLastIndex", 1, find_last_index),
    ("includes", 1, includes),
    ("indexOf", 1, index_of),
    ("lastIndexOf", 1, last_index_of),
    ("reduce", 1, reduce),
    ("reduceRight", 1, reduce_right),
    ("concat", 1, concat),
    ("join", 1, join),
    ("toReversed", 0, to_reversed),
    ("toSorted", 1, to_sorted),
    ("toSpliced", 2, to_spliced),
    ("keys", 0, keys),
    ("entries", 0, entries),
];

/// Populate `Array.prototype`
pub(crate) fn install(prototype: &ObjectRef) {
    for &(name, arity, native) in METHODS {
        prototype.insert_builtin(name, Property::hidden(function(name, arity, native)));
    }
    let values_fn = function("values", 0, values);
    prototype.insert_builtin("values", Property::hidden(values_fn.clone()));
    prototype.insert_builtin(Symbol::ITERATOR, Property::hidden(values_fn));
}

/// `length` of any array-like value
pub fn length_of(this: &Value) -> Result<usize> {
    Ok(to_length(this.get("length")?.to_number()))
}

fn to_length(n: f64) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc().min(u32::MAX as f64) as usize
    }
}

/// Resolve a possibly negative relative index against `len`, clamped to
/// `0..=len`
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn callback(args: &[Value], method: &str) -> Result<Value> {
    let f = arg(args, 0);
    if !f.is_callable() {
        return Err(ObjectError::type_error(format!(
            "{}: {:?} is not a function",
            method, f
        )));
    }
    Ok(f)
}

fn element_count(args: &[Value], len: usize) -> usize {
    match args.get(1) {
        None => len,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() || n <= 0.0 {
                0
            } else {
                n.trunc().min(len as f64) as usize
            }
        }
    }
}

/// Shift elements `from..len` so that index `from` lands at `to`
fn move_element(this: &Value, from: usize, to: usize) -> Result<()> {
    if this.has(from)? {
        this.set(to, this.get(from)?)?;
    } else {
        this.delete(to)?;
    }
    Ok(())
}

fn push(this: &Value, args: &[Value]) -> Result<Value> {
    let len = length_of(this)?;
    for (offset, item) in args.iter().enumerate() {
        this.set(len + offset, item.clone())?;
    }
    let new_len = len + args.len();
    this.set("length", new_len)?;
    Ok(Value::from(new_len))
}

fn pop(this: &Value, _args: &[Value]) -> Result<Value> {
    let len = length_of(this)?;
    if len == 0 {
        this.set("length", 0)?;
        return Ok(Value::Undefined);
    }
    let last = len - 1;
    let element = this.get(last)?;
    this.delete(last)?;
    this.set("length", last)?;
    Ok(element)
}

fn shift(this: &Value, _args: &[Value]) -> Result<Value> {
    let len = length_of(this)?;
    if len == 0 {
        this.set("length", 0)?;
        return Ok(Value::Undefined);
    }
    let first = this.get(0)?;
    for k in 1..len {
        move_element(this, k, k - 1)?;
    }
    this.delete(len - 1)?;
    this.set("length", len - 1)?;
    Ok(first)
}

fn unshift(this: &Value, args: &[Value]) -> Result<Value> {
    let len = length_of(this)?;
    let count = args.len();
    if count > 0 {
        for k in (0..len).rev() {
            move_element(this, k, k + count)?;
        }
        for (j, item) in args.iter().enumerate() {
            this.set(j, item.clone())?;
        }
    }
    this.set("length", len + count)?;
    Ok(Value::from(len + count))
}

fn splice(this: &Value, args: &[Value]) -> Result<Value> {
    let len = length_of(this)?;
    let start = relative_index(&arg(args, 0), len, 0);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => element_count(args, len - start),
    };
    let items = args.get(2..).unwrap_or_default();

    let mut removed = Vec::with_capacity(delete_count);
    for k in 0..delete_count {
        removed.push(this.get(start + k)?);
    }

    let item_count = items.len();
    if item_count < delete_count {
        for k in start..(len - delete_count) {
            move_element(this, k + delete_count, k + item_count)?;
        }
        for k in ((len - delete_count + item_count)..len).rev() {
            this.delete(k)?;
        }
    } else if item_count > delete_count {
        for k in (start..(len - delete_count)).rev() {
            move_element(this, k + delete_count, k + item_count)?;
        }
    }
    for (j, item) in items.iter().enumerate() {
        this.set(start + j, item.clone())?;
    }
    this.set("length", len - delete_count + item_count)?;
    Ok(Value::array(removed))
}

fn for_each(this: &Value, args: &[Value]) -> Result<Value> {
    let f = callback(args, "forEach")?;
    let this_arg = arg(args, 1);
    for k in 0..length_of(this)? {
        f.call(&this_arg, &[this.get(k)?, Value::from(k), this.clone()])?;
    }
    Ok(Value::Undefined)
}

fn map(this: &Value, args: &[Value]) -> Result<Value> {
    let f = callback(args, "map")?;
    let this_arg = arg(args, 1);
    let len = length_of(this)?;
    let mut out = Vec::with_capacity(len);
    for k in 0..len {
        out.push(f.call(&this_arg, &[this.get(k)?, Value::from(k), this.clone()])?);
    }
    Ok(Value::array(out))
}

fn filter(this: &Value, args: &[Value]) -> Result<Value> {
    let f = callback(args, "filter")?;
    let this_arg = arg(args, 1);
    let mut out = Vec::new();
    for k in 0..length_of(this)? {
        let element = this.get(k)?;
        if f.call(&this_arg, &[element.clone(), Value::from(k), this.clone()])?.truthy() {
            out.push(element);
        }
    }
    Ok(Value::array(out))
}

/// First index (walking forwards or backwards) whose element satisfies the
/// callback, with the element itself
fn find_with(
    this: &Value,
    args: &[Value],
    method: &str,
    reverse: bool,
) -> Result<Option<(usize, Value)>> {
    let f = callback(args, method)?;
    let this_arg = arg(args, 1);
    let len = length_of(this)?;
    let indices: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };
    for k in indices {
        let element = this.get(k)?;
        if f.call(&this_arg, &[element.clone(), Value::from(k), this.clone()])?.truthy() {
            return Ok(Some((k, element)));
        }
    }
    Ok(None)
}

fn every(this: &Value, args: &[Value]) -> Result<Value> {
    let f = callback(args, "every")?;
    let this_arg = arg(args, 1);
    for k in 0..length_of(this)? {
        if !f.call(&this_arg, &[this.get(k)?, Value::from(k), this.clone()])?.truthy() {
            return Ok(Value::from(false));
        }
    }
    Ok(Value::from(true))
}

fn some(this: &Value, args: &[Value]) -> Result<Value> {
    Ok(Value::from(find_with(this, args, "some", false)?.is_some()))
}

fn find(this: &Value, args: &[Value]) -> Result<Value> {
    Ok(find_with(this, args, "find", false)?.map_or(Value::Undefined, |(_, v)| v))
}

fn find_index(this: &Value, args: &[Value]) -> Result<Value> {
    Ok(find_with(this, args, "findIndex", false)?.map_or(Value::from(-1), |(k, _)| Value::from(k)))
}

fn find_last(this: &Value, args: &[Value]) -> Result<Value> {
    Ok(find_with(this, args, "findLast", true)?.map_or(Value::Undefined, |(_, v)| v))
}

fn find_last_index(this: &Value, args: &[Value]) -> Result<Value> {
    Ok(find_with(this, args, "findLastIndex", true)?
        .map_or(Value::from(-1), |(k, _)| Value::from(k)))
}

fn includes(this: &Value, args: &[Value]) -> Result<Value> {
    let target = arg(args, 0);
    let len = length_of(this)?;
    for k in relative_index(&arg(args, 1), len, 0)..len {
        if same_value_zero(&this.get(k)?, &target) {
            return Ok(Value::from(true));
        }
    }
    Ok(Value::from(false))
}

fn index_of(this: &Value, args: &[Value]) -> Result<Value> {
    let target = arg(args, 0);
    let len = length_of(this)?;
    for k in relative_index(&arg(args, 1), len, 0)..len {
        if this.get(k)? == target {
            return Ok(Value::from(k));
        }
    }
    Ok(Value::from(-1))
}

fn last_index_of(this: &Value, args: &[Value]) -> Result<Value> {
    let target = arg(args, 0);
    let len = length_of(this)?;
    if len == 0 {
        return Ok(Value::from(-1));
    }
    let from = match args.get(1) {
        None => len - 1,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() {
                0
            } else if n < 0.0 {
                let shifted = len as f64 + n.trunc();
                if shifted < 0.0 {
                    return Ok(Value::from(-1));
                }
                shifted as usize
            } else {
                (n.trunc() as usize).min(len - 1)
            }
        }
    };
    for k in (0..=from).rev() {
        if this.get(k)? == target {
            return Ok(Value::from(k));
        }
    }
    Ok(Value::from(-1))
}

fn reduce_with(this: &Value, args: &[Value], method: &str, reverse: bool) -> Result<Value> {
    let f = callback(args, method)?;
    let len = length_of(this)?;
    let mut indices: Vec<usize> = (0..len).collect();
    if reverse {
        indices.reverse();
    }
    let mut indices = indices.into_iter();
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match indices.next() {
            Some(k) => this.get(k)?,
            None => {
                return Err(ObjectError::type_error(
                    "Reduce of empty array with no initial value",
                ))
            }
        },
    };
    for k in indices {
        accumulator = f.call(
            &Value::Undefined,
            &[accumulator, this.get(k)?, Value::from(k), this.clone()],
        )?;
    }
    Ok(accumulator)
}

fn reduce(this: &Value, args: &[Value]) -> Result<Value> {
    reduce_with(this, args, "reduce", false)
}

fn reduce_right(this: &Value, args: &[Value]) -> Result<Value> {
    reduce_with(this, args, "reduceRight", true)
}

fn collect(this: &Value) -> Result<Vec<Value>> {
    (0..length_of(this)?).map(|k| this.get(k)).collect()
}

fn concat(this: &Value, args: &[Value]) -> Result<Value> {
    let mut out = collect(this)?;
    for item in args {
        match item {
            Value::Object(obj) if obj.is_array() => out.extend(collect(item)?),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::array(out))
}

fn join(this: &Value, args: &[Value]) -> Result<Value> {
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        other => other.to_display_string()?,
    };
    let mut parts = Vec::new();
    for element in collect(this)? {
        parts.push(if element.is_nullish() {
            String::new()
        } else {
            element.to_display_string()?
        });
    }
    Ok(Value::from(parts.join(&separator)))
}

fn to_reversed(this: &Value, _args: &[Value]) -> Result<Value> {
    let mut out = collect(this)?;
    out.reverse();
    Ok(Value::array(out))
}

fn to_sorted(this: &Value, args: &[Value]) -> Result<Value> {
    let comparator = arg(args, 0);
    if !comparator.is_undefined() && !comparator.is_callable() {
        return Err(ObjectError::type_error(
            "The comparison function must be either a function or undefined",
        ));
    }
    let mut out = collect(this)?;
    let mut failure = None;
    if comparator.is_undefined() {
        let mut keyed = Vec::with_capacity(out.len());
        for element in out {
            let text = match &element {
                Value::Undefined => None,
                other => Some(other.to_display_string()?),
            };
            keyed.push((text, element));
        }
        // undefined sorts last
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.encode_utf16().cmp(b.encode_utf16()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        out = keyed.into_iter().map(|(_, element)| element).collect();
    } else {
        out.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            match comparator.call(&Value::Undefined, &[a.clone(), b.clone()]) {
                Ok(result) => result
                    .to_number()
                    .partial_cmp(&0.0)
                    .unwrap_or(Ordering::Equal),
                Err(err) => {
                    failure = Some(err);
                    Ordering::Equal
                }
            }
        });
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::array(out)),
    }
}

fn to_spliced(this: &Value, args: &[Value]) -> Result<Value> {
    let elements = collect(this)?;
    let len = elements.len();
    let start = relative_index(&arg(args, 0), len, 0);
    let skip = match args.len() {
        0 => 0,
        1 => len - start,
        _ => element_count(args, len - start),
    };
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&elements[..start]);
    out.extend_from_slice(args.get(2..).unwrap_or_default());
    out.extend_from_slice(&elements[start + skip..]);
    Ok(Value::array(out))
}

fn keys(this: &Value, _args: &[Value]) -> Result<Value> {
    Ok(create_array_iterator(this.clone(), IterationKind::Keys))
}

fn values(this: &Value, _args: &[Value]) -> Result<Value> {
    Ok(create_array_iterator(this.clone(), IterationKind::Values))
}

fn entries(this: &Value, _args: &[Value]) -> Result<Value> {
    Ok(create_array_iterator(this.clone(), IterationKind::Entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::iterate;

    fn nums(values: &[i32]) -> Value {
        Value::array(values.iter().map(|&n| Value::from(n)).collect())
    }

    fn to_vec(list: &Value) -> Vec<f64> {
        collect(list).unwrap().iter().map(Value::to_number).collect()
    }

    #[test]
    fn test_push_pop_shift_unshift() {
        let list = nums(&[1, 2, 3]);

        assert_eq!(list.call_method("push", &[4.into(), 5.into()]).unwrap(), Value::from(5));
        assert_eq!(list.call_method("pop", &[]).unwrap(), Value::from(5));
        assert_eq!(list.call_method("shift", &[]).unwrap(), Value::from(1));
        assert_eq!(list.call_method("unshift", &[0.into()]).unwrap(), Value::from(4));
        assert_eq!(to_vec(&list), [0.0, 2.0, 3.0, 4.0]);

        let empty = nums(&[]);
        assert!(empty.call_method("pop", &[]).unwrap().is_undefined());
    }

    #[test]
    fn test_splice() {
        let list = nums(&[1, 2, 3, 4, 5]);
        let removed = list
            .call_method("splice", &[1.into(), 2.into(), 9.into()])
            .unwrap();
        assert_eq!(to_vec(&removed), [2.0, 3.0]);
        assert_eq!(to_vec(&list), [1.0, 9.0, 4.0, 5.0]);

        list.call_method("splice", &[(-1).into(), 0.into(), 7.into(), 8.into()])
            .unwrap();
        assert_eq!(to_vec(&list), [1.0, 9.0, 4.0, 7.0, 8.0, 5.0]);

        let tail = list.call_method("splice", &[2.into()]).unwrap();
        assert_eq!(to_vec(&tail), [4.0, 7.0, 8.0, 5.0]);
        assert_eq!(to_vec(&list), [1.0, 9.0]);
    }

    #[test]
    fn test_callback_methods() {
        let list = nums(&[1, 2, 3, 4]);
        let even = function("even", 1, |_, args| Ok(Value::from(arg(args, 0).to_number() % 2.0 == 0.0)));

        assert_eq!(to_vec(&list.call_method("filter", &[even.clone()]).unwrap()), [2.0, 4.0]);
        assert_eq!(list.call_method("find", &[even.clone()]).unwrap(), Value::from(2));
        assert_eq!(list.call_method("findIndex", &[even.clone()]).unwrap(), Value::from(1));
        assert_eq!(list.call_method("findLast", &[even.clone()]).unwrap(), Value::from(4));
        assert_eq!(list.call_method("findLastIndex", &[even.clone()]).unwrap(), Value::from(3));
        assert_eq!(list.call_method("some", &[even.clone()]).unwrap(), Value::from(true));
        assert_eq!(list.call_method("every", &[even]).unwrap(), Value::from(false));

        let double = function("double", 1, |_, args| Ok(Value::from(arg(args, 0).to_number() * 2.0)));
        assert_eq!(to_vec(&list.call_method("map", &[double]).unwrap()), [2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_callback_must_be_callable() {
        let err = nums(&[1]).call_method("map", &[1.into()]).unwrap_err();
        assert!(matches!(err, ObjectError::Type(_)));
    }

    #[test]
    fn test_search_methods() {
        let list = Value::array(vec![1.into(), f64::NAN.into(), 1.into()]);

        assert_eq!(list.call_method("includes", &[f64::NAN.into()]).unwrap(), Value::from(true));
        assert_eq!(list.call_method("indexOf", &[f64::NAN.into()]).unwrap(), Value::from(-1));
        assert_eq!(list.call_method("indexOf", &[1.into()]).unwrap(), Value::from(0));
        assert_eq!(list.call_method("lastIndexOf", &[1.into()]).unwrap(), Value::from(2));
        assert_eq!(
            list.call_method("indexOf", &[1.into(), 1.into()]).unwrap(),
            Value::from(2)
        );
    }

    #[test]
    fn test_reduce() {
        let list = nums(&[1, 2, 3]);
        let concat = function("concat", 2, |_, args| {
            Ok(Value::from(format!(
                "{}{}",
                arg(args, 0).to_display_string()?,
                arg(args, 1).to_display_string()?
            )))
        });

        assert_eq!(list.call_method("reduce", &[concat.clone()]).unwrap(), Value::from("123"));
        assert_eq!(
            list.call_method("reduceRight", &[concat.clone(), "x".into()]).unwrap(),
            Value::from("x321")
        );

        let err = nums(&[]).call_method("reduce", &[concat]).unwrap_err();
        assert!(matches!(err, ObjectError::Type(_)));
    }

    #[test]
    fn test_copying_methods() {
        let list = nums(&[3, 1, 2]);

        let joined = list.call_method("concat", &[nums(&[4]), 5.into()]).unwrap();
        assert_eq!(to_vec(&joined), [3.0, 1.0, 2.0, 4.0, 5.0]);
        assert_eq!(list.call_method("join", &["-".into()]).unwrap(), Value::from("3-1-2"));
        assert_eq!(to_vec(&list.call_method("toReversed", &[]).unwrap()), [2.0, 1.0, 3.0]);
        assert_eq!(to_vec(&list.call_method("toSorted", &[]).unwrap()), [1.0, 2.0, 3.0]);
        assert_eq!(
            to_vec(&list.call_method("toSpliced", &[0.into(), 1.into(), 9.into()]).unwrap()),
            [9.0, 1.0, 2.0]
        );
        assert_eq!(to_vec(&list), [3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_to_sorted_with_comparator() {
        let list = nums(&[10, 9, 1]);
        let descending = function("desc", 2, |_, args| {
            Ok(Value::from(arg(args, 1).to_number() - arg(args, 0).to_number()))
        });
        assert_eq!(to_vec(&list.call_method("toSorted", &[descending]).unwrap()), [10.0, 9.0, 1.0]);
        // default order compares strings
        assert_eq!(to_vec(&list.call_method("toSorted", &[]).unwrap()), [1.0, 10.0, 9.0]);
    }

    #[test]
    fn test_iterators() {
        let list = nums(&[7, 8]);
        assert_eq!(iterate(&list).unwrap(), vec![Value::from(7), Value::from(8)]);

        let keys = iterate(&list.call_method("keys", &[]).unwrap()).unwrap();
        assert_eq!(keys, vec![Value::from(0), Value::from(1)]);

        let entries = iterate(&list.call_method("entries", &[]).unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].get(0).unwrap(), Value::from(1));
        assert_eq!(entries[1].get(1).unwrap(), Value::from(8));
    }
}
