//! Replacement array methods for mutable views
//!
//! Reading an array method through a mutable view yields one of the
//! functions below instead of the native one. Each family fixes a specific
//! problem with running the native method through the trap set:
//!
//! | family          | methods                                              | treatment |
//! |-----------------|------------------------------------------------------|-----------|
//! | callback        | `forEach map filter every some find findIndex findLast findLastIndex` | native on raw, callback sees views |
//! | length-mutating | `push pop shift unshift splice`                      | tracking paused, triggers batched |
//! | search          | `includes indexOf lastIndexOf`                       | raw search, retried with raw argument and raw elements |
//! | fold            | `reduce reduceRight`                                 | like callback, array argument is the call-site array |
//! | copy            | `concat join toReversed toSorted toSpliced`          | raw read, no element wrapping |
//! | iterator        | `values entries [Symbol.iterator]`                   | yielded values wrapped |
//!
//! Whole-array reads register a single [`DepKey::ArrayIterate`] dependency
//! instead of one per index.

use crate::dep::DepKey;
use crate::flags::TrackOp;
use crate::reactive::{is_shallow_view, is_wrapped, unwrap, Reactivity, ReactivityInner};
use std::collections::HashMap;
use std::rc::Weak;
use veil_shared::intrinsics::array_prototype;
use veil_shared::{
    arg, function, has_own, is_array, IterationKind, PropertyKey, Result, Symbol, Value,
};

/// An instrumented array method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayMethod {
    Iterator,
    Concat,
    Entries,
    Every,
    Filter,
    Find,
    FindIndex,
    FindLast,
    FindLastIndex,
    ForEach,
    Includes,
    IndexOf,
    Join,
    LastIndexOf,
    Map,
    Pop,
    Push,
    Reduce,
    ReduceRight,
    Shift,
    Some,
    Splice,
    ToReversed,
    ToSorted,
    ToSpliced,
    Unshift,
    Values,
}

/// How a callback method's result is rewrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultWrap {
    /// Index, boolean or freshly computed value
    None,
    /// A single element
    Element,
    /// A new array of elements
    Elements,
}

/// Treatment family of an instrumented method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodCategory {
    Callback(ResultWrap),
    LengthMutating,
    Search,
    Fold,
    Copy,
    Iterator(IterationKind),
}

impl ArrayMethod {
    pub const ALL: [ArrayMethod; 27] = [
        ArrayMethod::Iterator,
        ArrayMethod::Concat,
        ArrayMethod::Entries,
        ArrayMethod::Every,
        ArrayMethod::Filter,
        ArrayMethod::Find,
        ArrayMethod::FindIndex,
        ArrayMethod::FindLast,
        ArrayMethod::FindLastIndex,
        ArrayMethod::ForEach,
        ArrayMethod::Includes,
        ArrayMethod::IndexOf,
        ArrayMethod::Join,
        ArrayMethod::LastIndexOf,
        ArrayMethod::Map,
        ArrayMethod::Pop,
        ArrayMethod::Push,
        ArrayMethod::Reduce,
        ArrayMethod::ReduceRight,
        ArrayMethod::Shift,
        ArrayMethod::Some,
        ArrayMethod::Splice,
        ArrayMethod::ToReversed,
        ArrayMethod::ToSorted,
        ArrayMethod::ToSpliced,
        ArrayMethod::Unshift,
        ArrayMethod::Values,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArrayMethod::Iterator => "[Symbol.iterator]",
            ArrayMethod::Concat => "concat",
            ArrayMethod::Entries => "entries",
            ArrayMethod::Every => "every",
            ArrayMethod::Filter => "filter",
            ArrayMethod::Find => "find",
            ArrayMethod::FindIndex => "findIndex",
            ArrayMethod::FindLast => "findLast",
            ArrayMethod::FindLastIndex => "findLastIndex",
            ArrayMethod::ForEach => "forEach",
            ArrayMethod::Includes => "includes",
            ArrayMethod::IndexOf => "indexOf",
            ArrayMethod::Join => "join",
            ArrayMethod::LastIndexOf => "lastIndexOf",
            ArrayMethod::Map => "map",
            ArrayMethod::Pop => "pop",
            ArrayMethod::Push => "push",
            ArrayMethod::Reduce => "reduce",
            ArrayMethod::ReduceRight => "reduceRight",
            ArrayMethod::Shift => "shift",
            ArrayMethod::Some => "some",
            ArrayMethod::Splice => "splice",
            ArrayMethod::ToReversed => "toReversed",
            ArrayMethod::ToSorted => "toSorted",
            ArrayMethod::ToSpliced => "toSpliced",
            ArrayMethod::Unshift => "unshift",
            ArrayMethod::Values => "values",
        }
    }

    /// Property key the method lives under
    pub fn key(self) -> PropertyKey {
        match self {
            ArrayMethod::Iterator => PropertyKey::Symbol(Symbol::ITERATOR),
            other => PropertyKey::from(other.name()),
        }
    }

    pub fn from_key(key: &PropertyKey) -> Option<Self> {
        match key {
            PropertyKey::Symbol(symbol) => (*symbol == Symbol::ITERATOR).then_some(ArrayMethod::Iterator),
            PropertyKey::String(name) => Self::ALL
                .into_iter()
                .find(|method| *method != ArrayMethod::Iterator && method.name() == &**name),
        }
    }

    pub fn category(self) -> MethodCategory {
        use ArrayMethod::*;
        match self {
            ForEach | Map | Every | Some | FindIndex | FindLastIndex => {
                MethodCategory::Callback(ResultWrap::None)
            }
            Find | FindLast => MethodCategory::Callback(ResultWrap::Element),
            Filter => MethodCategory::Callback(ResultWrap::Elements),
            Push | Pop | Shift | Unshift | Splice => MethodCategory::LengthMutating,
            Includes | IndexOf | LastIndexOf => MethodCategory::Search,
            Reduce | ReduceRight => MethodCategory::Fold,
            Concat | Join | ToReversed | ToSorted | ToSpliced => MethodCategory::Copy,
            Values | Iterator => MethodCategory::Iterator(IterationKind::Values),
            Entries => MethodCategory::Iterator(IterationKind::Entries),
        }
    }
}

/// Function objects handed out by mutable views, one per method per context
pub(crate) struct Instrumentations {
    methods: HashMap<ArrayMethod, Value>,
    has_own_property: Value,
}

impl Instrumentations {
    /// Closures hold the context weakly: the context owns this table
    pub(crate) fn new(ctx: Weak<ReactivityInner>) -> Self {
        let methods = ArrayMethod::ALL
            .into_iter()
            .map(|method| {
                let ctx = ctx.clone();
                let f = function(method.name(), 0, move |this, args| {
                    Reactivity::upgrade(&ctx)?.call_array_method(method, this, args)
                });
                (method, f)
            })
            .collect();

        let has_own_property = function("hasOwnProperty", 1, move |this, args| {
            Reactivity::upgrade(&ctx)?.has_own_property(this, args)
        });

        Instrumentations {
            methods,
            has_own_property,
        }
    }

    pub(crate) fn method(&self, method: ArrayMethod) -> Value {
        self.methods.get(&method).cloned().unwrap_or_default()
    }

    pub(crate) fn has_own_property(&self) -> Value {
        self.has_own_property.clone()
    }
}

impl Reactivity {
    fn call_array_method(&self, method: ArrayMethod, this: &Value, args: &[Value]) -> Result<Value> {
        match method.category() {
            MethodCategory::Callback(wrap) => self.apply(method, this, args, wrap),
            MethodCategory::LengthMutating => self.no_tracking(method, this, args),
            MethodCategory::Search => self.search(method, this, args),
            MethodCategory::Fold => self.fold(method, this, args),
            MethodCategory::Copy => self.copy(method, this, args),
            MethodCategory::Iterator(kind) => self.iterator(method, this, kind),
        }
    }

    /// Raw array behind `array`, with one whole-array dependency registered
    fn shallow_read_array(&self, array: &Value) -> Value {
        let raw = unwrap(array);
        if let Some(obj) = raw.as_object() {
            self.track(obj, TrackOp::Iterate, &DepKey::ArrayIterate);
        }
        raw
    }

    /// Like [`shallow_read_array`](Self::shallow_read_array), but raw input
    /// is not tracked
    fn reactive_read_array(&self, array: &Value) -> Value {
        let raw = unwrap(array);
        if raw.ptr_eq(array) {
            return raw;
        }
        if let Some(obj) = raw.as_object() {
            self.track(obj, TrackOp::Iterate, &DepKey::ArrayIterate);
        }
        raw
    }

    fn apply(&self, method: ArrayMethod, this: &Value, args: &[Value], wrap: ResultWrap) -> Result<Value> {
        let arr = self.shallow_read_array(this);
        let needs_wrap = !arr.ptr_eq(this) && !is_shallow_view(this);
        let key = method.key();

        let method_fn = arr.get(&key)?;
        let native = array_prototype().get(&key, &arr)?;
        if !method_fn.ptr_eq(&native) {
            // overridden on the instance
            let result = method_fn.call(this, args)?;
            return Ok(if needs_wrap {
                self.to_reactive(result)
            } else {
                result
            });
        }

        let callback = arg(args, 0);
        let callback = if !arr.ptr_eq(this) && callback.is_callable() {
            let ctx = self.clone();
            let view = this.clone();
            function(method.name(), 3, move |cb_this, cb_args| {
                let item = arg(cb_args, 0);
                let item = if needs_wrap { ctx.to_reactive(item) } else { item };
                callback.call(cb_this, &[item, arg(cb_args, 1), view.clone()])
            })
        } else {
            callback
        };

        let result = method_fn.call(&arr, &[callback, arg(args, 1)])?;
        if !needs_wrap {
            return Ok(result);
        }
        Ok(match wrap {
            ResultWrap::None => result,
            ResultWrap::Element => self.to_reactive(result),
            ResultWrap::Elements => match result.as_object().and_then(|obj| obj.elements()) {
                Some(elements) => Value::array(
                    elements
                        .into_iter()
                        .map(|element| self.to_reactive(element))
                        .collect(),
                ),
                None => result,
            },
        })
    }

    /// Run a length-mutating method with tracking paused and, when
    /// configured, triggers batched until it returns
    fn no_tracking(&self, method: ArrayMethod, this: &Value, args: &[Value]) -> Result<Value> {
        let batch = self.config().defer_array_mutation_notifications;
        self.pause_tracking();
        if batch {
            self.start_batch();
        }
        let result = unwrap(this)
            .get(method.key())
            .and_then(|native| native.call(this, args));
        if batch {
            self.end_batch();
        }
        self.reset_tracking();
        result
    }

    fn search(&self, method: ArrayMethod, this: &Value, args: &[Value]) -> Result<Value> {
        let arr = unwrap(this);
        if let Some(obj) = arr.as_object() {
            self.track(obj, TrackOp::Iterate, &DepKey::ArrayIterate);
        }
        let result = arr.call_method(method.key(), args)?;

        let needle = arg(args, 0);
        let retry = self.config().retry_search_with_raw && needle.as_object().is_some();
        if !retry || !is_not_found(&result) {
            return Ok(result);
        }
        let mut raw_args = args.to_vec();
        if let Some(first) = raw_args.first_mut() {
            *first = unwrap(&needle);
        }
        if is_wrapped(&needle) {
            let result = arr.call_method(method.key(), &raw_args)?;
            if !is_not_found(&result) {
                return Ok(result);
            }
        }

        // Views stored in the array itself are compared by their raw object.
        let Some(elements) = arr.as_object().and_then(|obj| obj.elements()) else {
            return Ok(result);
        };
        if !elements.iter().any(is_wrapped) {
            return Ok(result);
        }
        let unwrapped = Value::array(elements.iter().map(unwrap).collect());
        unwrapped.call_method(method.key(), &raw_args)
    }

    fn fold(&self, method: ArrayMethod, this: &Value, args: &[Value]) -> Result<Value> {
        let arr = self.shallow_read_array(this);
        let mut call_args = args.to_vec();
        let callback = arg(args, 0);
        if !arr.ptr_eq(this) && callback.is_callable() {
            let ctx = self.clone();
            let view = this.clone();
            let wrap_items = !is_shallow_view(this);
            let wrapped = function(method.name(), 4, move |cb_this, cb_args| {
                let item = arg(cb_args, 1);
                let item = if wrap_items { ctx.to_reactive(item) } else { item };
                callback.call(
                    cb_this,
                    &[arg(cb_args, 0), item, arg(cb_args, 2), view.clone()],
                )
            });
            if let Some(first) = call_args.first_mut() {
                *first = wrapped;
            }
        }
        arr.call_method(method.key(), &call_args)
    }

    fn copy(&self, method: ArrayMethod, this: &Value, args: &[Value]) -> Result<Value> {
        let arr = self.reactive_read_array(this);
        let args: Vec<Value> = if method == ArrayMethod::Concat {
            args.iter()
                .map(|item| {
                    if is_array(item) {
                        self.reactive_read_array(item)
                    } else {
                        item.clone()
                    }
                })
                .collect()
        } else {
            args.to_vec()
        };
        arr.call_method(method.key(), &args)
    }

    fn iterator(&self, method: ArrayMethod, this: &Value, kind: IterationKind) -> Result<Value> {
        let arr = self.shallow_read_array(this);
        let iter = arr.call_method(method.key(), &[])?;
        if arr.ptr_eq(this) || is_shallow_view(this) {
            return Ok(iter);
        }

        let next = iter.get("next")?;
        let ctx = self.clone();
        let wrapped_next = function("next", 0, move |iter_this, _| {
            let step = next.call(iter_this, &[])?;
            if step.get("done")?.truthy() {
                return Ok(step);
            }
            let value = step.get("value")?;
            match kind {
                IterationKind::Entries => {
                    let element = value.get(1)?;
                    value.set(1, ctx.to_reactive(element))?;
                }
                _ => {
                    step.set("value", ctx.to_reactive(value))?;
                }
            }
            Ok(step)
        });
        iter.set("next", wrapped_next)?;
        Ok(iter)
    }

    /// `hasOwnProperty` as seen through mutable views: tracked as `has`
    fn has_own_property(&self, this: &Value, args: &[Value]) -> Result<Value> {
        let key = arg(args, 0).to_property_key();
        let raw = unwrap(this);
        let Some(obj) = raw.as_object() else {
            return Ok(Value::from(false));
        };
        self.track(obj, TrackOp::Has, &DepKey::from(&key));
        Ok(Value::from(has_own(&raw, key)))
    }
}

fn is_not_found(result: &Value) -> bool {
    *result == Value::from(-1) || *result == Value::from(false)
}
