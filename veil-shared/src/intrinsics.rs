//! Per-thread built-in prototypes
//!
//! `Object.prototype` carries `hasOwnProperty` and the `__proto__` accessor;
//! `Array.prototype` inherits from it and carries the native array methods.
//! Objects are `Rc`-based, so each thread owns its own set.

use crate::array;
use crate::function::{arg, function};
use crate::object::{ObjectRef, Property, Slot};
use crate::value::Value;

struct Intrinsics {
    object_prototype: ObjectRef,
    array_prototype: ObjectRef,
}

thread_local! {
    static INTRINSICS: Intrinsics = Intrinsics::new();
}

impl Intrinsics {
    fn new() -> Self {
        // Built with explicit prototypes: `new_object`/`new_array` would
        // re-enter this initializer.
        let object_prototype = ObjectRef::with_prototype(None);
        object_prototype.insert_builtin(
            "hasOwnProperty",
            Property::hidden(function("hasOwnProperty", 1, |this, args| {
                let key = arg(args, 0).to_property_key();
                let own = this
                    .as_object()
                    .is_some_and(|obj| obj.get_own_property(&key).is_some());
                Ok(Value::from(own))
            })),
        );
        object_prototype.insert_builtin(
            "__proto__",
            Property {
                slot: Slot::Accessor {
                    get: Some(function("get __proto__", 0, |this, _| {
                        Ok(Value::from(this.as_object().and_then(ObjectRef::get_prototype_of)))
                    })),
                    set: Some(function("set __proto__", 1, |this, args| {
                        let prototype = match arg(args, 0) {
                            Value::Object(obj) => Some(obj),
                            Value::Null => None,
                            _ => return Ok(Value::Undefined),
                        };
                        if let Some(obj) = this.as_object() {
                            obj.set_prototype_of(prototype);
                        }
                        Ok(Value::Undefined)
                    })),
                },
                enumerable: false,
            },
        );

        let array_prototype = ObjectRef::with_prototype(Some(object_prototype.clone()));
        array::install(&array_prototype);

        Intrinsics {
            object_prototype,
            array_prototype,
        }
    }
}

pub fn object_prototype() -> ObjectRef {
    INTRINSICS.with(|intrinsics| intrinsics.object_prototype.clone())
}

pub fn array_prototype() -> ObjectRef {
    INTRINSICS.with(|intrinsics| intrinsics.array_prototype.clone())
}
