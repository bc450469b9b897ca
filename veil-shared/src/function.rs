//! Native functions
//!
//! Functions are objects whose behaviour is a Rust closure receiving `this`
//! and the argument list.

use crate::error::Result;
use crate::object::ObjectRef;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// A callable backed by a Rust closure
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    arity: usize,
    call: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Rc<str>>,
        arity: usize,
        call: impl Fn(&Value, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            arity,
            call: Rc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.call)(this, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Allocate a function object
pub fn function(
    name: impl Into<Rc<str>>,
    arity: usize,
    call: impl Fn(&Value, &[Value]) -> Result<Value> + 'static,
) -> Value {
    Value::Object(ObjectRef::new_function(NativeFunction::new(name, arity, call)))
}

/// Positional argument, `undefined` when missing
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_receives_this_and_args() {
        let f = function("sum", 2, |this, args| {
            let base = this.as_number().unwrap_or(0.0);
            Ok(Value::from(base + arg(args, 0).to_number() + arg(args, 1).to_number()))
        });

        let result = f.call(&Value::from(1), &[2.into(), 3.into()]).unwrap();
        assert_eq!(result, Value::from(6));
        assert_eq!(f.type_name(), "function");
    }

    #[test]
    fn test_missing_argument_is_undefined() {
        assert!(arg(&[], 3).is_undefined());
    }
}
