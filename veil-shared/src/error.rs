//! Error types for object operations

use crate::value::Value;
use thiserror::Error;

/// Errors raised while operating on the object graph
///
/// Errors come from user code (callbacks, accessors), from calling something
/// that is not callable, or from array writes past the dense capacity.
#[derive(Debug, Clone, Error)]
pub enum ObjectError {
    /// A value had the wrong shape for the requested operation
    #[error("TypeError: {0}")]
    Type(String),

    /// Attempted to call a value that is not a function
    #[error("TypeError: {0} is not a function")]
    NotCallable(String),

    /// A numeric argument was out of range
    #[error("RangeError: {0}")]
    Range(String),

    /// A user callback raised a value
    #[error("uncaught exception: {0:?}")]
    Thrown(Value),
}

impl ObjectError {
    /// Build a type error from any message
    pub fn type_error(message: impl Into<String>) -> Self {
        ObjectError::Type(message.into())
    }

    /// Raise `value` from user code, like a script `throw`
    pub fn thrown(value: impl Into<Value>) -> Self {
        ObjectError::Thrown(value.into())
    }

    /// The raised value, for errors that came from user code
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            ObjectError::Thrown(value) => Some(value),
            _ => None,
        }
    }
}

/// Result type using ObjectError
pub type Result<T> = std::result::Result<T, ObjectError>;
