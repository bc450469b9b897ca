//! Transparent mutation observation for veil object graphs
//!
//! Wrapping an object produces a *view*: a proxy that reads and writes like
//! the object itself, but reports every read to a [`DependencyTracker`]
//! (`track`) and every effective mutation (`trigger`). Views come in four
//! [`Variant`]s, mutable or readonly crossed with deep or shallow. Each raw
//! object has at most one live view per variant, and [`unwrap`] always leads
//! back to the raw object.
//!
//! # Example
//!
//! ```rust
//! use veil_reactivity::{is_wrapped, unwrap, Reactivity};
//! use veil_shared::Value;
//!
//! let (ctx, recorder) = Reactivity::recording();
//! let raw = Value::object([("count", Value::from(1))]);
//! let state = ctx.wrap_mutable_deep(&raw);
//!
//! state.get("count").unwrap();
//! state.set("count", 2).unwrap();
//!
//! assert!(is_wrapped(&state));
//! assert!(unwrap(&state).ptr_eq(&raw));
//! assert_eq!(recorder.log(), "track get count\ntrigger set count");
//! ```
//!
//! # Modules
//!
//! - [`reactive`]: the [`Reactivity`] context, wrap functions and flag queries
//! - `handlers`: the trap sets behind each variant (internal)
//! - [`array_instrumentations`]: replacement array methods for mutable views
//! - [`dep`]: the tracker interface and the shipped trackers
//! - [`config`]: [`ReactivityConfig`] and its loaders

#![warn(missing_debug_implementations)]

pub mod array_instrumentations;
pub mod config;
pub mod dep;
pub mod flags;
mod handlers;
mod registry;
pub mod reactive;

pub use array_instrumentations::{ArrayMethod, MethodCategory, ResultWrap};
pub use config::{ConfigError, ReactivityConfig};
pub use dep::{DepKey, DependencyTracker, LoggingTracker, RecordingTracker, TrackEvent};
pub use flags::{ReactiveFlag, TrackOp, TriggerOp, Variant};
pub use reactive::{
    is_mutable_view, is_readonly_view, is_shallow_view, is_wrapped, to_reactive, to_readonly,
    unwrap, wrap_mutable_deep, wrap_mutable_shallow, wrap_readonly_deep, wrap_readonly_shallow,
    Reactivity,
};
pub use veil_shared::{ObjectError, Result};
