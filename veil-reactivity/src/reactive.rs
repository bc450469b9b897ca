//! Views and the context that creates them
//!
//! A [`Reactivity`] context owns the four identity registries, the array
//! instrumentation table, the tracker and its suspension/batching state.
//! Contexts are cheap handles; clones share everything.
//!
//! Free functions at the bottom of the module cover the common case: the
//! `wrap_*` functions use the per-thread default context, while the
//! inspection functions (`unwrap`, `is_wrapped`, ...) work on views from any
//! context since they only read the reserved flags.

use crate::array_instrumentations::{ArrayMethod, Instrumentations};
use crate::config::ReactivityConfig;
use crate::dep::{DepKey, DependencyTracker, LoggingTracker, RecordingTracker, TrackingState};
use crate::flags::{ReactiveFlag, TrackOp, TriggerOp, Variant};
use crate::handlers;
use crate::registry::IdentityRegistry;
use std::fmt;
use std::rc::{Rc, Weak};
use veil_shared::{is_object, ObjectError, ObjectRef, Result, Value};

pub(crate) struct ReactivityInner {
    config: ReactivityConfig,
    tracking: TrackingState,
    registries: [IdentityRegistry; 4],
    instrumentations: Instrumentations,
}

/// Handle to an observation context
#[derive(Clone)]
pub struct Reactivity {
    inner: Rc<ReactivityInner>,
}

thread_local! {
    static CURRENT: Reactivity = Reactivity::new();
}

impl Reactivity {
    /// Context with default configuration and a [`LoggingTracker`]
    pub fn new() -> Self {
        Self::with_config(ReactivityConfig::default())
    }

    pub fn with_config(config: ReactivityConfig) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<ReactivityInner>| ReactivityInner {
            config,
            tracking: TrackingState::new(Rc::new(LoggingTracker)),
            registries: Variant::ALL.map(IdentityRegistry::new),
            instrumentations: Instrumentations::new(weak.clone()),
        });
        Reactivity { inner }
    }

    /// Replace the tracker, returning the context for chaining
    pub fn with_tracker(self, tracker: Rc<dyn DependencyTracker>) -> Self {
        self.set_tracker(tracker);
        self
    }

    /// Fresh context wired to a [`RecordingTracker`]
    pub fn recording() -> (Self, Rc<RecordingTracker>) {
        let recorder = Rc::new(RecordingTracker::new());
        let ctx = Self::new().with_tracker(recorder.clone());
        (ctx, recorder)
    }

    /// The per-thread default context
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    pub(crate) fn upgrade(weak: &Weak<ReactivityInner>) -> Result<Self> {
        weak.upgrade()
            .map(|inner| Reactivity { inner })
            .ok_or_else(|| ObjectError::type_error("reactivity context has been dropped"))
    }

    pub fn config(&self) -> &ReactivityConfig {
        &self.inner.config
    }

    pub fn set_tracker(&self, tracker: Rc<dyn DependencyTracker>) {
        self.inner.tracking.set_tracker(tracker);
    }

    pub fn ptr_eq(&self, other: &Reactivity) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn wrap_mutable_deep(&self, value: &Value) -> Value {
        self.wrap(value, Variant::MutableDeep)
    }

    pub fn wrap_mutable_shallow(&self, value: &Value) -> Value {
        self.wrap(value, Variant::MutableShallow)
    }

    pub fn wrap_readonly_deep(&self, value: &Value) -> Value {
        self.wrap(value, Variant::ReadonlyDeep)
    }

    pub fn wrap_readonly_shallow(&self, value: &Value) -> Value {
        self.wrap(value, Variant::ReadonlyShallow)
    }

    /// Wrap `value` as a view of the given variant
    ///
    /// Non-objects pass through unchanged. A value that already is a view is
    /// returned as is, except that a readonly request over a mutable view
    /// wraps the mutable view's raw object instead.
    pub fn wrap(&self, value: &Value, variant: Variant) -> Value {
        let Value::Object(target) = value else {
            return self.pass_through(value, variant);
        };
        if !is_object(value) {
            return self.pass_through(value, variant);
        }

        // Objects inheriting from a view report its flags but not its raw
        // object, so only a reachable raw object marks `value` as a view.
        let raw = unwrap(value);
        if !raw.ptr_eq(value) && is_wrapped(value) {
            if variant.is_readonly() && is_mutable_view(value) {
                return self.wrap(&raw, variant);
            }
            return value.clone();
        }

        let registry = self.registry(variant);
        if let Some(view) = registry.get(target) {
            return Value::Object(view);
        }

        let handler = handlers::for_variant(self.clone(), variant, target.id());
        let view = ObjectRef::new_proxy(target.clone(), handler);
        registry.insert(target, &view);
        Value::Object(view)
    }

    fn pass_through(&self, value: &Value, variant: Variant) -> Value {
        if self.inner.config.warn_on_non_object {
            tracing::warn!(
                value = ?value,
                variant = %variant,
                "value cannot be made reactive: not an object"
            );
        }
        value.clone()
    }

    /// Mutable deep view for objects, everything else unchanged
    pub fn to_reactive(&self, value: Value) -> Value {
        if is_object(&value) {
            self.wrap_mutable_deep(&value)
        } else {
            value
        }
    }

    /// Readonly deep view for objects, everything else unchanged
    pub fn to_readonly(&self, value: Value) -> Value {
        if is_object(&value) {
            self.wrap_readonly_deep(&value)
        } else {
            value
        }
    }

    /// Number of cached views of `variant` that are still alive
    pub fn live_views(&self, variant: Variant) -> usize {
        self.registry(variant).live()
    }

    /// Suspend `track` calls until the matching [`reset_tracking`](Self::reset_tracking)
    pub fn pause_tracking(&self) {
        self.inner.tracking.pause();
    }

    /// Force tracking on until the matching [`reset_tracking`](Self::reset_tracking)
    pub fn enable_tracking(&self) {
        self.inner.tracking.enable();
    }

    /// Restore the tracking state saved by the last pause/enable
    pub fn reset_tracking(&self) {
        self.inner.tracking.reset();
    }

    pub fn is_tracking(&self) -> bool {
        self.inner.tracking.is_tracking()
    }

    /// Queue triggers until the matching [`end_batch`](Self::end_batch)
    pub fn start_batch(&self) {
        self.inner.tracking.start_batch();
    }

    /// Close a batch; the outermost close delivers queued triggers in order
    pub fn end_batch(&self) {
        self.inner.tracking.end_batch();
    }

    /// Report a read of `key` on the raw object `target`
    pub fn track(&self, target: &ObjectRef, op: TrackOp, key: &DepKey) {
        self.inner.tracking.track(target, op, key);
    }

    /// Report a mutation of the raw object `target`
    pub fn trigger(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    ) {
        self.inner.tracking.trigger(target, op, key, new_value, old_value);
    }

    pub(crate) fn registry(&self, variant: Variant) -> &IdentityRegistry {
        &self.inner.registries[variant.index()]
    }

    pub(crate) fn instrumented(&self, method: ArrayMethod) -> Value {
        self.inner.instrumentations.method(method)
    }

    pub(crate) fn has_own_property_fn(&self) -> Value {
        self.inner.instrumentations.has_own_property()
    }
}

impl Default for Reactivity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reactivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut live = f.debug_map();
        for variant in Variant::ALL {
            live.entry(&variant, &self.live_views(variant));
        }
        live.finish()
    }
}

fn flag(value: &Value, flag: ReactiveFlag) -> bool {
    is_object(value) && value.get(flag.key()).is_ok_and(|v| v.truthy())
}

/// The raw object beneath any number of view layers
///
/// Non-views, primitives included, are returned unchanged.
pub fn unwrap(value: &Value) -> Value {
    let mut current = value.clone();
    loop {
        if !is_object(&current) {
            return current;
        }
        let raw = current.get(ReactiveFlag::Raw.key()).unwrap_or_default();
        if !is_object(&raw) || raw.ptr_eq(&current) {
            return current;
        }
        current = raw;
    }
}

/// Whether `value` is a view of any variant
pub fn is_wrapped(value: &Value) -> bool {
    flag(value, ReactiveFlag::IsReactive)
}

pub fn is_readonly_view(value: &Value) -> bool {
    flag(value, ReactiveFlag::IsReadonly)
}

pub fn is_shallow_view(value: &Value) -> bool {
    flag(value, ReactiveFlag::IsShallow)
}

/// Whether `value` is a view that accepts writes
pub fn is_mutable_view(value: &Value) -> bool {
    is_wrapped(value) && !is_readonly_view(value)
}

/// [`Reactivity::wrap_mutable_deep`] on the per-thread context
pub fn wrap_mutable_deep(value: &Value) -> Value {
    Reactivity::current().wrap_mutable_deep(value)
}

/// [`Reactivity::wrap_mutable_shallow`] on the per-thread context
pub fn wrap_mutable_shallow(value: &Value) -> Value {
    Reactivity::current().wrap_mutable_shallow(value)
}

/// [`Reactivity::wrap_readonly_deep`] on the per-thread context
pub fn wrap_readonly_deep(value: &Value) -> Value {
    Reactivity::current().wrap_readonly_deep(value)
}

/// [`Reactivity::wrap_readonly_shallow`] on the per-thread context
pub fn wrap_readonly_shallow(value: &Value) -> Value {
    Reactivity::current().wrap_readonly_shallow(value)
}

/// [`Reactivity::to_reactive`] on the per-thread context
pub fn to_reactive(value: Value) -> Value {
    Reactivity::current().to_reactive(value)
}

/// [`Reactivity::to_readonly`] on the per-thread context
pub fn to_readonly(value: Value) -> Value {
    Reactivity::current().to_readonly(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::object([
            ("a", Value::from(1)),
            ("nested", Value::object([("foo", Value::from(1))])),
        ])
    }

    #[test]
    fn test_wrap_is_idempotent_per_variant() {
        let ctx = Reactivity::new();
        let raw = sample();
        for variant in Variant::ALL {
            let view = ctx.wrap(&raw, variant);
            assert!(view.ptr_eq(&ctx.wrap(&raw, variant)));
            assert!(view.ptr_eq(&ctx.wrap(&view, variant)));
            assert!(unwrap(&view).ptr_eq(&raw));
        }
    }

    #[test]
    fn test_variants_are_distinct() {
        let ctx = Reactivity::new();
        let raw = sample();
        let mutable = ctx.wrap_mutable_deep(&raw);
        let readonly = ctx.wrap_readonly_deep(&raw);

        assert!(!mutable.ptr_eq(&readonly));
        assert!(unwrap(&mutable).ptr_eq(&raw));
        assert!(unwrap(&readonly).ptr_eq(&raw));
    }

    #[test]
    fn test_readonly_over_mutable_wraps_raw() {
        let ctx = Reactivity::new();
        let raw = sample();
        let mutable = ctx.wrap_mutable_deep(&raw);
        let readonly = ctx.wrap_readonly_deep(&mutable);

        assert!(!readonly.ptr_eq(&mutable));
        assert!(readonly.ptr_eq(&ctx.wrap_readonly_deep(&raw)));
        assert!(unwrap(&readonly).ptr_eq(&raw));
    }

    #[test]
    fn test_mutable_over_readonly_is_unchanged() {
        let ctx = Reactivity::new();
        let readonly = ctx.wrap_readonly_deep(&sample());
        assert!(ctx.wrap_mutable_deep(&readonly).ptr_eq(&readonly));
    }

    #[test]
    fn test_non_objects_pass_through() {
        let ctx = Reactivity::new();
        assert_eq!(ctx.wrap_mutable_deep(&Value::from(1)), Value::from(1));
        assert_eq!(ctx.wrap_readonly_deep(&Value::Null), Value::Null);

        let f = veil_shared::function("f", 0, |_, _| Ok(Value::Undefined));
        assert!(ctx.wrap_mutable_deep(&f).ptr_eq(&f));
        assert!(!is_wrapped(&f));
    }

    #[test]
    fn test_flags() {
        let ctx = Reactivity::new();
        let raw = sample();

        let mutable = ctx.wrap_mutable_deep(&raw);
        assert!(is_wrapped(&mutable));
        assert!(is_mutable_view(&mutable));
        assert!(!is_readonly_view(&mutable));
        assert!(!is_shallow_view(&mutable));

        let shallow_readonly = ctx.wrap_readonly_shallow(&raw);
        assert!(is_wrapped(&shallow_readonly));
        assert!(is_readonly_view(&shallow_readonly));
        assert!(is_shallow_view(&shallow_readonly));
        assert!(!is_mutable_view(&shallow_readonly));

        assert!(!is_wrapped(&raw));
        assert!(!is_wrapped(&Value::Undefined));
    }

    #[test]
    fn test_views_are_evicted_when_dropped() {
        let ctx = Reactivity::new();
        let raw = sample();

        let view = ctx.wrap_mutable_deep(&raw);
        assert_eq!(ctx.live_views(Variant::MutableDeep), 1);
        drop(view);
        assert_eq!(ctx.live_views(Variant::MutableDeep), 0);

        let again = ctx.wrap_mutable_deep(&raw);
        assert!(unwrap(&again).ptr_eq(&raw));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = Reactivity::new();
        let b = Reactivity::new();
        let raw = sample();

        let view_a = a.wrap_mutable_deep(&raw);
        let view_b = b.wrap_mutable_deep(&raw);
        assert!(!view_a.ptr_eq(&view_b));
        assert!(Reactivity::current().ptr_eq(&Reactivity::current()));
    }

    #[test]
    fn test_to_reactive_skips_primitives() {
        let ctx = Reactivity::new();
        assert_eq!(ctx.to_reactive(Value::from("x")), Value::from("x"));
        assert!(is_wrapped(&ctx.to_readonly(sample())));
    }
}
