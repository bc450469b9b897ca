//! Dependency tracking interface
//!
//! The observation layer decides *when* a read or a mutation happened and
//! under which key; a [`DependencyTracker`] decides what that means. Two
//! trackers ship with the crate: [`LoggingTracker`] turns every call into a
//! `tracing` event, [`RecordingTracker`] keeps them in memory.
//!
//! [`TrackingState`] holds the per-context switches around the tracker:
//! suspension of `track` calls (a stack, so nested windows restore correctly)
//! and batching, which queues `trigger` calls until the outermost batch ends.

use crate::flags::{TrackOp, TriggerOp};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use veil_shared::{ObjectId, ObjectRef, PropertyKey, Value};

/// Key a dependency is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepKey {
    Property(PropertyKey),
    /// The set of keys of an object (key enumeration)
    Iterate,
    /// The whole content of an array (search, copy, iteration)
    ArrayIterate,
}

impl From<PropertyKey> for DepKey {
    fn from(key: PropertyKey) -> Self {
        DepKey::Property(key)
    }
}

impl From<&PropertyKey> for DepKey {
    fn from(key: &PropertyKey) -> Self {
        DepKey::Property(key.clone())
    }
}

impl fmt::Display for DepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepKey::Property(key) => write!(f, "{}", key),
            DepKey::Iterate => f.write_str("<iterate>"),
            DepKey::ArrayIterate => f.write_str("<array-iterate>"),
        }
    }
}

/// Receiver of observed reads and mutations
///
/// `target` is always the raw object. Calls happen synchronously and may
/// nest: a `trigger` implementation is free to read and write views again.
pub trait DependencyTracker {
    fn track(&self, target: &ObjectRef, op: TrackOp, key: &DepKey);

    fn trigger(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    );
}

/// Tracker that reports every call as a `trace`-level event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTracker;

impl DependencyTracker for LoggingTracker {
    fn track(&self, target: &ObjectRef, op: TrackOp, key: &DepKey) {
        tracing::trace!(target_object = ?target, op = %op, key = %key, "track");
    }

    fn trigger(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    ) {
        tracing::trace!(
            target_object = ?target,
            op = %op,
            key = ?key.map(ToString::to_string),
            new_value = ?new_value,
            old_value = ?old_value,
            "trigger"
        );
    }
}

/// A tracker call captured by [`RecordingTracker`]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    Track {
        target: ObjectId,
        op: TrackOp,
        key: DepKey,
    },
    Trigger {
        target: ObjectId,
        op: TriggerOp,
        key: Option<DepKey>,
        new_value: Option<Value>,
        old_value: Option<Value>,
    },
}

impl TrackEvent {
    pub fn target(&self) -> ObjectId {
        match self {
            TrackEvent::Track { target, .. } | TrackEvent::Trigger { target, .. } => *target,
        }
    }

    pub fn is_track(&self) -> bool {
        matches!(self, TrackEvent::Track { .. })
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, TrackEvent::Trigger { .. })
    }
}

impl fmt::Display for TrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackEvent::Track { op, key, .. } => write!(f, "track {} {}", op, key),
            TrackEvent::Trigger { op, key, .. } => match key {
                Some(key) => write!(f, "trigger {} {}", op, key),
                None => write!(f, "trigger {}", op),
            },
        }
    }
}

/// Tracker that keeps every call in memory
///
/// Targets are recorded by identity only, so recording never keeps an
/// object alive.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: RefCell<Vec<TrackEvent>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackEvent> {
        self.events.borrow().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<TrackEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// One line per event, e.g. `track get a` or `trigger add 3`
    pub fn log(&self) -> String {
        self.events
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tracks(&self) -> Vec<TrackEvent> {
        self.events.borrow().iter().filter(|e| e.is_track()).cloned().collect()
    }

    pub fn triggers(&self) -> Vec<TrackEvent> {
        self.events.borrow().iter().filter(|e| e.is_trigger()).cloned().collect()
    }
}

impl DependencyTracker for RecordingTracker {
    fn track(&self, target: &ObjectRef, op: TrackOp, key: &DepKey) {
        self.events.borrow_mut().push(TrackEvent::Track {
            target: target.id(),
            op,
            key: key.clone(),
        });
    }

    fn trigger(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    ) {
        self.events.borrow_mut().push(TrackEvent::Trigger {
            target: target.id(),
            op,
            key: key.cloned(),
            new_value: new_value.cloned(),
            old_value: old_value.cloned(),
        });
    }
}

struct PendingTrigger {
    target: ObjectRef,
    op: TriggerOp,
    key: Option<DepKey>,
    new_value: Option<Value>,
    old_value: Option<Value>,
}

/// Tracker plus suspension and batching state
pub(crate) struct TrackingState {
    tracker: RefCell<Rc<dyn DependencyTracker>>,
    should_track: Cell<bool>,
    track_stack: RefCell<Vec<bool>>,
    batch_depth: Cell<usize>,
    pending: RefCell<Vec<PendingTrigger>>,
}

impl TrackingState {
    pub(crate) fn new(tracker: Rc<dyn DependencyTracker>) -> Self {
        TrackingState {
            tracker: RefCell::new(tracker),
            should_track: Cell::new(true),
            track_stack: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            pending: RefCell::new(Vec::new()),
        }
    }

    fn tracker(&self) -> Rc<dyn DependencyTracker> {
        self.tracker.borrow().clone()
    }

    pub(crate) fn set_tracker(&self, tracker: Rc<dyn DependencyTracker>) {
        let previous = self.tracker.replace(tracker);
        drop(previous);
    }

    pub(crate) fn is_tracking(&self) -> bool {
        self.should_track.get()
    }

    pub(crate) fn pause(&self) {
        self.track_stack.borrow_mut().push(self.should_track.get());
        self.should_track.set(false);
    }

    pub(crate) fn enable(&self) {
        self.track_stack.borrow_mut().push(self.should_track.get());
        self.should_track.set(true);
    }

    pub(crate) fn reset(&self) {
        let previous = self.track_stack.borrow_mut().pop();
        self.should_track.set(previous.unwrap_or(true));
    }

    pub(crate) fn batch_depth(&self) -> usize {
        self.batch_depth.get()
    }

    pub(crate) fn start_batch(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    pub(crate) fn end_batch(&self) {
        let depth = self.batch_depth.get();
        if depth == 0 {
            tracing::warn!("end_batch called without a matching start_batch");
            return;
        }
        self.batch_depth.set(depth - 1);
        if depth > 1 {
            return;
        }
        loop {
            let queued = std::mem::take(&mut *self.pending.borrow_mut());
            if queued.is_empty() {
                break;
            }
            tracing::debug!(count = queued.len(), "flushing batched triggers");
            for pending in queued {
                self.deliver(
                    &pending.target,
                    pending.op,
                    pending.key.as_ref(),
                    pending.new_value.as_ref(),
                    pending.old_value.as_ref(),
                );
            }
        }
    }

    pub(crate) fn track(&self, target: &ObjectRef, op: TrackOp, key: &DepKey) {
        if self.should_track.get() {
            self.tracker().track(target, op, key);
        }
    }

    pub(crate) fn trigger(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    ) {
        if self.batch_depth.get() > 0 {
            self.pending.borrow_mut().push(PendingTrigger {
                target: target.clone(),
                op,
                key: key.cloned(),
                new_value: new_value.cloned(),
                old_value: old_value.cloned(),
            });
            return;
        }
        self.deliver(target, op, key, new_value, old_value);
    }

    fn deliver(
        &self,
        target: &ObjectRef,
        op: TriggerOp,
        key: Option<&DepKey>,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
    ) {
        self.tracker().trigger(target, op, key, new_value, old_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (TrackingState, Rc<RecordingTracker>) {
        let recorder = Rc::new(RecordingTracker::new());
        (TrackingState::new(recorder.clone()), recorder)
    }

    #[test]
    fn test_pause_and_reset_nest() {
        let (state, recorder) = state();
        let target = ObjectRef::new_object();
        let key = DepKey::from(PropertyKey::from("a"));

        state.pause();
        state.enable();
        state.track(&target, TrackOp::Get, &key);
        state.reset();
        state.track(&target, TrackOp::Get, &key);
        state.reset();
        state.track(&target, TrackOp::Get, &key);

        assert_eq!(recorder.log(), "track get a\ntrack get a");
        // unbalanced reset falls back to tracking
        state.reset();
        assert!(state.is_tracking());
    }

    #[test]
    fn test_batch_defers_triggers_until_outermost_end() {
        let (state, recorder) = state();
        let target = ObjectRef::new_object();
        let key = DepKey::Property("a".into());

        state.start_batch();
        state.start_batch();
        state.trigger(&target, TriggerOp::Add, Some(&key), Some(&1.into()), None);
        state.end_batch();
        assert!(recorder.events().is_empty());
        state.end_batch();

        assert_eq!(recorder.log(), "trigger add a");
        assert_eq!(state.batch_depth(), 0);
    }

    #[test]
    fn test_unbalanced_end_batch_is_ignored() {
        let (state, _) = state();
        state.end_batch();
        assert_eq!(state.batch_depth(), 0);
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(DepKey::Iterate.to_string(), "<iterate>");
        assert_eq!(DepKey::ArrayIterate.to_string(), "<array-iterate>");
        assert_ne!(DepKey::Iterate, DepKey::Property("<iterate>".into()));
    }
}
