//! Identity registries
//!
//! One registry per [`Variant`] maps a raw object to its view. Both sides are
//! held weakly: a view keeps its raw target alive, never the other way
//! round, so the registry never extends the lifetime of anything.
//!
//! An entry dies with its view. The view's handler evicts the entry when it
//! is dropped; entries found dead during lookup are removed on the spot.

use crate::flags::Variant;
use std::cell::RefCell;
use std::collections::HashMap;
use veil_shared::{ObjectId, ObjectRef, WeakObjectRef};

struct Entry {
    target: WeakObjectRef,
    view: WeakObjectRef,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.view.is_live()
    }
}

pub(crate) struct IdentityRegistry {
    variant: Variant,
    entries: RefCell<HashMap<ObjectId, Entry>>,
}

impl IdentityRegistry {
    pub(crate) fn new(variant: Variant) -> Self {
        IdentityRegistry {
            variant,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// The live view registered for `target`
    pub(crate) fn get(&self, target: &ObjectRef) -> Option<ObjectRef> {
        let found = {
            let entries = self.entries.borrow();
            let entry = entries.get(&target.id())?;
            let same_target = entry
                .target
                .upgrade()
                .is_some_and(|registered| registered.ptr_eq(target));
            if same_target {
                entry.view.upgrade()
            } else {
                None
            }
        };
        if found.is_none() {
            self.evict(target.id());
        }
        found
    }

    pub(crate) fn insert(&self, target: &ObjectRef, view: &ObjectRef) {
        self.entries.borrow_mut().insert(
            target.id(),
            Entry {
                target: target.downgrade(),
                view: view.downgrade(),
            },
        );
        tracing::debug!(variant = %self.variant, target = ?target, "registered view");
    }

    /// Drop the entry for `target_id` if its view is gone
    pub(crate) fn evict(&self, target_id: ObjectId) {
        // Evictions can arrive from a view's destructor while the map is
        // borrowed; the stale entry is then removed by the next lookup.
        let Ok(mut entries) = self.entries.try_borrow_mut() else {
            return;
        };
        let stale = entries.get(&target_id).is_some_and(|entry| {
            let target_dead = !entry.target.is_live();
            target_dead || !entry.is_live()
        });
        if stale {
            entries.remove(&target_id);
            tracing::debug!(variant = %self.variant, target_id, "evicted view");
        }
    }

    /// Number of entries whose view is still alive
    pub(crate) fn live(&self) -> usize {
        self.entries.borrow().values().filter(|entry| entry.is_live()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use veil_shared::ProxyHandler;

    struct Forward;
    impl ProxyHandler for Forward {}

    #[test]
    fn test_lookup_and_eviction() {
        let registry = IdentityRegistry::new(Variant::MutableDeep);
        let target = ObjectRef::new_object();
        let view = ObjectRef::new_proxy(target.clone(), Rc::new(Forward));

        registry.insert(&target, &view);
        assert!(registry.get(&target).unwrap().ptr_eq(&view));
        assert_eq!(registry.live(), 1);

        drop(view);
        assert!(registry.get(&target).is_none());
        assert_eq!(registry.live(), 0);
        assert!(registry.entries.borrow().is_empty());
    }

    #[test]
    fn test_lookup_ignores_other_targets() {
        let registry = IdentityRegistry::new(Variant::ReadonlyDeep);
        let target = ObjectRef::new_object();
        let other = ObjectRef::new_object();
        let view = ObjectRef::new_proxy(target.clone(), Rc::new(Forward));

        registry.insert(&target, &view);
        assert!(registry.get(&other).is_none());
        assert!(registry.get(&target).is_some());
    }
}
