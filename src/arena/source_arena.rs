// Source arena - the dependency registry.
//
// Two-level mapping keyed by source identity then field name:
//
//   SourceId -> (field -> subscriber set)
//
// A SourceRecord holds bookkeeping only, never user data, so the registry
// cannot extend a source's lifetime. The record is evicted when the owning
// Source handle is dropped; the handle also scrubs every reverse-dependency
// reference so nothing keeps pointing at the freed slot.
//
// Subscriber sets are created lazily on first track and are never removed
// while the source lives. Detaching effects may leave a set empty; that is
// fine, emptiness is cheap to skip over.

use parking_lot::RwLock;
use slab::Slab;

use crate::hash::{FastHashMap, FastIndexSet};

use super::EffectId;

/// Unique identifier for a data source.
///
/// A zero-cost wrapper around a slab index, allocated when a [`Source`]
/// handle is created and released when it is dropped. Operations on a stale
/// `SourceId` are silent no-ops.
///
/// [`Source`]: crate::Source
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceId(u32);

impl SourceId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-source registry entry: one subscriber set for every field that has
/// been tracked at least once.
#[derive(Default)]
pub struct SourceRecord {
    fields: FastHashMap<Box<str>, FastIndexSet<EffectId>>,
}

impl SourceRecord {
    /// The subscriber sets of every tracked field, for eviction scrubbing.
    pub(crate) fn field_sets(&self) -> impl Iterator<Item = &FastIndexSet<EffectId>> {
        self.fields.values()
    }
}

/// Slab of source records behind a single lock.
///
/// The lock is only held for short bookkeeping sections, never while an
/// effect body runs.
#[derive(Default)]
pub struct SourceArena {
    slots: RwLock<Slab<SourceRecord>>,
}

impl SourceArena {
    /// Allocate a fresh source identity.
    pub(crate) fn insert(&self) -> SourceId {
        let mut slots = self.slots.write();
        SourceId::new(slots.insert(SourceRecord::default()))
    }

    /// Evict a source, returning its record so the caller can scrub the
    /// reverse dependency lists of every subscribed effect.
    pub(crate) fn remove(&self, id: SourceId) -> Option<SourceRecord> {
        let mut slots = self.slots.write();
        if slots.contains(id.index()) {
            Some(slots.remove(id.index()))
        } else {
            None
        }
    }

    /// Idempotently add `effect` to the subscriber set for (source, field),
    /// creating the set on first use.
    ///
    /// Returns `Some(true)` iff the effect was newly inserted, `Some(false)`
    /// if it was already a member, `None` for a stale source.
    pub(crate) fn add_subscriber(
        &self,
        id: SourceId,
        field: &str,
        effect: EffectId,
    ) -> Option<bool> {
        let mut slots = self.slots.write();
        let record = slots.get_mut(id.index())?;
        if let Some(set) = record.fields.get_mut(field) {
            return Some(set.insert(effect));
        }
        let set = record.fields.entry(Box::from(field)).or_default();
        Some(set.insert(effect))
    }

    /// Remove `effect` from the subscriber set for (source, field).
    ///
    /// Detachment support only; stale sources and unknown fields are
    /// ignored. The set itself stays allocated.
    pub(crate) fn remove_subscriber(&self, id: SourceId, field: &str, effect: EffectId) {
        let mut slots = self.slots.write();
        if let Some(set) = slots
            .get_mut(id.index())
            .and_then(|record| record.fields.get_mut(field))
        {
            set.shift_remove(&effect);
        }
    }

    /// Copy the current membership for (source, field).
    ///
    /// Non-creating: returns `None` when the source is stale or no read of
    /// `field` was ever tracked. The copy is what trigger iterates, so
    /// detach and re-track calls made by the running effects cannot disturb
    /// the iteration.
    pub(crate) fn snapshot(&self, id: SourceId, field: &str) -> Option<Vec<EffectId>> {
        let slots = self.slots.read();
        let set = slots.get(id.index())?.fields.get(field)?;
        Some(set.iter().copied().collect())
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self, id: SourceId, field: &str) -> usize {
        let slots = self.slots.read();
        slots
            .get(id.index())
            .and_then(|record| record.fields.get(field))
            .map_or(0, FastIndexSet::len)
    }

    /// Whether any subscriber set exists for `field`, even an empty one.
    #[cfg(test)]
    pub(crate) fn has_field(&self, id: SourceId, field: &str) -> bool {
        let slots = self.slots.read();
        slots
            .get(id.index())
            .is_some_and(|record| record.fields.contains_key(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_access_is_a_noop() {
        let arena = SourceArena::default();
        let id = arena.insert();
        arena.remove(id);

        assert_eq!(arena.add_subscriber(id, "x", EffectId::new(0)), None);
        assert_eq!(arena.snapshot(id, "x"), None);
        assert!(arena.remove(id).is_none());
        // Does not panic on a dead slot.
        arena.remove_subscriber(id, "x", EffectId::new(0));
    }

    #[test]
    fn subscriber_sets_are_created_lazily() {
        let arena = SourceArena::default();
        let id = arena.insert();

        assert!(!arena.has_field(id, "x"));
        assert_eq!(arena.snapshot(id, "x"), None);

        arena.add_subscriber(id, "x", EffectId::new(3));
        assert!(arena.has_field(id, "x"));
        assert_eq!(arena.snapshot(id, "x"), Some(vec![EffectId::new(3)]));
    }

    #[test]
    fn add_subscriber_is_idempotent() {
        let arena = SourceArena::default();
        let id = arena.insert();
        let effect = EffectId::new(7);

        assert_eq!(arena.add_subscriber(id, "x", effect), Some(true));
        assert_eq!(arena.add_subscriber(id, "x", effect), Some(false));
        assert_eq!(arena.subscriber_count(id, "x"), 1);
    }

    #[test]
    fn detach_leaves_the_empty_set_allocated() {
        let arena = SourceArena::default();
        let id = arena.insert();
        let effect = EffectId::new(1);

        arena.add_subscriber(id, "x", effect);
        arena.remove_subscriber(id, "x", effect);

        assert!(arena.has_field(id, "x"));
        assert_eq!(arena.snapshot(id, "x"), Some(Vec::new()));
    }

    #[test]
    fn snapshots_preserve_subscription_order() {
        let arena = SourceArena::default();
        let id = arena.insert();

        for index in [4usize, 2, 9] {
            arena.add_subscriber(id, "x", EffectId::new(index));
        }

        let snapshot = arena.snapshot(id, "x").unwrap();
        assert_eq!(
            snapshot,
            vec![EffectId::new(4), EffectId::new(2), EffectId::new(9)]
        );
    }
}
