// Effect arena - storage for registered effect units.
//
// An EffectRecord is the engine-side representation of one effect: the body
// it runs, the reverse dependency list recording which subscriber sets it
// currently belongs to, and a disposed flag.
//
// Disposed records stay in the slab with their body dropped, so an
// outstanding EffectId can never come to denote a different effect.

use std::sync::Arc;

use parking_lot::RwLock;
use slab::Slab;

use super::SourceId;

/// Body of an effect. Mutable state is carried through captured
/// `Arc`s/atomics; the engine calls the body with no lock held.
pub type EffectBody = Arc<dyn Fn() + Send + Sync>;

/// One entry in an effect's reverse dependency list: a subscriber set the
/// effect was added to during its latest run.
#[derive(Debug, PartialEq, Eq)]
pub struct Dependency {
    pub(crate) source: SourceId,
    pub(crate) field: Box<str>,
}

/// Unique identifier for a registered effect.
///
/// A zero-cost wrapper around a slab index. `EffectId` is `Copy` and
/// carries no ownership: dropping it changes nothing, and the id of a
/// disposed effect stays valid (runs against it are ignored).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EffectId(u32);

impl EffectId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub struct EffectRecord {
    /// `None` once the effect has been disposed.
    body: Option<EffectBody>,
    /// Subscriber sets this effect was added to during its latest run.
    deps: Vec<Dependency>,
    disposed: bool,
}

/// Slab of effect records behind a single lock.
///
/// The lock is only held for short bookkeeping sections; bodies are cloned
/// out and run with no lock held, so re-entrant engine calls from inside a
/// running body cannot deadlock.
#[derive(Default)]
pub struct EffectArena {
    slots: RwLock<Slab<EffectRecord>>,
}

impl EffectArena {
    pub(crate) fn insert(&self, body: EffectBody) -> EffectId {
        let mut slots = self.slots.write();
        let key = slots.insert(EffectRecord {
            body: Some(body),
            deps: Vec::new(),
            disposed: false,
        });
        EffectId::new(key)
    }

    /// Clone the body out so it can be run without the lock.
    ///
    /// Returns `None` for disposed effects.
    pub(crate) fn body(&self, id: EffectId) -> Option<EffectBody> {
        let slots = self.slots.read();
        let record = slots.get(id.index())?;
        if record.disposed {
            return None;
        }
        record.body.clone()
    }

    pub(crate) fn is_disposed(&self, id: EffectId) -> bool {
        let slots = self.slots.read();
        slots.get(id.index()).is_none_or(|record| record.disposed)
    }

    /// Take the reverse dependency list, leaving it empty.
    pub(crate) fn take_deps(&self, id: EffectId) -> Vec<Dependency> {
        let mut slots = self.slots.write();
        match slots.get_mut(id.index()) {
            Some(record) => std::mem::take(&mut record.deps),
            None => Vec::new(),
        }
    }

    /// Record membership in one more subscriber set.
    pub(crate) fn push_dep(&self, id: EffectId, dep: Dependency) {
        let mut slots = self.slots.write();
        if let Some(record) = slots.get_mut(id.index()) {
            record.deps.push(dep);
        }
    }

    /// Drop every reverse-list entry pointing at `source`.
    ///
    /// Called during source eviction: the slot behind a dead SourceId may be
    /// reused, so no effect may keep addressing it.
    pub(crate) fn scrub_source(&self, id: EffectId, source: SourceId) {
        let mut slots = self.slots.write();
        if let Some(record) = slots.get_mut(id.index()) {
            record.deps.retain(|dep| dep.source != source);
        }
    }

    /// Mark the effect inert and drop its body.
    ///
    /// Returns the reverse dependency list for the caller to detach, or
    /// `None` if the effect was already disposed or never existed.
    pub(crate) fn dispose(&self, id: EffectId) -> Option<Vec<Dependency>> {
        let mut slots = self.slots.write();
        let record = slots.get_mut(id.index())?;
        if record.disposed {
            return None;
        }
        record.disposed = true;
        record.body = None;
        Some(std::mem::take(&mut record.deps))
    }

    #[cfg(test)]
    pub(crate) fn dep_count(&self, id: EffectId) -> usize {
        let slots = self.slots.read();
        slots.get(id.index()).map_or(0, |record| record.deps.len())
    }
}
