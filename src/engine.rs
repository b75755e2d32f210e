use std::sync::Arc;

use crate::arena::{Dependency, EffectArena, EffectId, SourceArena, SourceId};
use crate::stack::ActiveStack;

/// One independent reactive world.
///
/// An `Engine` owns the dependency registry (which effects depend on which
/// `(source, field)` pairs), the storage for registered effects, and the
/// active-effect stack. Nothing is process-global: engines created
/// separately know nothing about each other, which keeps tests
/// deterministic and lets one program host several reactive worlds.
///
/// `Engine` is a cheap handle: cloning it yields another reference to the
/// same world. [`Source`](crate::Source) handles and effect bodies hold
/// such clones.
///
/// # The track/trigger contract
///
/// The engine never observes data directly; an interception layer
/// (accessor wrappers, proxies, ...) must route every reactive read
/// through [`Engine::track`] *before* returning the value, and every
/// reactive write through [`Engine::trigger`] *after* committing the new
/// value. Those two calls are the engine's entire view of the data.
///
/// # Scheduling model
///
/// Strictly single-threaded and fully synchronous: `trigger` runs every
/// subscribed effect inline before it returns, and bodies that write
/// reactive fields recurse into `trigger` on the ordinary call stack.
/// There is no queue, no batching, and no suspension point anywhere.
#[derive(Clone, Default)]
pub struct Engine {
    pub(crate) inner: Arc<EngineInner>,
}

#[derive(Default)]
pub(crate) struct EngineInner {
    pub(crate) sources: SourceArena,
    pub(crate) effects: EffectArena,
    pub(crate) active: ActiveStack,
}

impl Engine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the currently active effect depends on `(source, field)`.
    ///
    /// Called by the interception layer on every reactive read, before the
    /// value is returned to the reader. With no effect running this is a
    /// no-op: reads outside any effect are never tracked and leave the
    /// registry untouched.
    ///
    /// Subscribing is idempotent: reading the same field any number of
    /// times within one run yields a single subscription and a single
    /// re-run per trigger.
    pub fn track(&self, source: SourceId, field: &str) {
        let Some(active) = self.inner.active.current() else {
            cov_mark::hit!(read_outside_effect);
            return;
        };
        match self.inner.sources.add_subscriber(source, field, active) {
            Some(true) => {
                // First read of this pair during the current run: remember
                // the membership so the next run can detach.
                self.inner.effects.push_dep(
                    active,
                    Dependency {
                        source,
                        field: Box::from(field),
                    },
                );
            }
            Some(false) => {}
            None => {
                cov_mark::hit!(track_stale_source);
            }
        }
    }

    /// Re-run every effect currently subscribed to `(source, field)`.
    ///
    /// Called by the interception layer on every reactive write, after the
    /// new value is committed. If nothing ever tracked the pair, this is a
    /// no-op.
    ///
    /// Membership is snapshotted before anything runs: an effect that
    /// re-subscribes to this same field during its own run (it re-reads the
    /// field) is not run a second time by this call, and effects registered
    /// or newly subscribed while this call executes are only picked up by
    /// the next write. Each snapshot entry runs exactly once, in no
    /// particular order.
    ///
    /// Bodies that write reactive fields recurse into `trigger` inline, so
    /// an effect that unconditionally writes a field it also reads will
    /// exhaust the call stack. That cycle is a caller error this engine
    /// does not guard against.
    pub fn trigger(&self, source: SourceId, field: &str) {
        let Some(snapshot) = self.inner.sources.snapshot(source, field) else {
            cov_mark::hit!(trigger_without_subscribers);
            return;
        };
        for effect in snapshot {
            self.run_effect(effect);
        }
    }

    /// Run `f` with dependency tracking suppressed.
    ///
    /// Reads inside `f` behave as if no effect were running: they are not
    /// recorded against the effect that called `untracked`, so later writes
    /// to those fields will not re-run it.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _frame = self.inner.active.enter(None);
        f()
    }

    /// The effect currently eligible to receive trackings, if any.
    ///
    /// `None` outside any effect body and inside [`Engine::untracked`]
    /// regions.
    pub fn active_effect(&self) -> Option<EffectId> {
        self.inner.active.current()
    }

    /// Whether `effect` has been disposed.
    ///
    /// Also `true` for ids this engine never issued.
    pub fn is_disposed(&self, effect: EffectId) -> bool {
        self.inner.effects.is_disposed(effect)
    }
}

#[cfg(test)]
impl Engine {
    pub(crate) fn subscriber_count(&self, source: SourceId, field: &str) -> usize {
        self.inner.sources.subscriber_count(source, field)
    }

    pub(crate) fn field_tracked(&self, source: SourceId, field: &str) -> bool {
        self.inner.sources.has_field(source, field)
    }

    pub(crate) fn dep_count(&self, effect: EffectId) -> usize {
        self.inner.effects.dep_count(effect)
    }

    pub(crate) fn stack_depth(&self) -> usize {
        self.inner.active.depth()
    }
}
