//! Effect registration, the run procedure, and disposal.
//!
//! An effect is registered once and re-run by the engine whenever a field
//! it read during its previous run is written. Every run starts from a
//! blank slate: the effect first detaches from each subscriber set recorded
//! by the previous run, then executes its body while the reads it performs
//! re-subscribe it. Dependencies are therefore dynamic: a branch not taken
//! this run drops the subscriptions it held last run, so stale fields
//! cannot re-trigger the effect and subscriber sets cannot grow without
//! bound.

use std::sync::Arc;

use crate::arena::{Dependency, EffectId};
use crate::engine::Engine;

impl Engine {
    /// Register `body` as an effect and run it immediately.
    ///
    /// Reads performed by the body (routed through [`Engine::track`] by the
    /// interception layer) subscribe the effect to the fields it touched;
    /// any later [`Engine::trigger`] on one of those fields re-runs it,
    /// repeating the detach-then-rebuild cycle.
    ///
    /// Registering inside another effect's body is fine: the inner effect's
    /// reads are attributed to the inner effect, and the outer effect
    /// resumes receiving trackings once the inner run completes. Note that
    /// the outer effect then registers a fresh inner effect on each of its
    /// own re-runs; [`Engine::dispose`] the previous one if that is not
    /// what you want.
    ///
    /// The returned [`EffectId`] is a plain `Copy` identifier. Dropping it
    /// changes nothing; an effect stays registered (net of its own dynamic
    /// cleanup) until `dispose` is called with its id.
    pub fn register<F>(&self, body: F) -> EffectId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.effects.insert(Arc::new(body));
        self.run_effect(id);
        id
    }

    /// Detach `effect` from every subscriber set it belongs to and mark it
    /// inert.
    ///
    /// A disposed effect never runs again: triggers skip it even when it is
    /// already part of an in-flight snapshot, and its body is dropped.
    /// Disposing twice, or disposing an id that never existed, is a no-op.
    pub fn dispose(&self, effect: EffectId) {
        let Some(deps) = self.inner.effects.dispose(effect) else {
            return;
        };
        self.remove_memberships(effect, &deps);
    }

    /// One full run of `effect`: detach from the previous run's
    /// dependencies, then execute the body with the effect on top of the
    /// active stack so that its reads re-subscribe it.
    pub(crate) fn run_effect(&self, effect: EffectId) {
        // Trigger snapshots may still hold effects disposed by an earlier
        // entry of the same round.
        let Some(body) = self.inner.effects.body(effect) else {
            cov_mark::hit!(run_skips_disposed);
            return;
        };

        self.detach(effect);

        // The guard pops the frame on every exit path; a panicking body
        // must not leave the stack misattributing subsequent reads.
        let _frame = self.inner.active.enter(Some(effect));
        (*body)();
    }

    /// Remove `effect` from every subscriber set in its reverse dependency
    /// list and clear the list. Cost is proportional to the number of
    /// dependencies recorded by the previous run.
    fn detach(&self, effect: EffectId) {
        let deps = self.inner.effects.take_deps(effect);
        self.remove_memberships(effect, &deps);
    }

    fn remove_memberships(&self, effect: EffectId, deps: &[Dependency]) {
        for dep in deps {
            self.inner
                .sources
                .remove_subscriber(dep.source, &dep.field, effect);
        }
    }
}
