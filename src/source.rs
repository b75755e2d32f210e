use crate::arena::SourceId;
use crate::engine::Engine;

/// Identity of one reactive data source.
///
/// A `Source` does not hold the data; values stay wherever the program
/// keeps them. It is the registry-side identity the interception layer
/// pairs with the real object: reads of the object call
/// [`track`](Source::track) with the field name, writes call
/// [`trigger`](Source::trigger).
///
/// The registry stores bookkeeping under this identity but never the data
/// itself, so it cannot keep the source's data alive. Dropping the handle
/// evicts every subscriber set registered under the source and scrubs the
/// reverse dependency lists of the effects that were subscribed, leaving no
/// reference behind.
///
/// # Usage
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use finegrain::{Engine, Source};
///
/// struct Cell {
///     source: Source,
///     value: AtomicI64,
/// }
///
/// impl Cell {
///     fn get(&self) -> i64 {
///         self.source.track("value");
///         self.value.load(Ordering::Relaxed)
///     }
///
///     fn set(&self, value: i64) {
///         self.value.store(value, Ordering::Relaxed);
///         self.source.trigger("value");
///     }
/// }
///
/// let engine = Engine::new();
/// let cell = Arc::new(Cell {
///     source: Source::new(&engine),
///     value: AtomicI64::new(0),
/// });
///
/// let reader = cell.clone();
/// engine.register(move || {
///     let _ = reader.get();
/// });
/// cell.set(3); // re-runs the effect
/// ```
pub struct Source {
    engine: Engine,
    id: SourceId,
}

impl Source {
    /// Allocate a fresh source identity in `engine`.
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
            id: engine.inner.sources.insert(),
        }
    }

    /// The registry key for this source.
    ///
    /// `SourceId` is `Copy`, which lets effect bodies name the source
    /// without capturing the owning handle.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Equivalent to [`Engine::track`] on this source.
    pub fn track(&self, field: &str) {
        self.engine.track(self.id, field);
    }

    /// Equivalent to [`Engine::trigger`] on this source.
    pub fn trigger(&self, field: &str) {
        self.engine.trigger(self.id, field);
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        let Some(record) = self.engine.inner.sources.remove(self.id) else {
            return;
        };
        // Every effect subscribed somewhere under this source must forget
        // the membership, or its next detach would address a slab slot that
        // may belong to a different source by then.
        for subscribers in record.field_sets() {
            for &effect in subscribers {
                self.engine.inner.effects.scrub_source(effect, self.id);
            }
        }
    }
}

// NOTE: Source intentionally does NOT implement Clone.
// This is a single-ownership model - a second handle would evict the
// registry entry twice. Share the Copy SourceId, or wrap the Source in an
// Arc, if multiple owners need it.
