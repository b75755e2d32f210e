#![deny(missing_docs)]

//! Minimal fine-grained reactive dependency tracking.
//!
//! `finegrain` re-runs effect computations automatically whenever reactive
//! data they previously read is written, with no subscriptions wired by
//! hand. The crate is only the engine: the registry linking
//! `(source, field)` pairs to interested effects, the nested-effect
//! execution stack, and the cleanup protocol that keeps subscriptions
//! accurate across conditional reads. Detecting reads and writes on real
//! data is the job of an external interception layer (accessor wrappers,
//! proxies, ...), which routes every read through [`Engine::track`] and
//! every write through [`Engine::trigger`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use finegrain::{Engine, Source};
//!
//! // The interception layer in miniature: reads call track before
//! // returning, writes call trigger after committing.
//! struct Cell {
//!     source: Source,
//!     value: AtomicI64,
//! }
//!
//! impl Cell {
//!     fn get(&self) -> i64 {
//!         self.source.track("value");
//!         self.value.load(Ordering::Relaxed)
//!     }
//!
//!     fn set(&self, value: i64) {
//!         self.value.store(value, Ordering::Relaxed);
//!         self.source.trigger("value");
//!     }
//! }
//!
//! let engine = Engine::new();
//! let cell = Arc::new(Cell {
//!     source: Source::new(&engine),
//!     value: AtomicI64::new(1),
//! });
//!
//! let seen = Arc::new(AtomicI64::new(0));
//! let (reader, sink) = (cell.clone(), seen.clone());
//! engine.register(move || {
//!     sink.store(reader.get(), Ordering::Relaxed);
//! });
//! assert_eq!(seen.load(Ordering::Relaxed), 1); // ran immediately
//!
//! cell.set(7); // the write re-runs the effect synchronously
//! assert_eq!(seen.load(Ordering::Relaxed), 7);
//! ```
//!
//! # Core Types
//!
//! - [`Engine`] - one independent reactive world: dependency registry plus
//!   active-effect stack. No global state; engines don't interact.
//! - [`Source`] - identity of one reactive data source. The registry keys
//!   on this identity and is evicted when the handle drops.
//! - [`EffectId`] - `Copy` identifier returned by [`Engine::register`],
//!   consumed by [`Engine::dispose`].
//!
//! # Effects
//!
//! [`Engine::register`] runs the body once immediately; the reads it
//! performs subscribe it to the fields it touched. Dependencies are
//! dynamic: each re-run first detaches the effect from everything it
//! subscribed to last run, then rebuilds the set from the reads actually
//! performed this run, so a conditional branch not taken stops
//! re-triggering the effect.
//!
//! Effects registered inside another effect's body attribute their reads
//! correctly on both sides of the nested run (the active effect is a
//! stack, not a slot). There is no automatic disposal; call
//! [`Engine::dispose`] to detach an effect for good.
//!
//! # Writes run subscribers inline
//!
//! [`Engine::trigger`] takes a snapshot of the subscribers and runs each
//! exactly once before returning. Effects whose bodies write further
//! reactive fields recurse into `trigger` on the ordinary call stack; an
//! effect that unconditionally writes a field it also reads will exhaust
//! it. The engine is strictly single-threaded; nothing is deferred,
//! batched, or sent across threads.

mod arena;
mod effect;
mod engine;
mod hash;
mod source;
mod stack;

pub use arena::{EffectId, SourceId};
pub use engine::Engine;
pub use source::Source;
