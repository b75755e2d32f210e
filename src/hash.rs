//! Fixed-seed hashing for the engine's internal collections.
//!
//! Everything the engine keys on is a small id or a short field name, so
//! HashDoS resistance buys nothing here. `FixedHashBuilder` is a zero-sized
//! `BuildHasher` over foldhash with a constant seed: fast, deterministic,
//! and free of per-collection memory overhead.

use std::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

/// Hash map used throughout the engine.
pub(crate) type FastHashMap<K, V> = std::collections::HashMap<K, V, FixedHashBuilder>;

/// Insertion-ordered set used for subscriber bookkeeping.
///
/// Iteration order is the order effects first subscribed, which keeps
/// trigger snapshots deterministic without promising any ordering to
/// callers.
pub(crate) type FastIndexSet<T> = indexmap::IndexSet<T, FixedHashBuilder>;

/// Zero-sized `BuildHasher` with a fixed foldhash seed.
///
/// All instances produce identical hash values, so collections built with
/// `Default` agree with each other.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FixedHashBuilder;

impl BuildHasher for FixedHashBuilder {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(0x66696e65_67726169).build_hasher()
    }
}
