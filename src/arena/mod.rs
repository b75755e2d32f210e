// Arena-backed storage for engine state.
//
// Two slabs sit behind every engine instance: the source arena (the
// dependency registry) and the effect arena (registered effect units).
// Ids are lightweight newtypes over slab indices; operations on stale ids
// are silent no-ops.

pub mod effect_arena;
pub mod source_arena;

pub use effect_arena::{Dependency, EffectArena, EffectBody, EffectId};
pub use source_arena::{SourceArena, SourceId};
