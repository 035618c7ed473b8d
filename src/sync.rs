//! Index synchronization between the carousel and the playback engine.
//!
//! The carousel owns a continuous scroll offset, the audio engine owns the
//! track that is actually playing. `IndexSynchronizer` reconciles both into a
//! single `current_index` without letting one side echo commands back at the
//! other.

mod collaborators;
mod synchronizer;

pub use collaborators::*;
pub use synchronizer::*;

#[cfg(test)]
mod tests;
