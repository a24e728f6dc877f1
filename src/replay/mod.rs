//! Mission replay
//!
//! A [`ReplaySession`] plays a recorded mission log back through the same decode path
//! as live transmissions, paced by a [`ReplayEngine`] running on its own task.

mod engine;
mod source;

pub use engine::{
    PlaybackState, ReplayControl, ReplayEngine, ReplayEvent, ReplaySession, clamp_speed,
    pacing_delay,
};
pub use source::{MemorySource, TripleSource};
