//! Mission logs: recording received blocks and reading them back for replay.

pub mod log;
pub mod recorder;

pub use log::{MissionLogHeader, MissionLogReader};
pub use recorder::{MAX_NAME_SUFFIX, MissionRecord, MissionRecorder, append_block};
