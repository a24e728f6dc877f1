//! Stream adapters for snapshot consumers

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
