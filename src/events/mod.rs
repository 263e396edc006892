//! Operator-facing deployment events and their output sinks.

mod sink;
mod types;

pub use sink::*;
pub use types::*;
