//! Deployment status tailing.

mod runner;
mod state;

pub use runner::*;
pub use state::*;
