//! Deploy Tail - trigger a remote deployment and tail its status log.

pub mod client;
pub mod config;
pub mod display;
pub mod events;
pub mod protocol;
pub mod session;
pub mod tail;
