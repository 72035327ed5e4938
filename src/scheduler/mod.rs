//! Simulation scheduler
//!
//! Handles each persona's posting lifecycle:
//! - Waiting out the post interval
//! - Assembling and persisting posts
//! - Skipping failed cycles
//! - Stopping on timeout or shutdown

mod runner;
mod state;

pub use runner::*;
pub use state::*;
