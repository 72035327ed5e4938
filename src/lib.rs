//! Persona Sim - simulated personas publishing multimodal social posts
//!
//! Each persona derives an activity, mood and content idea from the hour of
//! day, asks the configured generation services for text, image, audio and
//! video, and files the resulting post on a fixed interval.

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod persona;
pub mod scheduler;
pub mod simulation;
pub mod storage;

pub use error::{Error, Result};
