//! Swarm CLI - Command line tools for the swarm deconfliction simulator.
//!
//! This crate provides:
//! - swarm-sim: offline conflict analysis, hold planning and playback

pub mod config;
pub mod sim;

pub use config::Config;
