//! Orchestration layer for the docking pipeline.
//!
//! Ties the chemistry and I/O primitives in [`crate::core`] to the external
//! docking engine and conversion tools: configuration, prepared targets,
//! scratch directories, subprocess execution, and the per-stage tasks the
//! workflow runs in order.

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod target;
pub mod tasks;
pub mod workdir;
