//! # vdock Core Library
//!
//! A library for automated docking of small molecules against preconfigured
//! macromolecular targets, wrapping an external physics-based scoring engine
//! (AutoDock Vina) behind a validated, reproducible preparation pipeline.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   ([`core::models::Molecule`]), the native chemistry algorithms used for
//!   ligand preparation (descriptor parsing, canonicalization, 3D embedding,
//!   refinement), and structural file I/O.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates one
//!   docking run: the error taxonomy, run configuration, the injected command
//!   execution capability for external tools, the scoped working directory,
//!   and the individual pipeline tasks (normalize, embed, refine, convert,
//!   invoke, verify).
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to execute a complete
//!   docking run from a molecular descriptor to a verified, scored set of
//!   poses. It provides a simple and powerful entry point for end-users of
//!   the library.

pub mod core;
pub mod engine;
pub mod workflows;
