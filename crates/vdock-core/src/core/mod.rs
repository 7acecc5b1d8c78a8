//! # Core Module
//!
//! This module provides the fundamental building blocks for ligand
//! preparation and docking result validation, serving as the stateless
//! computational core of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures and algorithms required to
//! take a 2D molecular descriptor to a refined 3D structure and back again
//! from raw docking engine output. It has no knowledge of external processes
//! or working directories; those concerns live in the `engine` layer.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, conformers,
//!   and the molecular graph with its adjacency structure.
//! - **Chemistry Algorithms** ([`chem`]) - Descriptor parsing (SMILES and
//!   InChI), canonical serialization, sanitization, seeded 3D embedding,
//!   force-field refinement, and template-based bond order reassignment.
//! - **File I/O** ([`io`]) - PDB structure files, search-box configuration
//!   files, and affinity score extraction from engine-derived output.

pub mod chem;
pub mod io;
pub mod models;
