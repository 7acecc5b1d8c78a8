//! File format support for the docking pipeline.
//!
//! Covers the three text formats the pipeline touches directly: PDB ligand
//! files exchanged with the external tools, the engine's search-box
//! configuration, and the scored pose output.

pub mod conf;
pub mod pdb;
pub mod scores;
