use crate::core::chem::inchi::InchiError;
use crate::core::chem::minimize::MinimizeError;
use crate::core::chem::sanitize::{ConstraintViolation, SanitizeError};
use crate::core::chem::smiles::SmilesError;
use crate::core::chem::template::TemplateError;
use crate::core::io::pdb::PdbError;
use crate::core::io::scores::ScoreError;
use crate::engine::config::ConfigError;
use crate::engine::runner::EngineFailure;
use crate::engine::target::TargetError;
use std::io;
use thiserror::Error;

/// Everything that can go wrong between accepting a ligand and returning
/// its scored poses. Each pipeline stage maps to a distinct variant so
/// callers can tell a chemically invalid input from an engine failure.
#[derive(Debug, Error)]
pub enum DockingError {
    #[error("Failed to parse SMILES: {0}")]
    Smiles(#[from] SmilesError),

    #[error("Failed to parse InChI: {0}")]
    Inchi(#[from] InchiError),

    #[error("Molecule failed sanitization: {0}")]
    Sanitization(#[from] SanitizeError),

    #[error("Molecule not supported: {0}")]
    Unsupported(#[from] ConstraintViolation),

    #[error("Could not embed a 3D conformer after {attempts} attempts")]
    Embedding { attempts: u32 },

    #[error("Geometry refinement failed: {0}")]
    Refinement(#[from] MinimizeError),

    #[error("Ligand file error: {0}")]
    LigandFile(#[from] PdbError),

    #[error("Format conversion with '{tool}' produced no usable output: {detail}")]
    Conversion { tool: String, detail: String },

    #[error("Docking engine error: {0}")]
    Engine(#[from] EngineFailure),

    #[error("Docking engine produced an empty output file")]
    EmptyOutput,

    #[error("Docked pose failed verification against the input molecule: {0}")]
    PoseVerification(#[from] TemplateError),

    #[error("Engine reported {scores} scores for {poses} poses")]
    ScoreCountMismatch { scores: usize, poses: usize },

    #[error("Failed to parse engine scores: {0}")]
    Scores(#[from] ScoreError),

    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
