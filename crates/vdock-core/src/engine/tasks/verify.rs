//! Pose verification and score pairing.
//!
//! The engine's output round-trips through formats that drop bond orders
//! and nonpolar hydrogens, so the docked poses are checked and repaired
//! against the prepared ligand that was sent in (the protonated structure
//! read back from the run's own working directory): the heavy-atom graphs
//! must match exactly, bond orders and hydrogen counts are transferred back
//! from that reference, and every pose must carry exactly one score.

use crate::core::chem::template;
use crate::core::io::{pdb, scores};
use crate::core::models::Molecule;
use crate::engine::error::DockingError;
use crate::engine::workdir::WorkingDir;
use std::fs::File;
use std::io::BufReader;
use tracing::debug;

/// The verified outcome of a docking run: one molecule whose conformers are
/// the docked poses, best first, paired with their affinity scores.
#[derive(Debug, Clone)]
pub struct VerifiedPoses {
    pub molecule: Molecule,
    pub scores: Vec<f64>,
}

pub fn run(reference: &Molecule, workdir: &WorkingDir) -> Result<VerifiedPoses, DockingError> {
    let mut docked = {
        let mut reader = BufReader::new(File::open(workdir.docked_ligand_pdb())?);
        pdb::read_molecule(&mut reader)?
    };
    let parsed_scores = {
        let mut reader = BufReader::new(File::open(workdir.engine_out())?);
        scores::parse_scores(&mut reader)?
    };

    // Vina strips nonpolar hydrogens; comparison happens on heavy graphs,
    // with hydrogen counts restored from the reference afterwards.
    docked.remove_hydrogens();
    let mut heavy_reference = reference.clone();
    heavy_reference.remove_hydrogens();

    template::assign_bond_orders(&mut docked, &heavy_reference)?;

    if parsed_scores.len() != docked.conformer_count() {
        return Err(DockingError::ScoreCountMismatch {
            scores: parsed_scores.len(),
            poses: docked.conformer_count(),
        });
    }
    debug!(poses = docked.conformer_count(), best = ?parsed_scores.first(), "Poses verified");
    Ok(VerifiedPoses {
        molecule: docked,
        scores: parsed_scores,
    })
}
