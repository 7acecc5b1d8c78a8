//! Geometry refinement of the embedded conformer.

use crate::core::chem::minimize::{self, MinimizeParams, MinimizeSummary};
use crate::core::models::Molecule;
use crate::engine::error::DockingError;
use tracing::debug;

/// Relaxes the given conformer in place with the built-in force terms.
/// Non-convergence within the iteration budget is not an error; the docking
/// engine tolerates slightly strained input geometry.
pub fn run(molecule: &mut Molecule, conformer_index: usize) -> Result<MinimizeSummary, DockingError> {
    let summary = minimize::minimize(molecule, conformer_index, &MinimizeParams::default())?;
    debug!(
        iterations = summary.iterations,
        converged = summary.converged,
        initial_energy = summary.initial_energy,
        final_energy = summary.final_energy,
        "Conformer refined"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;
    use crate::engine::tasks::embed;

    #[test]
    fn refinement_lowers_the_energy() {
        let mut mol = smiles::parse("CCO").unwrap();
        let index = embed::run(&mut mol, 7, 10).unwrap();
        let summary = run(&mut mol, index).unwrap();
        assert!(summary.final_energy <= summary.initial_energy);
    }

    #[test]
    fn refining_a_missing_conformer_fails() {
        let mut mol = smiles::parse("CCO").unwrap();
        assert!(matches!(run(&mut mol, 0), Err(DockingError::Refinement(_))));
    }
}
