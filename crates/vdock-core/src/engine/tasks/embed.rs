//! 3D embedding: hydrogen completion plus seeded conformer generation.

use crate::core::chem::embed::{self, EmbedParams};
use crate::core::models::Molecule;
use crate::engine::error::DockingError;
use tracing::{debug, warn};

/// Embeds an initial 3D conformer. Hydrogens are made explicit for the
/// embedding itself (realistic geometry needs them) and folded back into
/// implicit counts afterwards; the hydrogens the target's pH calls for are
/// added later, on the written structure. Embedding is retried with the
/// seed incremented by one per attempt, so the whole sequence stays
/// deterministic for a given starting seed.
///
/// Returns the index of the new conformer.
pub fn run(molecule: &mut Molecule, seed: u64, max_attempts: u32) -> Result<usize, DockingError> {
    molecule.add_hydrogens();
    molecule.clear_conformers();
    let params = EmbedParams::default();
    for attempt in 0..max_attempts {
        let attempt_seed = seed.wrapping_add(u64::from(attempt));
        if let Some(conformer) = embed::generate_conformer(molecule, attempt_seed, &params) {
            debug!(attempt = attempt + 1, seed = attempt_seed, "Conformer embedded");
            let index = molecule.add_conformer(conformer);
            molecule.remove_hydrogens();
            return Ok(index);
        }
        warn!(attempt = attempt + 1, seed = attempt_seed, "Embedding attempt failed");
    }
    Err(DockingError::Embedding {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;

    #[test]
    fn embedding_leaves_one_conformer_on_the_heavy_atom_graph() {
        let mut mol = smiles::parse("CCO").unwrap();
        let formula = mol.molecular_formula();
        let index = run(&mut mol, 7, 10).unwrap();
        assert_eq!(index, 0);
        // Hydrogens are explicit only during embedding itself.
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.molecular_formula(), formula);
        assert_eq!(mol.conformer_count(), 1);
        assert_eq!(mol.conformer(0).unwrap().positions.len(), 3);
    }

    #[test]
    fn same_seed_reproduces_the_same_geometry() {
        let mut a = smiles::parse("c1ccccc1").unwrap();
        let mut b = smiles::parse("c1ccccc1").unwrap();
        run(&mut a, 42, 10).unwrap();
        run(&mut b, 42, 10).unwrap();
        let pa = &a.conformer(0).unwrap().positions;
        let pb = &b.conformer(0).unwrap().positions;
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
    }
}
