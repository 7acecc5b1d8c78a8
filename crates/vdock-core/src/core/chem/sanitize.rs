//! Structural sanitization and docking-domain constraint checks.
//!
//! Sanitization rejects graphs that are chemically inconsistent (impossible
//! valences, aromatic flags outside a ring system); constraint checks reject
//! molecules that are well-formed but outside what the docking pipeline
//! supports (multiple fragments, excessive size).

use crate::core::models::{BondOrder, Molecule};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Atom {atom} ({symbol}) has valence {valence} exceeding the maximum {maximum}")]
    BadValence {
        atom: usize,
        symbol: &'static str,
        valence: u8,
        maximum: u8,
    },
    #[error("Aromatic atom {atom} is not part of an aromatic ring system")]
    AromaticAtomOutsideRing { atom: usize },
    #[error("Aromatic bond between atoms {atom1} and {atom2} with a non-aromatic endpoint")]
    AromaticBondOutsideSystem { atom1: usize, atom2: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("Molecule has no atoms")]
    Empty,
    #[error("Molecule has {count} disconnected fragments; docking requires exactly one")]
    MultipleFragments { count: usize },
    #[error("Molecule has {count} heavy atoms, above the limit of {limit}")]
    TooManyHeavyAtoms { count: usize, limit: usize },
}

/// Validates chemical consistency of the molecular graph.
pub fn sanitize(molecule: &Molecule) -> Result<(), SanitizeError> {
    for (index, atom) in molecule.atoms().iter().enumerate() {
        // Aromatic bonds are counted once each; the ring's shared electron
        // system is not charged against any single atom's valence.
        let mut total = atom.implicit_hydrogens as f64;
        let mut aromatic_bonds = 0usize;
        for neighbor in molecule.neighbors(index) {
            let bond = molecule
                .bond_between(index, neighbor)
                .expect("adjacency implies bond");
            if bond.order == BondOrder::Aromatic {
                aromatic_bonds += 1;
                total += 1.0;
            } else {
                total += bond.order.as_f64();
            }
        }

        let maximum = atom
            .element
            .valences()
            .iter()
            .map(|&v| (v as i16 + atom.formal_charge as i16).max(0) as u8)
            .max()
            .unwrap_or(0);
        if total > maximum as f64 {
            return Err(SanitizeError::BadValence {
                atom: index,
                symbol: atom.element.symbol(),
                valence: total.ceil() as u8,
                maximum,
            });
        }

        if atom.is_aromatic && aromatic_bonds < 2 {
            return Err(SanitizeError::AromaticAtomOutsideRing { atom: index });
        }
    }

    for bond in molecule.bonds() {
        if bond.order == BondOrder::Aromatic
            && !(molecule.atom(bond.atom1).is_aromatic && molecule.atom(bond.atom2).is_aromatic)
        {
            return Err(SanitizeError::AromaticBondOutsideSystem {
                atom1: bond.atom1,
                atom2: bond.atom2,
            });
        }
    }
    Ok(())
}

/// Checks the docking-domain constraints on an otherwise valid molecule.
pub fn check_constraints(molecule: &Molecule, max_heavy_atoms: usize) -> Result<(), ConstraintViolation> {
    if molecule.atom_count() == 0 {
        return Err(ConstraintViolation::Empty);
    }
    let fragments = molecule.num_fragments();
    if fragments > 1 {
        return Err(ConstraintViolation::MultipleFragments { count: fragments });
    }
    let heavy = molecule.heavy_atom_count();
    if heavy > max_heavy_atoms {
        return Err(ConstraintViolation::TooManyHeavyAtoms {
            count: heavy,
            limit: max_heavy_atoms,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;

    #[test]
    fn accepts_common_molecules() {
        for input in ["CCO", "c1ccccc1", "CC(=O)O", "c1cc[nH]c1", "[NH4+]"] {
            let mol = smiles::parse(input).unwrap();
            assert_eq!(sanitize(&mol), Ok(()), "sanitize should accept '{input}'");
        }
    }

    #[test]
    fn rejects_hypervalent_carbon() {
        // Five explicit bonds on a bracket carbon with no implicit hydrogens.
        let mol = smiles::parse("C[C](C)(C)(C)C").unwrap();
        assert!(matches!(
            sanitize(&mol),
            Err(SanitizeError::BadValence { .. })
        ));
    }

    #[test]
    fn rejects_acyclic_aromatic_atoms() {
        let mol = smiles::parse("cc").unwrap();
        assert!(matches!(
            sanitize(&mol),
            Err(SanitizeError::AromaticAtomOutsideRing { .. })
        ));
    }

    #[test]
    fn constraint_checks() {
        let ethanol = smiles::parse("CCO").unwrap();
        assert_eq!(check_constraints(&ethanol, 100), Ok(()));

        let salt = smiles::parse("CC.O").unwrap();
        assert_eq!(
            check_constraints(&salt, 100),
            Err(ConstraintViolation::MultipleFragments { count: 2 })
        );

        assert_eq!(
            check_constraints(&ethanol, 2),
            Err(ConstraintViolation::TooManyHeavyAtoms { count: 3, limit: 2 })
        );
    }
}
