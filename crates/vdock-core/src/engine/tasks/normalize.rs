//! Input normalization: parse, sanitize, constrain, canonicalize.

use crate::core::chem::{canonical, inchi, sanitize, smiles};
use crate::core::models::Molecule;
use crate::engine::error::DockingError;
use tracing::debug;

/// A ligand as supplied by the caller: a descriptor in one of the accepted
/// notations, or a molecule the caller already built. The variant is
/// resolved once here; later stages only ever see a `Molecule`.
#[derive(Debug, Clone)]
pub enum LigandInput {
    Smiles(String),
    Inchi(String),
    Molecule(Molecule),
}

impl LigandInput {
    /// Classifies a bare descriptor string. InChI is self-announcing via its
    /// mandatory `InChI=` prefix; everything else is treated as SMILES.
    pub fn detect(raw: &str) -> Self {
        if raw.starts_with("InChI=") {
            Self::Inchi(raw.to_string())
        } else {
            Self::Smiles(raw.to_string())
        }
    }

    /// The identity used in error messages before normalization has produced
    /// the canonical form: the descriptor as the caller wrote it, or the
    /// canonical serialization of a caller-supplied molecule.
    pub fn identity(&self) -> String {
        match self {
            Self::Smiles(s) | Self::Inchi(s) => s.clone(),
            Self::Molecule(molecule) => canonical::write(molecule),
        }
    }
}

/// Parses and validates a ligand, returning the sanitized molecule together
/// with its canonical SMILES. The canonical form is the identity used in
/// all downstream logging and error reporting, so two spellings of the same
/// molecule behave identically.
pub fn run(input: &LigandInput, max_heavy_atoms: usize) -> Result<(Molecule, String), DockingError> {
    let molecule = match input {
        LigandInput::Smiles(text) => smiles::parse(text)?,
        LigandInput::Inchi(text) => inchi::parse(text)?,
        LigandInput::Molecule(molecule) => molecule.clone(),
    };
    sanitize::sanitize(&molecule)?;
    sanitize::check_constraints(&molecule, max_heavy_atoms)?;
    let canonical_smiles = canonical::write(&molecule);
    debug!(
        smiles = %canonical_smiles,
        heavy_atoms = molecule.atoms().iter().filter(|a| a.is_heavy()).count(),
        "Ligand normalized"
    );
    Ok((molecule, canonical_smiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::DockingError;

    #[test]
    fn smiles_and_inchi_of_ethanol_normalize_identically() {
        let (_, from_smiles) = run(&LigandInput::Smiles("OCC".to_string()), 100).unwrap();
        let (_, from_inchi) = run(
            &LigandInput::Inchi("InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3".to_string()),
            100,
        )
        .unwrap();
        assert_eq!(from_smiles, from_inchi);
    }

    #[test]
    fn heavy_atom_limit_is_enforced() {
        let result = run(&LigandInput::Smiles("CCCCCC".to_string()), 3);
        assert!(matches!(result, Err(DockingError::Unsupported(_))));
    }

    #[test]
    fn multiple_fragments_are_rejected() {
        let result = run(&LigandInput::Smiles("CCO.CC".to_string()), 100);
        assert!(matches!(result, Err(DockingError::Unsupported(_))));
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        assert!(matches!(
            run(&LigandInput::Smiles("C(C".to_string()), 100),
            Err(DockingError::Smiles(_))
        ));
        assert!(matches!(
            run(&LigandInput::Inchi("not an inchi".to_string()), 100),
            Err(DockingError::Inchi(_))
        ));
    }

    #[test]
    fn detect_routes_on_the_inchi_prefix() {
        assert!(matches!(
            LigandInput::detect("InChI=1S/CH4/h1H4"),
            LigandInput::Inchi(_)
        ));
        assert!(matches!(LigandInput::detect("CCO"), LigandInput::Smiles(_)));
    }

    #[test]
    fn prepared_molecules_skip_parsing() {
        let molecule = crate::core::chem::smiles::parse("OCC").unwrap();
        let (_, from_molecule) = run(&LigandInput::Molecule(molecule), 100).unwrap();
        let (_, from_text) = run(&LigandInput::Smiles("CCO".to_string()), 100).unwrap();
        assert_eq!(from_molecule, from_text);
    }
}
