//! Bond order recovery from a reference molecule.
//!
//! The docking-engine output format does not carry bond orders, so a docked
//! pose read back from it is a connectivity-only skeleton. Orders, aromatic
//! flags, and hydrogen counts are transferred from the prepared pre-docking
//! ligand via a graph isomorphism between the two heavy-atom graphs; the
//! same match doubles as the structural fidelity check that guards against
//! corrupted or mismatched engine output.

use crate::core::models::Molecule;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Atom count mismatch: pose has {target} heavy atoms, reference has {reference}")]
    AtomCountMismatch { target: usize, reference: usize },
    #[error("Bond count mismatch: pose has {target} bonds, reference has {reference}")]
    BondCountMismatch { target: usize, reference: usize },
    #[error("Pose connectivity does not match the reference molecule")]
    NoIsomorphism,
}

/// Finds an element- and connectivity-preserving bijection from `target`
/// atoms to `reference` atoms. Returns `mapping[target_idx] = ref_idx`.
///
/// The identity mapping is tried first (engine output usually preserves
/// atom order); otherwise a backtracking search over element/degree
/// compatible candidates is run. Intended for ligand-sized graphs.
pub fn match_graph(target: &Molecule, reference: &Molecule) -> Option<Vec<usize>> {
    if target.atom_count() != reference.atom_count()
        || target.bond_count() != reference.bond_count()
    {
        return None;
    }
    let n = target.atom_count();

    let identity_ok = (0..n)
        .all(|i| target.atom(i).element == reference.atom(i).element)
        && target.bonds().iter().all(|b| {
            reference.bond_between(b.atom1, b.atom2).is_some()
        });
    if identity_ok {
        return Some((0..n).collect());
    }

    // Most-constrained-first ordering keeps the search shallow.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(target.degree(i)));

    let mut mapping: Vec<Option<usize>> = vec![None; n];
    let mut used = vec![false; n];
    if backtrack(target, reference, &order, 0, &mut mapping, &mut used) {
        Some(mapping.into_iter().map(|m| m.expect("complete mapping")).collect())
    } else {
        None
    }
}

fn backtrack(
    target: &Molecule,
    reference: &Molecule,
    order: &[usize],
    depth: usize,
    mapping: &mut Vec<Option<usize>>,
    used: &mut Vec<bool>,
) -> bool {
    if depth == order.len() {
        return true;
    }
    let t = order[depth];
    for r in 0..reference.atom_count() {
        if used[r]
            || reference.atom(r).element != target.atom(t).element
            || reference.degree(r) != target.degree(t)
        {
            continue;
        }
        let consistent = target.neighbors(t).all(|neighbor| match mapping[neighbor] {
            Some(mapped) => reference.bond_between(r, mapped).is_some(),
            None => true,
        });
        if !consistent {
            continue;
        }
        mapping[t] = Some(r);
        used[r] = true;
        if backtrack(target, reference, order, depth + 1, mapping, used) {
            return true;
        }
        mapping[t] = None;
        used[r] = false;
    }
    false
}

/// Reassigns bond orders, aromatic flags, and hydrogen counts on `target`
/// from `reference`, using the graph match to align atoms. Fails when the
/// two molecules are not the same heavy-atom graph.
pub fn assign_bond_orders(
    target: &mut Molecule,
    reference: &Molecule,
) -> Result<Vec<usize>, TemplateError> {
    if target.atom_count() != reference.atom_count() {
        return Err(TemplateError::AtomCountMismatch {
            target: target.atom_count(),
            reference: reference.atom_count(),
        });
    }
    if target.bond_count() != reference.bond_count() {
        return Err(TemplateError::BondCountMismatch {
            target: target.bond_count(),
            reference: reference.bond_count(),
        });
    }
    let mapping = match_graph(target, reference).ok_or(TemplateError::NoIsomorphism)?;

    for index in 0..target.atom_count() {
        let source = reference.atom(mapping[index]);
        let atom = target.atom_mut(index);
        atom.is_aromatic = source.is_aromatic;
        atom.formal_charge = source.formal_charge;
        atom.implicit_hydrogens = source.implicit_hydrogens;
    }
    let orders: Vec<_> = target
        .bonds()
        .iter()
        .map(|bond| {
            reference
                .bond_between(mapping[bond.atom1], mapping[bond.atom2])
                .expect("isomorphism maps edges to edges")
                .order
        })
        .collect();
    for (bond, order) in target.bonds_mut().iter_mut().zip(orders) {
        bond.order = order;
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;
    use crate::core::models::BondOrder;

    /// A copy of `mol` with every bond order flattened to single, the way a
    /// docking format round trip loses them.
    fn strip_orders(molecule: &Molecule) -> Molecule {
        let mut copy = molecule.clone();
        for bond in copy.bonds_mut() {
            bond.order = BondOrder::Single;
        }
        for index in 0..copy.atom_count() {
            copy.atom_mut(index).is_aromatic = false;
            copy.atom_mut(index).implicit_hydrogens = 0;
        }
        copy
    }

    #[test]
    fn identity_match_is_found() {
        let mol = smiles::parse("CC(=O)O").unwrap();
        let mapping = match_graph(&strip_orders(&mol), &mol).unwrap();
        assert_eq!(mapping, vec![0, 1, 2, 3]);
    }

    #[test]
    fn permuted_atoms_still_match() {
        // Same graph written from the other end.
        let a = smiles::parse("OCC").unwrap();
        let b = smiles::parse("CCO").unwrap();
        let mapping = match_graph(&a, &b).unwrap();
        assert_eq!(a.atom(0).element, b.atom(mapping[0]).element);
        assert_eq!(a.atom(2).element, b.atom(mapping[2]).element);
    }

    #[test]
    fn reassignment_recovers_orders_and_aromaticity() {
        let reference = smiles::parse("c1ccccc1O").unwrap();
        let mut stripped = strip_orders(&reference);
        assign_bond_orders(&mut stripped, &reference).unwrap();
        assert_eq!(stripped.molecular_formula(), reference.molecular_formula());
        assert_eq!(
            stripped
                .bonds()
                .iter()
                .filter(|b| b.order == BondOrder::Aromatic)
                .count(),
            6
        );
    }

    #[test]
    fn different_connectivity_is_rejected() {
        // Isobutane vs n-butane: same formula, different graphs.
        let reference = smiles::parse("CCCC").unwrap();
        let mut other = strip_orders(&smiles::parse("CC(C)C").unwrap());
        assert_eq!(
            assign_bond_orders(&mut other, &reference),
            Err(TemplateError::NoIsomorphism)
        );
    }

    #[test]
    fn atom_count_mismatch_is_rejected() {
        let reference = smiles::parse("CCO").unwrap();
        let mut other = strip_orders(&smiles::parse("CO").unwrap());
        assert!(matches!(
            assign_bond_orders(&mut other, &reference),
            Err(TemplateError::AtomCountMismatch { .. })
        ));
    }
}
