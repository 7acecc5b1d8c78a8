use super::atom::Atom;
use super::element::Element;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order for valence accounting.
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// An edge between two atoms, indexed into the parent molecule's atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

/// One 3D coordinate assignment for a molecule's atoms, in Angstroms.
///
/// A molecule may carry several conformers: the embedder produces one, and
/// the docking engine's output contributes one per ranked pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    pub positions: Vec<Point3<f64>>,
}

impl Conformer {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self { positions }
    }
}

/// A molecular graph with atoms, bonds, adjacency information, and zero or
/// more attached conformers.
///
/// Heavy-atom connectivity is the load-bearing invariant of the docking
/// pipeline: embedding, refinement, and protonation may change coordinates,
/// explicit hydrogens, and (via template reassignment) bond orders, but never
/// which heavy atoms are bonded to which.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// adjacency[atom_idx] = list of (neighbor_atom_idx, bond_idx)
    adjacency: Vec<Vec<(usize, usize)>>,
    conformers: Vec<Conformer>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a molecule from parts, constructing the adjacency list.
    pub fn from_parts(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut molecule = Self {
            atoms,
            bonds: Vec::new(),
            adjacency: Vec::new(),
            conformers: Vec::new(),
        };
        molecule.adjacency = vec![Vec::new(); molecule.atoms.len()];
        for bond in bonds {
            molecule.push_bond(bond);
        }
        molecule
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) {
        self.push_bond(Bond {
            atom1,
            atom2,
            order,
        });
    }

    fn push_bond(&mut self, bond: Bond) {
        let index = self.bonds.len();
        self.adjacency[bond.atom1].push((bond.atom2, index));
        self.adjacency[bond.atom2].push((bond.atom1, index));
        self.bonds.push(bond);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    pub fn atom_mut(&mut self, index: usize) -> &mut Atom {
        &mut self.atoms[index]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bonds_mut(&mut self) -> &mut [Bond] {
        &mut self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_heavy()).count()
    }

    /// Neighbor atom indices of `atom_idx`.
    pub fn neighbors(&self, atom_idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom_idx].iter().map(|&(n, _)| n)
    }

    /// Graph degree (number of explicit bonds) of an atom.
    pub fn degree(&self, atom_idx: usize) -> usize {
        self.adjacency[atom_idx].len()
    }

    /// The bond between two atoms, if any.
    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<&Bond> {
        self.adjacency[atom1]
            .iter()
            .find(|&&(n, _)| n == atom2)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    pub fn bond_index_between(&self, atom1: usize, atom2: usize) -> Option<usize> {
        self.adjacency[atom1]
            .iter()
            .find(|&&(n, _)| n == atom2)
            .map(|&(_, bi)| bi)
    }

    /// Sum of explicit bond orders at an atom (aromatic counted as 1.5).
    pub fn explicit_valence(&self, atom_idx: usize) -> f64 {
        self.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.as_f64())
            .sum()
    }

    /// Number of connected components in the graph. Isolated atoms count.
    pub fn num_fragments(&self) -> usize {
        let mut visited = vec![false; self.atoms.len()];
        let mut fragments = 0;
        for start in 0..self.atoms.len() {
            if visited[start] {
                continue;
            }
            fragments += 1;
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                if std::mem::replace(&mut visited[current], true) {
                    continue;
                }
                stack.extend(self.neighbors(current).filter(|&n| !visited[n]));
            }
        }
        fragments
    }

    /// Molecular formula in Hill order: C first, then H, then the remaining
    /// elements alphabetically. Implicit hydrogens are included.
    pub fn molecular_formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.symbol()).or_insert(0) += 1;
            if atom.implicit_hydrogens > 0 {
                *counts.entry("H").or_insert(0) += atom.implicit_hydrogens as usize;
            }
        }
        let mut formula = String::new();
        let mut append = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };
        if let Some(&carbons) = counts.get("C") {
            append("C", carbons);
            counts.remove("C");
            if let Some(&hydrogens) = counts.get("H") {
                append("H", hydrogens);
                counts.remove("H");
            }
        }
        for (symbol, count) in counts {
            append(symbol, count);
        }
        formula
    }

    /// Molecular weight in Daltons, including implicit hydrogens.
    pub fn molecular_weight(&self) -> f64 {
        self.atoms
            .iter()
            .map(|a| {
                a.element.atomic_mass()
                    + a.implicit_hydrogens as f64 * Element::HYDROGEN.atomic_mass()
            })
            .sum()
    }

    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    pub fn conformer_count(&self) -> usize {
        self.conformers.len()
    }

    pub fn conformer(&self, index: usize) -> Option<&Conformer> {
        self.conformers.get(index)
    }

    pub fn conformer_mut(&mut self, index: usize) -> Option<&mut Conformer> {
        self.conformers.get_mut(index)
    }

    pub fn add_conformer(&mut self, conformer: Conformer) -> usize {
        debug_assert_eq!(conformer.positions.len(), self.atoms.len());
        self.conformers.push(conformer);
        self.conformers.len() - 1
    }

    pub fn clear_conformers(&mut self) {
        self.conformers.clear();
    }

    /// Converts implicit hydrogens into explicit graph atoms, each bonded to
    /// its parent with a single bond. Existing conformers are extended with
    /// placeholder positions at the parent atom; the embedder will move them.
    pub fn add_hydrogens(&mut self) {
        let heavy_count = self.atoms.len();
        for parent in 0..heavy_count {
            let count = self.atoms[parent].implicit_hydrogens;
            self.atoms[parent].implicit_hydrogens = 0;
            for _ in 0..count {
                let h = self.add_atom(Atom::new(Element::HYDROGEN));
                self.add_bond(parent, h, BondOrder::Single);
                for conformer in &mut self.conformers {
                    let parent_pos = conformer.positions[parent];
                    conformer.positions.push(parent_pos);
                }
            }
        }
    }

    /// Removes neutral, singly-bonded explicit hydrogens, folding them back
    /// into the implicit hydrogen count of their heavy neighbor. Conformer
    /// coordinates are filtered to match. Hydrogens that are charged or not
    /// attached to a heavy atom (e.g. molecular hydrogen) stay explicit.
    pub fn remove_hydrogens(&mut self) {
        let mut removable = vec![false; self.atoms.len()];
        for (index, atom) in self.atoms.iter().enumerate() {
            if !atom.element.is_hydrogen() || atom.formal_charge != 0 || self.degree(index) != 1 {
                continue;
            }
            let neighbor = self.adjacency[index][0].0;
            if self.atoms[neighbor].is_heavy() {
                removable[index] = true;
            }
        }
        if !removable.iter().any(|&r| r) {
            return;
        }

        let mut new_index = vec![usize::MAX; self.atoms.len()];
        let mut kept_atoms = Vec::with_capacity(self.atoms.len());
        for (index, atom) in self.atoms.iter().enumerate() {
            if !removable[index] {
                new_index[index] = kept_atoms.len();
                kept_atoms.push(*atom);
            }
        }
        for index in 0..self.atoms.len() {
            if removable[index] {
                let neighbor = self.adjacency[index][0].0;
                kept_atoms[new_index[neighbor]].implicit_hydrogens += 1;
            }
        }
        let kept_bonds: Vec<Bond> = self
            .bonds
            .iter()
            .filter(|b| !removable[b.atom1] && !removable[b.atom2])
            .map(|b| Bond {
                atom1: new_index[b.atom1],
                atom2: new_index[b.atom2],
                order: b.order,
            })
            .collect();
        let conformers: Vec<Conformer> = self
            .conformers
            .iter()
            .map(|c| {
                Conformer::new(
                    c.positions
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| !removable[i])
                        .map(|(_, &p)| p)
                        .collect(),
                )
            })
            .collect();

        *self = Molecule::from_parts(kept_atoms, kept_bonds);
        self.conformers = conformers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> Molecule {
        // CCO with implicit hydrogens assigned.
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom {
            implicit_hydrogens: 3,
            ..Atom::new(Element::CARBON)
        });
        let c2 = mol.add_atom(Atom {
            implicit_hydrogens: 2,
            ..Atom::new(Element::CARBON)
        });
        let o = mol.add_atom(Atom {
            implicit_hydrogens: 1,
            ..Atom::new(Element::OXYGEN)
        });
        mol.add_bond(c1, c2, BondOrder::Single);
        mol.add_bond(c2, o, BondOrder::Single);
        mol
    }

    #[test]
    fn adjacency_and_degrees() {
        let mol = ethanol();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.degree(1), 2);
        assert_eq!(mol.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert!(mol.bond_between(0, 1).is_some());
        assert!(mol.bond_between(0, 2).is_none());
    }

    #[test]
    fn formula_uses_hill_order() {
        assert_eq!(ethanol().molecular_formula(), "C2H6O");
    }

    #[test]
    fn molecular_weight_includes_implicit_hydrogens() {
        assert!((ethanol().molecular_weight() - 46.07).abs() < 0.01);
    }

    #[test]
    fn fragment_counting() {
        let mut mol = ethanol();
        assert_eq!(mol.num_fragments(), 1);
        mol.add_atom(Atom::new(Element::OXYGEN));
        assert_eq!(mol.num_fragments(), 2);
    }

    #[test]
    fn hydrogen_round_trip_preserves_heavy_graph() {
        let mut mol = ethanol();
        mol.add_conformer(Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(2.2, 1.2, 0.0),
        ]));
        let formula = mol.molecular_formula();

        mol.add_hydrogens();
        assert_eq!(mol.atom_count(), 9);
        assert_eq!(mol.conformers()[0].positions.len(), 9);
        assert_eq!(mol.molecular_formula(), formula);

        mol.remove_hydrogens();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.heavy_atom_count(), 3);
        assert_eq!(mol.conformers()[0].positions.len(), 3);
        assert_eq!(mol.molecular_formula(), formula);
        assert!(mol.bond_between(0, 1).is_some());
        assert!(mol.bond_between(1, 2).is_some());
    }

    #[test]
    fn explicit_valence_counts_orders() {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(Element::CARBON));
        let c2 = mol.add_atom(Atom::new(Element::CARBON));
        let o = mol.add_atom(Atom::new(Element::OXYGEN));
        mol.add_bond(c1, c2, BondOrder::Double);
        mol.add_bond(c2, o, BondOrder::Single);
        assert_eq!(mol.explicit_valence(c2), 3.0);
        assert_eq!(mol.explicit_valence(o), 1.0);
    }
}
