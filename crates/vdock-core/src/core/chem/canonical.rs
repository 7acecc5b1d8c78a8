//! Canonical SMILES serialization.
//!
//! Chemically identical inputs must converge to one string so that logs and
//! error messages have a stable molecular identity. The writer uses a
//! two-pass scheme: iterative neighborhood rank refinement to obtain a
//! canonical atom ordering, then a depth-first traversal that emits atoms in
//! rank order with ring-closure digits for back edges.

use crate::core::models::{BondOrder, Molecule};
use std::collections::HashSet;

/// Serializes a molecule to its canonical SMILES string.
pub fn write(molecule: &Molecule) -> String {
    if molecule.atom_count() == 0 {
        return String::new();
    }
    let ranks = canonical_ranks(molecule);
    let mut writer = Writer::new(molecule, &ranks);
    writer.run();
    writer.output
}

/// Computes a canonical, collision-free rank for every atom.
///
/// Initial invariants (element, degree, charge, implicit hydrogens,
/// aromaticity) are refined by repeatedly folding in sorted neighbor ranks;
/// remaining ties are broken one atom at a time followed by re-refinement,
/// so automorphic atoms receive an arbitrary but reproducible order.
pub fn canonical_ranks(molecule: &Molecule) -> Vec<usize> {
    let n = molecule.atom_count();
    let initial: Vec<(u8, usize, i8, u8, bool)> = (0..n)
        .map(|i| {
            let atom = molecule.atom(i);
            (
                atom.element.atomic_number(),
                molecule.degree(i),
                atom.formal_charge,
                atom.implicit_hydrogens,
                atom.is_aromatic,
            )
        })
        .collect();
    let mut ranks = dense_ranks(&initial);

    let mut tie_breaks: Vec<usize> = vec![0; n];
    loop {
        ranks = refine(molecule, ranks, &tie_breaks);
        let distinct = ranks.iter().collect::<HashSet<_>>().len();
        if distinct == n {
            return ranks;
        }
        // Break the smallest tied class by promoting its lowest-index atom.
        let tied_rank = (0..n)
            .map(|i| ranks[i])
            .filter(|&r| ranks.iter().filter(|&&x| x == r).count() > 1)
            .min()
            .expect("tied class must exist");
        let promoted = (0..n)
            .find(|&i| ranks[i] == tied_rank)
            .expect("tied atom must exist");
        tie_breaks[promoted] += 1;
    }
}

fn refine(molecule: &Molecule, mut ranks: Vec<usize>, tie_breaks: &[usize]) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<usize>)> = (0..ranks.len())
            .map(|i| {
                let mut neighbor_ranks: Vec<usize> =
                    molecule.neighbors(i).map(|x| ranks[x]).collect();
                neighbor_ranks.sort_unstable();
                // Promoted atoms sort ahead of their former tie class.
                (ranks[i] * 2 + usize::from(tie_breaks[i] == 0), neighbor_ranks)
            })
            .collect();
        let new_ranks = dense_ranks(&keys);
        if new_ranks == ranks {
            return ranks;
        }
        ranks = new_ranks;
    }
}

fn dense_ranks<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let mut sorted: Vec<K> = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    keys.iter()
        .map(|k| sorted.binary_search(k).expect("key must be present"))
        .collect()
}

struct Writer<'m> {
    molecule: &'m Molecule,
    ranks: &'m [usize],
    visited: Vec<bool>,
    /// Bond indices claimed as DFS tree edges.
    tree_edges: Vec<bool>,
    /// Bond indices claimed as ring-closure (back) edges.
    ring_edges: Vec<bool>,
    /// ring_digits[atom] = (closure digit, partner atom)
    ring_digits: Vec<Vec<(u16, usize)>>,
    next_digit: u16,
    output: String,
}

impl<'m> Writer<'m> {
    fn new(molecule: &'m Molecule, ranks: &'m [usize]) -> Self {
        Self {
            molecule,
            ranks,
            visited: vec![false; molecule.atom_count()],
            tree_edges: vec![false; molecule.bond_count()],
            ring_edges: vec![false; molecule.bond_count()],
            ring_digits: vec![Vec::new(); molecule.atom_count()],
            next_digit: 1,
            output: String::new(),
        }
    }

    fn run(&mut self) {
        // One traversal root per fragment, lowest canonical rank first.
        let mut roots: Vec<usize> = (0..self.molecule.atom_count()).collect();
        roots.sort_by_key(|&i| self.ranks[i]);
        let mut first = true;
        for root in roots {
            if self.visited[root] {
                continue;
            }
            self.discover(root, usize::MAX);
            if !first {
                self.output.push('.');
            }
            first = false;
            self.emit(root, usize::MAX);
        }
    }

    fn ordered_neighbors(&self, atom: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self.molecule.neighbors(atom).collect();
        neighbors.sort_by_key(|&n| self.ranks[n]);
        neighbors
    }

    /// First pass: claims tree edges and allocates ring-closure digits for
    /// back edges, in the same deterministic order the emitter will use.
    fn discover(&mut self, atom: usize, parent: usize) {
        self.visited[atom] = true;
        for neighbor in self.ordered_neighbors(atom) {
            let bond_index = self
                .molecule
                .bond_index_between(atom, neighbor)
                .expect("adjacency implies bond");
            if self.tree_edges[bond_index] || self.ring_edges[bond_index] {
                continue;
            }
            if self.visited[neighbor] {
                if neighbor != parent {
                    self.ring_edges[bond_index] = true;
                    let digit = self.next_digit;
                    self.next_digit += 1;
                    self.ring_digits[atom].push((digit, neighbor));
                    self.ring_digits[neighbor].push((digit, atom));
                }
            } else {
                self.tree_edges[bond_index] = true;
                self.discover(neighbor, atom);
            }
        }
    }

    /// Second pass: emits the SMILES text along the claimed tree edges.
    fn emit(&mut self, atom: usize, parent: usize) {
        self.push_atom_token(atom);
        for (digit, partner) in self.ring_digits[atom].clone() {
            let order = self
                .molecule
                .bond_between(atom, partner)
                .expect("ring digit implies bond")
                .order;
            self.push_bond_symbol(order, atom, partner);
            if digit < 10 {
                self.output.push((b'0' + digit as u8) as char);
            } else {
                self.output.push('%');
                self.output.push_str(&format!("{digit:02}"));
            }
        }

        let children: Vec<usize> = self
            .ordered_neighbors(atom)
            .into_iter()
            .filter(|&n| {
                n != parent
                    && self.tree_edges[self
                        .molecule
                        .bond_index_between(atom, n)
                        .expect("adjacency implies bond")]
            })
            .collect();
        for (position, &child) in children.iter().enumerate() {
            let order = self
                .molecule
                .bond_between(atom, child)
                .expect("adjacency implies bond")
                .order;
            let last = position == children.len() - 1;
            if !last {
                self.output.push('(');
            }
            self.push_bond_symbol(order, atom, child);
            self.emit(child, atom);
            if !last {
                self.output.push(')');
            }
        }
    }

    fn push_bond_symbol(&mut self, order: BondOrder, from: usize, to: usize) {
        match order {
            BondOrder::Single => {
                // A plain single bond between two aromatic atoms must be
                // written out, or the reader would infer an aromatic bond.
                if from != to
                    && self.molecule.atom(from).is_aromatic
                    && self.molecule.atom(to).is_aromatic
                {
                    self.output.push('-');
                }
            }
            BondOrder::Double => self.output.push('='),
            BondOrder::Triple => self.output.push('#'),
            BondOrder::Aromatic => {}
        }
    }

    fn push_atom_token(&mut self, atom: usize) {
        let data = self.molecule.atom(atom);
        let symbol = data.element.symbol();
        let aromatic_symbol;
        let written_symbol = if data.is_aromatic {
            aromatic_symbol = symbol.to_ascii_lowercase();
            aromatic_symbol.as_str()
        } else {
            symbol
        };

        let deficit = {
            let target = data.element.default_valence() as f64;
            (target - self.molecule.explicit_valence(atom)).floor().max(0.0) as u8
        };
        let needs_bracket = !data.element.in_organic_subset()
            || data.formal_charge != 0
            || data.implicit_hydrogens != deficit;

        if !needs_bracket {
            self.output.push_str(written_symbol);
            return;
        }
        self.output.push('[');
        self.output.push_str(written_symbol);
        match data.implicit_hydrogens {
            0 => {}
            1 => self.output.push('H'),
            n => self.output.push_str(&format!("H{n}")),
        }
        match data.formal_charge {
            0 => {}
            1 => self.output.push('+'),
            -1 => self.output.push('-'),
            n if n > 0 => self.output.push_str(&format!("+{n}")),
            n => self.output.push_str(&format!("-{}", -n)),
        }
        self.output.push(']');
    }
}
