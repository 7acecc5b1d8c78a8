//! Seeded generation of an initial 3D conformer from the 2D graph.
//!
//! A lightweight distance-geometry scheme: atoms start at seeded random
//! positions and are iteratively relaxed against three families of distance
//! constraints (bonded pairs, 1-3 pairs from idealized angles, and a lower
//! bound for everything further apart). An attempt converges when the worst
//! bond length lands close to its covalent target; geometrically
//! pathological inputs may fail, which callers handle by retrying with the
//! next seed.

use crate::core::models::{BondOrder, Conformer, Molecule};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct EmbedParams {
    /// Relaxation sweeps over the constraint list.
    pub max_iterations: usize,
    /// Largest tolerated bond-length deviation (Angstroms) for success.
    pub convergence_tolerance: f64,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            max_iterations: 600,
            convergence_tolerance: 0.25,
        }
    }
}

enum Constraint {
    /// Pair must sit at `target` Angstroms.
    Exact { i: usize, j: usize, target: f64, strength: f64 },
    /// Pair must sit at least `minimum` Angstroms apart.
    Lower { i: usize, j: usize, minimum: f64 },
}

/// Attempts to generate one 3D conformer for `molecule` using the given
/// seed. Returns `None` when the relaxation does not converge; the caller
/// retries with a different seed.
pub fn generate_conformer(
    molecule: &Molecule,
    seed: u64,
    params: &EmbedParams,
) -> Option<Conformer> {
    let n = molecule.atom_count();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(Conformer::new(vec![Point3::origin()]));
    }

    let constraints = build_constraints(molecule);
    let mut rng = StdRng::seed_from_u64(seed);
    let side = 3.0 * (n as f64).cbrt();
    let mut positions: Vec<Point3<f64>> = (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(-side..side),
                rng.gen_range(-side..side),
                rng.gen_range(-side..side),
            )
        })
        .collect();

    for iteration in 0..params.max_iterations {
        for constraint in &constraints {
            apply(constraint, &mut positions, &mut rng);
        }
        if iteration % 25 == 24 {
            let deviation = max_bond_deviation(molecule, &positions);
            if deviation < params.convergence_tolerance {
                break;
            }
        }
    }

    let deviation = max_bond_deviation(molecule, &positions);
    trace!(seed, deviation, "embedding attempt finished");
    if deviation >= params.convergence_tolerance {
        return None;
    }

    // Center on the origin for stable downstream output.
    let centroid = positions
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n as f64;
    for position in &mut positions {
        position.coords -= centroid;
    }
    Some(Conformer::new(positions))
}

/// Ideal length of a bond given its order, from covalent radii.
pub fn ideal_bond_length(molecule: &Molecule, atom1: usize, atom2: usize, order: BondOrder) -> f64 {
    let sum = molecule.atom(atom1).element.covalent_radius()
        + molecule.atom(atom2).element.covalent_radius();
    match order {
        BondOrder::Single => sum,
        BondOrder::Aromatic => 0.91 * sum,
        BondOrder::Double => 0.87 * sum,
        BondOrder::Triple => 0.78 * sum,
    }
}

fn build_constraints(molecule: &Molecule) -> Vec<Constraint> {
    let n = molecule.atom_count();
    let mut constraints = Vec::new();
    let mut bonded_or_angle = vec![false; n * n];
    let mark = |i: usize, j: usize, grid: &mut Vec<bool>| {
        grid[i * n + j] = true;
        grid[j * n + i] = true;
    };

    for bond in molecule.bonds() {
        constraints.push(Constraint::Exact {
            i: bond.atom1,
            j: bond.atom2,
            target: ideal_bond_length(molecule, bond.atom1, bond.atom2, bond.order),
            strength: 0.5,
        });
        mark(bond.atom1, bond.atom2, &mut bonded_or_angle);
    }

    for center in 0..n {
        let neighbors: Vec<usize> = molecule.neighbors(center).collect();
        if neighbors.len() < 2 {
            continue;
        }
        let angle = idealized_angle(molecule, center);
        for a in 0..neighbors.len() {
            for b in (a + 1)..neighbors.len() {
                let (i, k) = (neighbors[a], neighbors[b]);
                let d_ij = ideal_bond_length(
                    molecule,
                    i,
                    center,
                    molecule.bond_between(i, center).expect("bonded").order,
                );
                let d_jk = ideal_bond_length(
                    molecule,
                    center,
                    k,
                    molecule.bond_between(center, k).expect("bonded").order,
                );
                let target =
                    (d_ij * d_ij + d_jk * d_jk - 2.0 * d_ij * d_jk * angle.cos()).sqrt();
                constraints.push(Constraint::Exact {
                    i,
                    j: k,
                    target,
                    strength: 0.25,
                });
                mark(i, k, &mut bonded_or_angle);
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if bonded_or_angle[i * n + j] {
                continue;
            }
            let minimum = molecule.atom(i).element.covalent_radius()
                + molecule.atom(j).element.covalent_radius()
                + 0.8;
            constraints.push(Constraint::Lower { i, j, minimum });
        }
    }
    constraints
}

/// Idealized bond angle at a center atom from its unsaturation: linear for
/// triple bonds, trigonal for double bonds or aromatic centers, else
/// tetrahedral.
fn idealized_angle(molecule: &Molecule, center: usize) -> f64 {
    let mut has_double = false;
    for neighbor in molecule.neighbors(center) {
        match molecule
            .bond_between(center, neighbor)
            .expect("adjacency implies bond")
            .order
        {
            BondOrder::Triple => return std::f64::consts::PI,
            BondOrder::Double | BondOrder::Aromatic => has_double = true,
            BondOrder::Single => {}
        }
    }
    if has_double || molecule.atom(center).is_aromatic {
        120.0_f64.to_radians()
    } else {
        109.47_f64.to_radians()
    }
}

fn apply(constraint: &Constraint, positions: &mut [Point3<f64>], rng: &mut StdRng) {
    let (i, j) = match constraint {
        Constraint::Exact { i, j, .. } | Constraint::Lower { i, j, .. } => (*i, *j),
    };
    let mut delta = positions[j] - positions[i];
    let mut distance = delta.norm();
    if distance < 1e-6 {
        // Coincident points: nudge apart in a random direction.
        delta = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        distance = delta.norm().max(1e-6);
    }
    let direction = delta / distance;

    match *constraint {
        Constraint::Exact { target, strength, .. } => {
            let correction = 0.5 * strength * (distance - target);
            positions[i] += direction * correction;
            positions[j] -= direction * correction;
        }
        Constraint::Lower { minimum, .. } => {
            if distance < minimum {
                let correction = 0.5 * 0.3 * (distance - minimum);
                positions[i] += direction * correction;
                positions[j] -= direction * correction;
            }
        }
    }
}

fn max_bond_deviation(molecule: &Molecule, positions: &[Point3<f64>]) -> f64 {
    molecule
        .bonds()
        .iter()
        .map(|bond| {
            let actual = (positions[bond.atom2] - positions[bond.atom1]).norm();
            let ideal = ideal_bond_length(molecule, bond.atom1, bond.atom2, bond.order);
            (actual - ideal).abs()
        })
        .fold(0.0, f64::max)
}
