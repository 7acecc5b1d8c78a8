//! Local geometry refinement of an embedded conformer.
//!
//! A steepest-descent minimization under a simple molecular-mechanics field:
//! harmonic bond stretching, harmonic 1-3 (angle) distances, and a soft
//! repulsive sphere for non-bonded pairs. Connectivity is never altered;
//! only the conformer's coordinates move.

use super::embed::ideal_bond_length;
use crate::core::models::Molecule;
use nalgebra::Vector3;
use thiserror::Error;
use tracing::trace;

const BOND_FORCE: f64 = 300.0;
const ANGLE_FORCE: f64 = 60.0;
const REPULSION_FORCE: f64 = 50.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinimizeError {
    #[error("Molecule has no conformer at index {0} to refine")]
    NoConformer(usize),
    #[error("Energy became non-finite at iteration {iteration}")]
    NonFiniteEnergy { iteration: usize },
}

#[derive(Debug, Clone)]
pub struct MinimizeParams {
    pub max_iterations: usize,
    /// Initial descent step in Angstroms per unit force.
    pub step: f64,
    /// Convergence threshold on the energy change between iterations.
    pub energy_tolerance: f64,
}

impl Default for MinimizeParams {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            step: 0.002,
            energy_tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeSummary {
    pub converged: bool,
    pub iterations: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
}

struct PairTerm {
    i: usize,
    j: usize,
    target: f64,
    force: f64,
    /// Repulsive terms only act when closer than `target`.
    repulsive_only: bool,
}

/// Minimizes the conformer at `conformer_index` in place.
pub fn minimize(
    molecule: &mut Molecule,
    conformer_index: usize,
    params: &MinimizeParams,
) -> Result<MinimizeSummary, MinimizeError> {
    if molecule.conformer(conformer_index).is_none() {
        return Err(MinimizeError::NoConformer(conformer_index));
    }
    let terms = build_terms(molecule);
    let positions = &mut molecule
        .conformer_mut(conformer_index)
        .expect("checked above")
        .positions;

    let initial_energy = energy(&terms, positions);
    let mut previous = initial_energy;
    let mut step = params.step;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 0..params.max_iterations {
        iterations = iteration + 1;
        let forces = gradient(&terms, positions);
        for (position, g) in positions.iter_mut().zip(forces.iter()) {
            *position -= g * step;
        }
        let current = energy(&terms, positions);
        if !current.is_finite() {
            return Err(MinimizeError::NonFiniteEnergy { iteration });
        }
        if current > previous {
            // Overshot: back off the step and keep going.
            step *= 0.5;
        }
        if (previous - current).abs() < params.energy_tolerance {
            converged = true;
            previous = current;
            break;
        }
        previous = current;
    }

    let summary = MinimizeSummary {
        converged,
        iterations,
        initial_energy,
        final_energy: previous,
    };
    trace!(?summary, "refinement finished");
    Ok(summary)
}

fn build_terms(molecule: &Molecule) -> Vec<PairTerm> {
    let n = molecule.atom_count();
    let mut near = vec![false; n * n];
    let mut terms = Vec::new();

    for bond in molecule.bonds() {
        terms.push(PairTerm {
            i: bond.atom1,
            j: bond.atom2,
            target: ideal_bond_length(molecule, bond.atom1, bond.atom2, bond.order),
            force: BOND_FORCE,
            repulsive_only: false,
        });
        near[bond.atom1 * n + bond.atom2] = true;
        near[bond.atom2 * n + bond.atom1] = true;
    }

    for center in 0..n {
        let neighbors: Vec<usize> = molecule.neighbors(center).collect();
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
                // 1-3 distance for a tetrahedral-ish angle; the embedder has
                // already set the coarse shape, this only tidies it up.
                let angle = 109.47_f64.to_radians();
                let target =
                    (d_ij * d_ij + d_jk * d_jk - 2.0 * d_ij * d_jk * angle.cos()).sqrt();
                if !near[i * n + k] {
                    terms.push(PairTerm {
                        i,
                        j: k,
                        target,
                        force: ANGLE_FORCE,
                        repulsive_only: false,
                    });
                    near[i * n + k] = true;
                    near[k * n + i] = true;
                }
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if near[i * n + j] {
                continue;
            }
            terms.push(PairTerm {
                i,
                j,
                target: molecule.atom(i).element.covalent_radius()
                    + molecule.atom(j).element.covalent_radius()
                    + 0.8,
                force: REPULSION_FORCE,
                repulsive_only: true,
            });
        }
    }
    terms
}

fn energy(terms: &[PairTerm], positions: &[nalgebra::Point3<f64>]) -> f64 {
    terms
        .iter()
        .map(|term| {
            let d = (positions[term.j] - positions[term.i]).norm();
            if term.repulsive_only && d >= term.target {
                0.0
            } else {
                let delta = d - term.target;
                term.force * delta * delta
            }
        })
        .sum()
}

fn gradient(terms: &[PairTerm], positions: &[nalgebra::Point3<f64>]) -> Vec<Vector3<f64>> {
    let mut gradient = vec![Vector3::zeros(); positions.len()];
    for term in terms {
        let delta = positions[term.j] - positions[term.i];
        let d = delta.norm();
        if d < 1e-9 || (term.repulsive_only && d >= term.target) {
            continue;
        }
        let magnitude = 2.0 * term.force * (d - term.target);
        let direction = delta / d;
        gradient[term.i] -= direction * magnitude;
        gradient[term.j] += direction * magnitude;
    }
    gradient
}
