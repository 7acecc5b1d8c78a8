//! Molecular data model: elements, atoms, bonds, conformers, and the
//! molecular graph used throughout the docking pipeline.

pub mod atom;
pub mod element;
pub mod molecule;

pub use atom::Atom;
pub use element::Element;
pub use molecule::{Bond, BondOrder, Conformer, Molecule};
