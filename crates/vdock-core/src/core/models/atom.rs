use super::element::Element;

/// An atom node in the molecular graph.
///
/// Atoms carry only 2D (graph) information; 3D coordinates live in
/// [`super::molecule::Conformer`]s attached to the parent molecule, so that
/// one molecule can hold several alternative geometries (e.g. docked poses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom {
    pub element: Element,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Whether the atom is part of an aromatic system.
    pub is_aromatic: bool,
    /// Hydrogens implied by valence rules but not present as graph nodes.
    pub implicit_hydrogens: u8,
}

impl Atom {
    /// A neutral, non-aromatic atom with no implicit hydrogens assigned yet.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            is_aromatic: false,
            implicit_hydrogens: 0,
        }
    }

    pub fn is_heavy(&self) -> bool {
        !self.element.is_hydrogen()
    }
}
