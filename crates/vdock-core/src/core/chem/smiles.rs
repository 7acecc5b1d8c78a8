//! SMILES parser: the first of the two accepted descriptor dialects.
//!
//! Supports the organic subset, bracket atoms with charge and explicit
//! hydrogen counts, branches, ring closures (including `%nn`), explicit bond
//! symbols, aromatic lowercase atoms, and dot-separated fragments. Isotope
//! labels and stereo markers are accepted and discarded, since the pipeline
//! regenerates 3D geometry from scratch.

use crate::core::models::{Atom, BondOrder, Element, Molecule};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedChar { position: usize, character: char },
    #[error("Unknown element '{symbol}' at position {position}")]
    UnknownElement { position: usize, symbol: String },
    #[error("Unclosed bracket atom starting at position {position}")]
    UnclosedBracket { position: usize },
    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("Ring closure {label} is never closed")]
    UnmatchedRingClosure { label: u16 },
    #[error("Conflicting bond orders for ring closure {label}")]
    RingBondMismatch { label: u16 },
    #[error("Bond symbol with no following atom at position {position}")]
    DanglingBond { position: usize },
    #[error("Two atoms bonded twice at position {position}")]
    DuplicateBond { position: usize },
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    molecule: Molecule,
    /// Atom a pending bond/ring label attaches to.
    current: Option<usize>,
    branch_stack: Vec<Option<usize>>,
    pending_order: Option<BondOrder>,
    ring_closures: HashMap<u16, (usize, Option<BondOrder>)>,
    /// Atoms written without brackets; implicit hydrogens are assigned to
    /// these after parsing.
    organic_atoms: Vec<usize>,
}

/// Parses a SMILES string into a molecular graph with implicit hydrogens
/// assigned. Stereochemistry is not retained.
pub fn parse(input: &str) -> Result<Molecule, SmilesError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut parser = Parser {
        input: trimmed.as_bytes(),
        pos: 0,
        molecule: Molecule::new(),
        current: None,
        branch_stack: Vec::new(),
        pending_order: None,
        ring_closures: HashMap::new(),
        organic_atoms: Vec::new(),
    };
    parser.run()?;
    Ok(parser.molecule)
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), SmilesError> {
        while let Some(&byte) = self.input.get(self.pos) {
            match byte {
                b'(' => {
                    self.branch_stack.push(self.current);
                    self.pos += 1;
                }
                b')' => {
                    self.current = self
                        .branch_stack
                        .pop()
                        .ok_or(SmilesError::UnbalancedParentheses)?;
                    self.pos += 1;
                }
                b'.' => {
                    self.current = None;
                    self.pending_order = None;
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b':' => {
                    self.pending_order = Some(match byte {
                        b'-' => BondOrder::Single,
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        _ => BondOrder::Aromatic,
                    });
                    self.pos += 1;
                }
                // Cis/trans markers carry single-bond connectivity.
                b'/' | b'\\' => {
                    self.pending_order = Some(BondOrder::Single);
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    let label = (byte - b'0') as u16;
                    self.pos += 1;
                    self.ring_closure(label)?;
                }
                b'%' => {
                    let start = self.pos;
                    self.pos += 1;
                    let mut label: u16 = 0;
                    let mut digits = 0;
                    while digits < 2 {
                        match self.input.get(self.pos) {
                            Some(&d @ b'0'..=b'9') => {
                                label = label * 10 + (d - b'0') as u16;
                                self.pos += 1;
                                digits += 1;
                            }
                            _ => {
                                return Err(SmilesError::UnexpectedChar {
                                    position: start,
                                    character: '%',
                                });
                            }
                        }
                    }
                    self.ring_closure(label)?;
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }
        if !self.branch_stack.is_empty() {
            return Err(SmilesError::UnbalancedParentheses);
        }
        if let Some(&label) = self.ring_closures.keys().next() {
            return Err(SmilesError::UnmatchedRingClosure { label });
        }
        if self.pending_order.is_some() {
            return Err(SmilesError::DanglingBond {
                position: self.input.len(),
            });
        }
        self.assign_implicit_hydrogens();
        Ok(())
    }

    fn attach(&mut self, atom: usize) -> Result<(), SmilesError> {
        if let Some(previous) = self.current {
            let order = self.pending_order.take().unwrap_or_else(|| {
                if self.molecule.atom(previous).is_aromatic && self.molecule.atom(atom).is_aromatic
                {
                    BondOrder::Aromatic
                } else {
                    BondOrder::Single
                }
            });
            if self.molecule.bond_between(previous, atom).is_some() {
                return Err(SmilesError::DuplicateBond { position: self.pos });
            }
            self.molecule.add_bond(previous, atom, order);
        } else {
            self.pending_order = None;
        }
        self.current = Some(atom);
        Ok(())
    }

    fn ring_closure(&mut self, label: u16) -> Result<(), SmilesError> {
        let current = self.current.ok_or(SmilesError::UnexpectedChar {
            position: self.pos.saturating_sub(1),
            character: char::from_digit(label as u32 % 10, 10).unwrap_or('%'),
        })?;
        let pending = self.pending_order.take();
        match self.ring_closures.remove(&label) {
            Some((partner, opening_order)) => {
                let order = match (opening_order, pending) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::RingBondMismatch { label });
                    }
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => {
                        if self.molecule.atom(partner).is_aromatic
                            && self.molecule.atom(current).is_aromatic
                        {
                            BondOrder::Aromatic
                        } else {
                            BondOrder::Single
                        }
                    }
                };
                if self.molecule.bond_between(partner, current).is_some() {
                    return Err(SmilesError::DuplicateBond { position: self.pos });
                }
                self.molecule.add_bond(partner, current, order);
            }
            None => {
                self.ring_closures.insert(label, (current, pending));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), SmilesError> {
        let position = self.pos;
        let first = self.input[self.pos] as char;
        let (element, aromatic) = match first {
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => (
                Element::from_symbol(&first.to_ascii_uppercase().to_string()),
                true,
            ),
            'A'..='Z' => {
                // Two-letter symbols in the organic subset: Cl and Br.
                let two = self
                    .input
                    .get(self.pos + 1)
                    .map(|&b| format!("{}{}", first, b as char));
                match two.as_deref() {
                    Some("Cl") | Some("Br") => {
                        self.pos += 1;
                        (Element::from_symbol(two.as_deref().unwrap()), false)
                    }
                    _ => (Element::from_symbol(&first.to_string()), false),
                }
            }
            _ => {
                return Err(SmilesError::UnexpectedChar {
                    position,
                    character: first,
                });
            }
        };
        let element = element
            .filter(|e| e.in_organic_subset())
            .ok_or_else(|| SmilesError::UnknownElement {
                position,
                symbol: first.to_string(),
            })?;
        self.pos += 1;

        let mut atom = Atom::new(element);
        atom.is_aromatic = aromatic;
        let index = self.molecule.add_atom(atom);
        self.organic_atoms.push(index);
        self.attach(index)
    }

    fn bracket_atom(&mut self) -> Result<(), SmilesError> {
        let open = self.pos;
        self.pos += 1; // consume '['

        // Optional isotope label, discarded.
        while matches!(self.input.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }

        let symbol_start = self.pos;
        let first = *self
            .input
            .get(self.pos)
            .ok_or(SmilesError::UnclosedBracket { position: open })? as char;
        let aromatic = matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's');
        let mut symbol = if aromatic {
            first.to_ascii_uppercase().to_string()
        } else {
            first.to_string()
        };
        self.pos += 1;
        if !aromatic {
            if let Some(&next @ b'a'..=b'z') = self.input.get(self.pos) {
                symbol.push(next as char);
                self.pos += 1;
            }
        }
        let element =
            Element::from_symbol(&symbol).ok_or_else(|| SmilesError::UnknownElement {
                position: symbol_start,
                symbol: symbol.clone(),
            })?;

        // Chirality markers, discarded.
        while matches!(self.input.get(self.pos), Some(b'@')) {
            self.pos += 1;
        }

        // Explicit hydrogen count; bracket atoms default to zero.
        let mut hydrogens: u8 = 0;
        if matches!(self.input.get(self.pos), Some(b'H')) {
            self.pos += 1;
            hydrogens = 1;
            if let Some(&d @ b'0'..=b'9') = self.input.get(self.pos) {
                hydrogens = d - b'0';
                self.pos += 1;
            }
        }

        // Formal charge: '+', '-', possibly repeated or followed by digits.
        let mut charge: i8 = 0;
        while let Some(&sign @ (b'+' | b'-')) = self.input.get(self.pos) {
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            self.pos += 1;
            if let Some(&d @ b'1'..=b'9') = self.input.get(self.pos) {
                charge += unit * (d - b'0') as i8;
                self.pos += 1;
            } else {
                charge += unit;
            }
        }

        match self.input.get(self.pos) {
            Some(b']') => self.pos += 1,
            _ => return Err(SmilesError::UnclosedBracket { position: open }),
        }

        let atom = Atom {
            element,
            formal_charge: charge,
            is_aromatic: aromatic,
            implicit_hydrogens: hydrogens,
        };
        let index = self.molecule.add_atom(atom);
        self.attach(index)
    }

    /// Assigns implicit hydrogens to organic-subset atoms from their default
    /// valence: the deficit between the default valence and the explicit
    /// bond order sum, floored at zero. Bracket atoms keep their explicit
    /// count (the SMILES rule).
    fn assign_implicit_hydrogens(&mut self) {
        for &index in &self.organic_atoms {
            let valence = self.molecule.explicit_valence(index);
            let target = self.molecule.atom(index).element.default_valence() as f64;
            let deficit = (target - valence).floor().max(0.0) as u8;
            self.molecule.atom_mut(index).implicit_hydrogens = deficit;
        }
    }
}
