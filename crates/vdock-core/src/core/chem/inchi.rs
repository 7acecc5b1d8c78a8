//! InChI reader: the second accepted descriptor dialect.
//!
//! Covers standard InChI strings with formula, connection (`/c`), and
//! hydrogen (`/h`) layers. Stereo layers (`/b`, `/t`, `/m`, `/s`) are
//! ignored because all 3D geometry is regenerated by the embedder. Charge,
//! proton, isotope, and multi-component inputs are rejected rather than
//! mis-read. Bond orders, which InChI does not store, are recovered by a
//! valence saturation pass over the reconstructed single-bond skeleton.

use crate::core::models::{Atom, BondOrder, Element, Molecule};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InchiError {
    #[error("Not an InChI string (missing 'InChI=' prefix)")]
    MissingPrefix,
    #[error("Unsupported InChI version '{0}'")]
    UnsupportedVersion(String),
    #[error("Malformed formula layer: {0}")]
    BadFormula(String),
    #[error("Unknown element '{0}' in formula layer")]
    UnknownElement(String),
    #[error("Malformed connections layer: {0}")]
    BadConnections(String),
    #[error("Malformed hydrogen layer: {0}")]
    BadHydrogenLayer(String),
    #[error("Atom number {0} out of range")]
    AtomOutOfRange(usize),
    #[error("Unsupported layer '/{0}'")]
    UnsupportedLayer(String),
    #[error("Multi-component InChI strings are not supported")]
    MultiComponent,
    #[error("Could not assign bond orders satisfying element valences")]
    Unsaturable,
}

/// Parses a standard InChI string into a molecular graph.
pub fn parse(input: &str) -> Result<Molecule, InchiError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("InChI=")
        .ok_or(InchiError::MissingPrefix)?;
    let mut layers = body.split('/');
    let version = layers.next().unwrap_or_default();
    if version != "1S" && version != "1" {
        return Err(InchiError::UnsupportedVersion(version.to_string()));
    }
    let formula = layers
        .next()
        .ok_or_else(|| InchiError::BadFormula("missing formula layer".into()))?;
    if formula.contains('.') {
        return Err(InchiError::MultiComponent);
    }

    let (mut molecule, hydrogen_budget) = atoms_from_formula(formula)?;

    let mut seen_connections = false;
    for layer in layers {
        match layer.chars().next() {
            Some('c') => {
                parse_connections(&layer[1..], &mut molecule)?;
                seen_connections = true;
            }
            Some('h') => parse_hydrogen_layer(&layer[1..], &mut molecule)?,
            // Stereo descriptors do not affect the 2D graph.
            Some('b') | Some('t') | Some('m') | Some('s') => {}
            Some(other) => return Err(InchiError::UnsupportedLayer(other.to_string())),
            None => {}
        }
    }
    if !seen_connections && molecule.atom_count() > 1 {
        return Err(InchiError::BadConnections("missing /c layer".into()));
    }

    let assigned: usize = molecule
        .atoms()
        .iter()
        .map(|a| a.implicit_hydrogens as usize)
        .sum();
    if assigned != hydrogen_budget {
        return Err(InchiError::BadHydrogenLayer(format!(
            "formula declares {hydrogen_budget} hydrogens, /h layer assigns {assigned}"
        )));
    }

    saturate(&mut molecule)?;
    Ok(molecule)
}

/// Builds the heavy-atom list in InChI numbering order (carbon first, then
/// the remaining elements alphabetically) and returns the hydrogen count.
fn atoms_from_formula(formula: &str) -> Result<(Molecule, usize), InchiError> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut chars = formula.chars().peekable();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_uppercase() {
            return Err(InchiError::BadFormula(formula.to_string()));
        }
        let mut symbol = String::from(chars.next().unwrap());
        while matches!(chars.peek(), Some(c) if c.is_ascii_lowercase()) {
            symbol.push(chars.next().unwrap());
        }
        let mut count = 0usize;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            count = count * 10 + chars.next().unwrap().to_digit(10).unwrap() as usize;
        }
        counts.push((symbol, count.max(1)));
    }
    if counts.is_empty() {
        return Err(InchiError::BadFormula(formula.to_string()));
    }

    let mut hydrogens = 0usize;
    let mut heavy: Vec<(String, usize)> = Vec::new();
    for (symbol, count) in counts {
        if symbol == "H" {
            hydrogens += count;
        } else {
            heavy.push((symbol, count));
        }
    }
    // Hill convention in the formula layer: C leads, others alphabetical.
    heavy.sort_by(|a, b| match (a.0.as_str(), b.0.as_str()) {
        ("C", "C") => std::cmp::Ordering::Equal,
        ("C", _) => std::cmp::Ordering::Less,
        (_, "C") => std::cmp::Ordering::Greater,
        (x, y) => x.cmp(y),
    });

    let mut molecule = Molecule::new();
    for (symbol, count) in heavy {
        let element =
            Element::from_symbol(&symbol).ok_or(InchiError::UnknownElement(symbol.clone()))?;
        for _ in 0..count {
            molecule.add_atom(Atom::new(element));
        }
    }
    Ok((molecule, hydrogens))
}

/// Parses the `/c` layer, e.g. `1-2(4)3` or `1-2-4-6-5-3-1`, into single
/// bonds on the skeleton. Numbers are 1-based heavy atom indices; revisiting
/// a number closes a ring.
fn parse_connections(layer: &str, molecule: &mut Molecule) -> Result<(), InchiError> {
    let bytes = layer.as_bytes();
    let mut pos = 0usize;
    let mut current: Option<usize> = None;
    let mut stack: Vec<usize> = Vec::new();

    while pos < bytes.len() {
        match bytes[pos] {
            b'(' => {
                let anchor = current.ok_or_else(|| {
                    InchiError::BadConnections("branch with no anchor atom".into())
                })?;
                stack.push(anchor);
                pos += 1;
            }
            b')' => {
                current = Some(
                    stack
                        .pop()
                        .ok_or_else(|| InchiError::BadConnections("unbalanced ')'".into()))?,
                );
                pos += 1;
            }
            b',' => {
                current = Some(*stack.last().ok_or_else(|| {
                    InchiError::BadConnections("',' outside a branch".into())
                })?);
                pos += 1;
            }
            b'-' => {
                pos += 1;
            }
            b'0'..=b'9' => {
                let mut number = 0usize;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    number = number * 10 + (bytes[pos] - b'0') as usize;
                    pos += 1;
                }
                let index = number
                    .checked_sub(1)
                    .filter(|&i| i < molecule.atom_count())
                    .ok_or(InchiError::AtomOutOfRange(number))?;
                if let Some(anchor) = current {
                    if molecule.bond_between(anchor, index).is_some() {
                        return Err(InchiError::BadConnections(format!(
                            "duplicate bond {}-{}",
                            anchor + 1,
                            number
                        )));
                    }
                    molecule.add_bond(anchor, index, BondOrder::Single);
                }
                current = Some(index);
            }
            other => {
                return Err(InchiError::BadConnections(format!(
                    "unexpected character '{}'",
                    other as char
                )));
            }
        }
    }
    if !stack.is_empty() {
        return Err(InchiError::BadConnections("unbalanced '('".into()));
    }
    Ok(())
}

/// Parses the `/h` layer, e.g. `3H,2H2,1H3` or `1-5H,6H2`. Fixed-hydrogen
/// groups are comma-separated; a group's trailing `H`/`H2`/`H3` applies to
/// every atom listed since the previous group. Mobile-hydrogen groups in
/// parentheses, e.g. `(H,3,4)`, place their shared hydrogens on the first
/// atoms listed; any tautomer of the same molecule canonicalizes to the same
/// graph once saturation settles the bond orders.
fn parse_hydrogen_layer(layer: &str, molecule: &mut Molecule) -> Result<(), InchiError> {
    let mut fixed = String::new();
    let mut rest = layer;
    while let Some(open) = rest.find('(') {
        let close = rest[open..].find(')').map(|c| c + open).ok_or_else(|| {
            InchiError::BadHydrogenLayer("unbalanced '(' in mobile-hydrogen group".into())
        })?;
        fixed.push_str(&rest[..open]);
        apply_mobile_group(&rest[open + 1..close], molecule)?;
        rest = &rest[close + 1..];
    }
    fixed.push_str(rest);

    let mut pending: Vec<usize> = Vec::new();
    for token in fixed.split(',').filter(|t| !t.is_empty()) {
        let (atoms_part, h_count) = match token.find('H') {
            Some(h_at) => {
                let count_str = &token[h_at + 1..];
                let count: u8 = if count_str.is_empty() {
                    1
                } else {
                    count_str
                        .parse()
                        .map_err(|_| InchiError::BadHydrogenLayer(token.to_string()))?
                };
                (&token[..h_at], Some(count))
            }
            None => (token, None),
        };

        for range in atoms_part.split('-').collect::<Vec<_>>().chunks(2) {
            // A lone number or an inclusive "a-b" range.
            let start: usize = range[0]
                .parse()
                .map_err(|_| InchiError::BadHydrogenLayer(token.to_string()))?;
            let end: usize = if range.len() == 2 {
                range[1]
                    .parse()
                    .map_err(|_| InchiError::BadHydrogenLayer(token.to_string()))?
            } else {
                start
            };
            for number in start..=end {
                let index = number
                    .checked_sub(1)
                    .filter(|&i| i < molecule.atom_count())
                    .ok_or(InchiError::AtomOutOfRange(number))?;
                pending.push(index);
            }
        }

        if let Some(count) = h_count {
            for &index in &pending {
                molecule.atom_mut(index).implicit_hydrogens = count;
            }
            pending.clear();
        }
    }
    if !pending.is_empty() {
        return Err(InchiError::BadHydrogenLayer(
            "trailing atom list without an H count".into(),
        ));
    }
    Ok(())
}

/// A mobile-hydrogen group body, e.g. `H,3,4` or `H2,5,6,7`: `Hn` shared
/// hydrogens over the listed atoms. The assignment pins them one each to
/// the first `n` atoms; which tautomer that spells is immaterial for a
/// pipeline that regenerates geometry and protonation downstream.
fn apply_mobile_group(group: &str, molecule: &mut Molecule) -> Result<(), InchiError> {
    let malformed = || InchiError::BadHydrogenLayer(format!("({group})"));
    let mut parts = group.split(',');
    let count_str = parts
        .next()
        .and_then(|head| head.strip_prefix('H'))
        .ok_or_else(|| malformed())?;
    let count: usize = if count_str.is_empty() {
        1
    } else {
        count_str.parse().map_err(|_| malformed())?
    };
    let mut atoms = Vec::new();
    for number_str in parts {
        let number: usize = number_str.parse().map_err(|_| malformed())?;
        let index = number
            .checked_sub(1)
            .filter(|&i| i < molecule.atom_count())
            .ok_or(InchiError::AtomOutOfRange(number))?;
        atoms.push(index);
    }
    if count > atoms.len() {
        return Err(malformed());
    }
    for &index in atoms.iter().take(count) {
        molecule.atom_mut(index).implicit_hydrogens += 1;
    }
    Ok(())
}

/// Upgrades bond orders on the single-bond skeleton until every atom's
/// valence deficit is zero, via backtracking over unsaturated neighbors.
/// This recovers double and triple bonds (a Kekulé assignment for aromatic
/// rings) that the InChI representation leaves implicit.
fn saturate(molecule: &mut Molecule) -> Result<(), InchiError> {
    let deficits: Vec<i32> = (0..molecule.atom_count())
        .map(|i| {
            let atom = molecule.atom(i);
            atom.element.default_valence() as i32
                - molecule.degree(i) as i32
                - atom.implicit_hydrogens as i32
        })
        .collect();
    if deficits.iter().any(|&d| d < 0) {
        return Err(InchiError::Unsaturable);
    }

    let mut upgrades = vec![0u8; molecule.bond_count()];
    let mut remaining = deficits;
    if !assign(molecule, &mut remaining, &mut upgrades, 0) {
        return Err(InchiError::Unsaturable);
    }
    for (bond, &extra) in molecule.bonds_mut().iter_mut().zip(upgrades.iter()) {
        bond.order = match extra {
            0 => BondOrder::Single,
            1 => BondOrder::Double,
            _ => BondOrder::Triple,
        };
    }
    Ok(())
}

fn assign(
    molecule: &Molecule,
    remaining: &mut [i32],
    upgrades: &mut [u8],
    from: usize,
) -> bool {
    let unsatisfied = (from..molecule.atom_count()).find(|&i| remaining[i] > 0);
    let Some(atom) = unsatisfied else {
        return true;
    };
    let neighbors: Vec<usize> = molecule.neighbors(atom).collect();
    for neighbor in neighbors {
        if remaining[neighbor] <= 0 {
            continue;
        }
        let bond_index = molecule
            .bond_index_between(atom, neighbor)
            .expect("adjacency implies bond");
        if upgrades[bond_index] >= 2 {
            continue;
        }
        upgrades[bond_index] += 1;
        remaining[atom] -= 1;
        remaining[neighbor] -= 1;
        if assign(molecule, remaining, upgrades, from) {
            return true;
        }
        upgrades[bond_index] -= 1;
        remaining[atom] += 1;
        remaining[neighbor] += 1;
    }
    false
}
