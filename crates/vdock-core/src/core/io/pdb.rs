//! PDB reading and writing for small-molecule ligands.
//!
//! Only the subset of the format the pipeline needs is supported: HETATM/ATOM
//! coordinate records, CONECT connectivity, and MODEL/ENDMDL blocks for
//! multi-pose engine output. Bond orders are not representable in PDB; every
//! bond read from a file is single until a template reassigns it.

use crate::core::models::{Atom, Bond, BondOrder, Conformer, Element, Molecule};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Distance slack over the covalent radius sum when inferring bonds from
/// geometry for files without CONECT records.
const BOND_INFERENCE_TOLERANCE: f64 = 0.45;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("File contains no atom records")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Invalid integer format (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Line is too short for an ATOM/HETATM record")]
    LineTooShort,
    #[error("Cannot determine the element of atom '{name}'")]
    UnknownElement { name: String },
    #[error("CONECT record references unknown atom serial {serial}")]
    UnknownSerial { serial: usize },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_coordinate(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Resolves the element of an atom record, preferring the element columns
/// (77-78) and falling back to the leading letters of the atom name. PDB
/// files conventionally upper-case both, so the lookup normalizes case.
fn resolve_element(element_field: &str, name_field: &str, line_num: usize) -> Result<Element, PdbError> {
    for candidate in [element_field, name_field] {
        let letters: String = candidate.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        if letters.is_empty() {
            continue;
        }
        let mut normalized = letters.to_ascii_lowercase();
        normalized[..1].make_ascii_uppercase();
        // Two-letter symbols first, then the single-letter prefix: "CA" in a
        // ligand context is a carbon named CA, not calcium, but "CL" is
        // chlorine because plain "C" would never be written with a suffix L.
        if normalized.len() >= 2 {
            if let Some(element) = Element::from_symbol(&normalized[..2]) {
                return Ok(element);
            }
        }
        if let Some(element) = Element::from_symbol(&normalized[..1]) {
            return Ok(element);
        }
    }
    Err(PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::UnknownElement {
            name: name_field.to_string(),
        },
    })
}

/// Reads a single molecule from a PDB stream. MODEL/ENDMDL blocks become
/// conformers of the one molecule; the first block defines the atom list
/// and later blocks must match it. Files without CONECT records get their
/// bonds inferred from interatomic distances.
pub fn read_molecule(reader: &mut impl BufRead) -> Result<Molecule, PdbError> {
    let mut atoms: Vec<Atom> = Vec::new();
    let mut serial_to_index: HashMap<usize, usize> = HashMap::new();
    let mut conformers: Vec<Vec<Point3<f64>>> = Vec::new();
    let mut current: Vec<Point3<f64>> = Vec::new();
    let mut conect_pairs: Vec<(usize, usize)> = Vec::new();
    let mut saw_conect = false;
    let mut first_model_done = false;

    for (line_idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_idx + 1;

        if line.starts_with("ATOM") || line.starts_with("HETATM") {
            if line.len() < 54 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::LineTooShort,
                });
            }
            let x = parse_coordinate(&line, line_num, 30, 38)?;
            let y = parse_coordinate(&line, line_num, 38, 46)?;
            let z = parse_coordinate(&line, line_num, 46, 54)?;
            current.push(Point3::new(x, y, z));

            if !first_model_done {
                let serial_field = slice_and_trim(&line, 6, 11);
                let serial: usize = serial_field.parse().map_err(|_| PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::InvalidInt {
                        value: serial_field.to_string(),
                    },
                })?;
                let name_field = slice_and_trim(&line, 12, 16);
                let element_field = slice_and_trim(&line, 76, 78);
                let element = resolve_element(element_field, name_field, line_num)?;
                serial_to_index.insert(serial, atoms.len());
                atoms.push(Atom::new(element));
            }
        } else if line.starts_with("ENDMDL") {
            if !current.is_empty() {
                conformers.push(std::mem::take(&mut current));
                first_model_done = true;
            }
        } else if line.starts_with("CONECT") {
            saw_conect = true;
            let serials: Vec<usize> = line[6..]
                .split_whitespace()
                .map(|token| {
                    token.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            value: token.to_string(),
                        },
                    })
                })
                .collect::<Result<_, _>>()?;
            if let Some((&origin, partners)) = serials.split_first() {
                for &partner in partners {
                    conect_pairs.push((origin, partner));
                }
            }
        }
    }
    if !current.is_empty() {
        conformers.push(current);
    }
    if atoms.is_empty() {
        return Err(PdbError::Empty);
    }
    for (model_idx, positions) in conformers.iter().enumerate() {
        if positions.len() != atoms.len() {
            return Err(PdbError::Inconsistency(format!(
                "Model {} has {} atoms, expected {}",
                model_idx + 1,
                positions.len(),
                atoms.len()
            )));
        }
    }

    // A partner serial repeated in CONECT encodes the bond order, so the
    // multiplicity per direction is kept and the larger one wins (files
    // listing a bond from only one endpoint stay readable).
    let mut bonds: Vec<Bond> = Vec::new();
    if saw_conect {
        let mut multiplicity: HashMap<(usize, usize), u8> = HashMap::new();
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for (origin, partner) in conect_pairs {
            let a = *serial_to_index
                .get(&origin)
                .ok_or(PdbError::Parse {
                    line: 0,
                    kind: PdbParseErrorKind::UnknownSerial { serial: origin },
                })?;
            let b = *serial_to_index
                .get(&partner)
                .ok_or(PdbError::Parse {
                    line: 0,
                    kind: PdbParseErrorKind::UnknownSerial { serial: partner },
                })?;
            if a == b {
                continue;
            }
            if !multiplicity.contains_key(&(a, b)) && !multiplicity.contains_key(&(b, a)) {
                pairs.push((a.min(b), a.max(b)));
            }
            *multiplicity.entry((a, b)).or_insert(0) += 1;
        }
        for (a, b) in pairs {
            let repeats = multiplicity
                .get(&(a, b))
                .copied()
                .unwrap_or(0)
                .max(multiplicity.get(&(b, a)).copied().unwrap_or(0));
            let order = match repeats {
                0 | 1 => BondOrder::Single,
                2 => BondOrder::Double,
                _ => BondOrder::Triple,
            };
            bonds.push(Bond {
                atom1: a,
                atom2: b,
                order,
            });
        }
    } else {
        bonds = infer_bonds(&atoms, &conformers[0]);
    }

    let mut molecule = Molecule::from_parts(atoms, bonds);
    for positions in conformers {
        molecule.add_conformer(Conformer { positions });
    }
    Ok(molecule)
}

fn infer_bonds(atoms: &[Atom], positions: &[Point3<f64>]) -> Vec<Bond> {
    let mut bonds = Vec::new();
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let cutoff = atoms[i].element.covalent_radius()
                + atoms[j].element.covalent_radius()
                + BOND_INFERENCE_TOLERANCE;
            if (positions[i] - positions[j]).norm() <= cutoff {
                bonds.push(Bond {
                    atom1: i,
                    atom2: j,
                    order: BondOrder::Single,
                });
            }
        }
    }
    bonds
}

fn write_atom_records(
    writer: &mut impl Write,
    molecule: &Molecule,
    conformer: &Conformer,
) -> Result<(), PdbError> {
    let mut element_counts: HashMap<&str, usize> = HashMap::new();
    for (index, atom) in molecule.atoms().iter().enumerate() {
        let symbol = atom.element.symbol();
        let count = element_counts.entry(symbol).or_insert(0);
        *count += 1;
        let name = format!("{}{}", symbol.to_ascii_uppercase(), count);
        let position = conformer.positions[index];
        writeln!(
            writer,
            "HETATM{:>5} {:<4} {:<3} A{:>4}    {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            index + 1,
            name,
            "UNL",
            1,
            position.x,
            position.y,
            position.z,
            1.00,
            0.00,
            symbol.to_ascii_uppercase(),
        )?;
    }
    Ok(())
}

/// CONECT records with double and triple bonds written the PDB way, the
/// partner serial repeated once per bond order. Aromatic bonds are listed
/// once; the format has no spelling for them.
fn write_conect_records(writer: &mut impl Write, molecule: &Molecule) -> Result<(), PdbError> {
    for index in 0..molecule.atom_count() {
        let mut partners: Vec<usize> = Vec::new();
        for neighbor in molecule.neighbors(index) {
            let repeats = match molecule
                .bond_between(index, neighbor)
                .map(|b| b.order)
            {
                Some(BondOrder::Double) => 2,
                Some(BondOrder::Triple) => 3,
                _ => 1,
            };
            partners.extend(std::iter::repeat_n(neighbor, repeats));
        }
        for chunk in partners.chunks(4) {
            write!(writer, "CONECT{:>5}", index + 1)?;
            for &partner in chunk {
                write!(writer, "{:>5}", partner + 1)?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Writes one conformer of a molecule as a HETATM/CONECT ligand block.
/// Atom names are the element symbol plus a per-element counter, residue
/// name is UNL, matching what the downstream conversion tools expect.
pub fn write_ligand(
    writer: &mut impl Write,
    molecule: &Molecule,
    conformer_index: usize,
) -> Result<(), PdbError> {
    let conformer = molecule.conformer(conformer_index).ok_or_else(|| {
        PdbError::Inconsistency(format!("Molecule has no conformer {conformer_index}"))
    })?;
    write_atom_records(writer, molecule, conformer)?;
    write_conect_records(writer, molecule)?;
    writeln!(writer, "END")?;
    Ok(())
}

/// Writes every conformer of a molecule as a MODEL/ENDMDL block, sharing
/// one set of CONECT records at the end of the file.
pub fn write_poses(writer: &mut impl Write, molecule: &Molecule) -> Result<(), PdbError> {
    if molecule.conformer_count() == 0 {
        return Err(PdbError::Inconsistency(
            "Molecule has no conformers to write".to_string(),
        ));
    }
    for (model, conformer) in molecule.conformers().iter().enumerate() {
        writeln!(writer, "MODEL     {:>4}", model + 1)?;
        write_atom_records(writer, molecule, conformer)?;
        writeln!(writer, "ENDMDL")?;
    }
    write_conect_records(writer, molecule)?;
    writeln!(writer, "END")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::{embed, smiles};
    use std::io::BufReader;

    fn embedded_ethanol() -> Molecule {
        let mut mol = smiles::parse("CCO").unwrap();
        mol.add_hydrogens();
        let conformer = embed::generate_conformer(&mol, 7, &embed::EmbedParams::default()).unwrap();
        mol.add_conformer(conformer);
        mol
    }

    #[test]
    fn round_trip_preserves_graph_and_coordinates() {
        let mol = embedded_ethanol();
        let mut buffer = Vec::new();
        write_ligand(&mut buffer, &mol, 0).unwrap();

        let parsed = read_molecule(&mut BufReader::new(buffer.as_slice())).unwrap();
        assert_eq!(parsed.atom_count(), mol.atom_count());
        assert_eq!(parsed.bond_count(), mol.bond_count());
        let original = mol.conformer(0).unwrap();
        let restored = parsed.conformer(0).unwrap();
        for (a, b) in original.positions.iter().zip(&restored.positions) {
            assert!((a - b).norm() < 2e-3);
        }
        for bond in mol.bonds() {
            assert!(parsed.bond_between(bond.atom1, bond.atom2).is_some());
        }
    }

    #[test]
    fn pose_writer_round_trips_through_the_reader() {
        let mut mol = embedded_ethanol();
        let mut shifted = mol.conformer(0).unwrap().clone();
        for position in &mut shifted.positions {
            position.x += 1.0;
        }
        mol.add_conformer(shifted);

        let mut buffer = Vec::new();
        write_poses(&mut buffer, &mol).unwrap();
        let parsed = read_molecule(&mut BufReader::new(buffer.as_slice())).unwrap();
        assert_eq!(parsed.conformer_count(), 2);
        assert_eq!(parsed.bond_count(), mol.bond_count());
    }

    #[test]
    fn conect_multiplicity_round_trips_bond_orders() {
        // Acetone: the C=O must come back as a double bond.
        let mut mol = smiles::parse("CC(=O)C").unwrap();
        mol.add_hydrogens();
        let conformer = embed::generate_conformer(&mol, 7, &embed::EmbedParams::default()).unwrap();
        mol.add_conformer(conformer);

        let mut buffer = Vec::new();
        write_ligand(&mut buffer, &mol, 0).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        let carbonyl_line = text
            .lines()
            .find(|l| l.starts_with("CONECT    3"))
            .unwrap();
        // The doubly bonded carbon serial appears twice on the oxygen's row.
        assert_eq!(carbonyl_line.split_whitespace().filter(|t| *t == "2").count(), 2);

        let parsed = read_molecule(&mut BufReader::new(buffer.as_slice())).unwrap();
        let bond = parsed.bond_between(1, 2).unwrap();
        assert_eq!(bond.order, BondOrder::Double);
        assert!(
            parsed
                .bonds()
                .iter()
                .filter(|b| b.order == BondOrder::Double)
                .count()
                == 1
        );
    }

    #[test]
    fn multi_model_files_become_conformers() {
        let input = "\
MODEL        1
HETATM    1  C1  UNL A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  O1  UNL A   1       1.400   0.000   0.000  1.00  0.00           O
ENDMDL
MODEL        2
HETATM    1  C1  UNL A   1       0.100   0.000   0.000  1.00  0.00           C
HETATM    2  O1  UNL A   1       1.500   0.100   0.000  1.00  0.00           O
ENDMDL
CONECT    1    2
END
";
        let mol = read_molecule(&mut BufReader::new(input.as_bytes())).unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.conformer_count(), 2);
        assert_eq!(mol.bond_count(), 1);
        assert!((mol.conformer(1).unwrap().positions[0].x - 0.1).abs() < 1e-9);
    }

    #[test]
    fn bonds_are_inferred_without_conect() {
        let input = "\
HETATM    1  C1  UNL A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  O1  UNL A   1       1.400   0.000   0.000  1.00  0.00           O
HETATM    3  C2  UNL A   1       8.000   0.000   0.000  1.00  0.00           C
END
";
        let mol = read_molecule(&mut BufReader::new(input.as_bytes())).unwrap();
        assert_eq!(mol.bond_count(), 1);
        assert!(mol.bond_between(0, 1).is_some());
    }

    #[test]
    fn element_falls_back_to_atom_name() {
        let input = "\
HETATM    1 CL1  UNL A   1       0.000   0.000   0.000  1.00  0.00
END
";
        let mol = read_molecule(&mut BufReader::new(input.as_bytes())).unwrap();
        assert_eq!(mol.atom(0).element.symbol(), "Cl");
    }

    #[test]
    fn empty_file_is_an_error() {
        let result = read_molecule(&mut BufReader::new("END\n".as_bytes()));
        assert!(matches!(result, Err(PdbError::Empty)));
    }

    #[test]
    fn malformed_coordinates_report_the_line() {
        let input =
            "HETATM    1  C1  UNL A   1       x.xxx   0.000   0.000  1.00  0.00           C\n";
        match read_molecule(&mut BufReader::new(input.as_bytes())) {
            Err(PdbError::Parse { line: 1, .. }) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
