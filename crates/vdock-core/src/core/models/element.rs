use phf::phf_map;

/// Maps element symbols to atomic numbers for every element the docking
/// pipeline can represent. Elements outside this table are rejected during
/// descriptor parsing.
static SYMBOL_TO_NUMBER: phf::Map<&'static str, u8> = phf_map! {
    "H" => 1,
    "B" => 5,
    "C" => 6,
    "N" => 7,
    "O" => 8,
    "F" => 9,
    "Si" => 14,
    "P" => 15,
    "S" => 16,
    "Cl" => 17,
    "Br" => 35,
    "I" => 53,
};

/// A chemical element, identified by its atomic number.
///
/// Only a fixed whitelist of elements is representable (the organic subset
/// plus a few common heteroatoms); this mirrors what the scoring engine's
/// atom typing supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const HYDROGEN: Element = Element(1);
    pub const CARBON: Element = Element(6);
    pub const NITROGEN: Element = Element(7);
    pub const OXYGEN: Element = Element(8);

    /// Looks up an element by its case-sensitive symbol (e.g. "Cl").
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        SYMBOL_TO_NUMBER.get(symbol).map(|&n| Element(n))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn is_hydrogen(&self) -> bool {
        self.0 == 1
    }

    pub fn symbol(&self) -> &'static str {
        match self.0 {
            1 => "H",
            5 => "B",
            6 => "C",
            7 => "N",
            8 => "O",
            9 => "F",
            14 => "Si",
            15 => "P",
            16 => "S",
            17 => "Cl",
            35 => "Br",
            53 => "I",
            _ => unreachable!("element outside supported set"),
        }
    }

    /// Single-bond covalent radius in Angstroms, used for bond-length
    /// targets during embedding and for distance-based bond inference.
    pub fn covalent_radius(&self) -> f64 {
        match self.0 {
            1 => 0.31,
            5 => 0.84,
            6 => 0.76,
            7 => 0.71,
            8 => 0.66,
            9 => 0.57,
            14 => 1.11,
            15 => 1.07,
            16 => 1.05,
            17 => 1.02,
            35 => 1.20,
            53 => 1.39,
            _ => unreachable!("element outside supported set"),
        }
    }

    /// Standard atomic mass in Daltons.
    pub fn atomic_mass(&self) -> f64 {
        match self.0 {
            1 => 1.008,
            5 => 10.811,
            6 => 12.011,
            7 => 14.007,
            8 => 15.999,
            9 => 18.998,
            14 => 28.086,
            15 => 30.974,
            16 => 32.065,
            17 => 35.453,
            35 => 79.904,
            53 => 126.904,
            _ => unreachable!("element outside supported set"),
        }
    }

    /// Accepted total valences, lowest first. The lowest entry is the
    /// default used for implicit hydrogen assignment.
    pub fn valences(&self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            5 => &[3],
            6 => &[4],
            7 => &[3, 5],
            8 => &[2],
            9 => &[1],
            14 => &[4],
            15 => &[3, 5],
            16 => &[2, 4, 6],
            17 => &[1],
            35 => &[1],
            53 => &[1],
            _ => unreachable!("element outside supported set"),
        }
    }

    pub fn default_valence(&self) -> u8 {
        self.valences()[0]
    }

    /// Whether this element belongs to the SMILES organic subset, i.e. may
    /// be written without brackets.
    pub fn in_organic_subset(&self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for symbol in ["H", "C", "N", "O", "Cl", "Br"] {
            let element = Element::from_symbol(symbol).unwrap();
            assert_eq!(element.symbol(), symbol);
        }
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        assert!(Element::from_symbol("Xx").is_none());
        assert!(Element::from_symbol("c").is_none());
    }

    #[test]
    fn default_valences() {
        assert_eq!(Element::CARBON.default_valence(), 4);
        assert_eq!(Element::NITROGEN.default_valence(), 3);
        assert_eq!(Element::OXYGEN.default_valence(), 2);
        assert_eq!(Element::from_symbol("S").unwrap().valences(), &[2, 4, 6]);
    }

    #[test]
    fn covalent_radii_are_ordered_sensibly() {
        assert!(Element::HYDROGEN.covalent_radius() < Element::CARBON.covalent_radius());
        assert!(Element::CARBON.covalent_radius() > Element::OXYGEN.covalent_radius());
    }
}
