use crate::core::utils::identifiers;
use std::fmt;

/// Broad classification of a residue derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueKind {
    AminoAcid,
    NucleicAcid,
    Water,
    MetalIon,
    /// Anything else: small molecules, cofactors, non-metal ions.
    Other,
}

impl ResidueKind {
    pub fn classify(residue_name: &str) -> Self {
        if identifiers::is_water(residue_name) {
            ResidueKind::Water
        } else if identifiers::is_amino_acid(residue_name) {
            ResidueKind::AminoAcid
        } else if identifiers::is_nucleotide(residue_name) {
            ResidueKind::NucleicAcid
        } else if identifiers::is_metal_ion(residue_name) {
            ResidueKind::MetalIon
        } else {
            ResidueKind::Other
        }
    }

    pub fn is_polymer(&self) -> bool {
        matches!(self, ResidueKind::AminoAcid | ResidueKind::NucleicAcid)
    }
}

impl fmt::Display for ResidueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResidueKind::AminoAcid => "Amino Acid",
                ResidueKind::NucleicAcid => "Nucleic Acid",
                ResidueKind::Water => "Water",
                ResidueKind::MetalIon => "Metal Ion",
                ResidueKind::Other => "Other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub name: String,                  // Residue name (e.g., "ALA", "ZN")
    pub number: isize,                 // Residue sequence number from source file
    pub insertion_code: Option<char>,  // PDB insertion code, if any
    pub chain_id: char,                // Identifier of the parent chain
    pub hetero: bool,                  // Whether the atoms came from HETATM records
    pub kind: ResidueKind,             // Classification derived from the name
    pub(crate) atoms: Vec<usize>,      // Indices of atoms belonging to this residue
}

impl Residue {
    pub(crate) fn new(
        name: &str,
        number: isize,
        insertion_code: Option<char>,
        chain_id: char,
        hetero: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            number,
            insertion_code,
            chain_id,
            hetero,
            kind: ResidueKind::classify(name),
            atoms: Vec::new(),
        }
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
