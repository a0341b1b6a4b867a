//! Static residue-name tables used to classify residues without a chemistry dictionary.

pub mod identifiers;
