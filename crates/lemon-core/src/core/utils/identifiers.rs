use phf::{Set, phf_set};

static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "SEC", "PYL", "MSE", "HSD", "HSE", "HSP", "HID", "HIE", "HIP", "CYX",
};

static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "I", "T", "N",
    "DA", "DC", "DG", "DT", "DU", "DI",
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD", "SOL", "TIP", "TIP3", "SPC",
};

// Single-atom ions as named in the PDB chemical component dictionary.
static METAL_ION_NAMES: Set<&'static str> = phf_set! {
    "LI", "NA", "K", "RB", "CS", "BE", "MG", "CA", "SR", "BA",
    "AL", "GA", "IN", "TL", "SN", "PB", "BI",
    "SC", "TI", "V", "CR", "MN", "FE", "FE2", "CO", "3CO", "NI", "3NI", "CU", "CU1", "ZN",
    "Y", "ZR", "MO", "RU", "RH", "PD", "AG", "CD",
    "LA", "CE", "PR", "ND", "SM", "EU", "EU3", "GD", "TB", "DY", "HO", "ER", "YB", "LU",
    "HF", "TA", "W", "RE", "OS", "IR", "PT", "PT4", "AU", "AU3", "HG",
    "TH", "U1", "PU",
};

fn normalize(residue_name: &str) -> String {
    residue_name.trim().to_ascii_uppercase()
}

pub fn is_amino_acid(residue_name: &str) -> bool {
    AMINO_ACID_NAMES.contains(normalize(residue_name).as_str())
}

pub fn is_nucleotide(residue_name: &str) -> bool {
    NUCLEOTIDE_NAMES.contains(normalize(residue_name).as_str())
}

pub fn is_water(residue_name: &str) -> bool {
    WATER_NAMES.contains(normalize(residue_name).as_str())
}

pub fn is_metal_ion(residue_name: &str) -> bool {
    METAL_ION_NAMES.contains(normalize(residue_name).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_amino_acid_recognizes_standard_and_modified_residues() {
        assert!(is_amino_acid("ALA"));
        assert!(is_amino_acid("mse"));
        assert!(is_amino_acid(" GLY "));
        assert!(!is_amino_acid("HOH"));
        assert!(!is_amino_acid("ZN"));
    }

    #[test]
    fn is_nucleotide_recognizes_rna_and_dna() {
        assert!(is_nucleotide("A"));
        assert!(is_nucleotide("DT"));
        assert!(!is_nucleotide("ATP"));
    }

    #[test]
    fn is_water_recognizes_common_aliases() {
        assert!(is_water("HOH"));
        assert!(is_water("wat"));
        assert!(!is_water("HEM"));
    }

    #[test]
    fn is_metal_ion_recognizes_single_atom_ions() {
        for name in ["ZN", "MG", "CA", "FE", "FE2", "CU", "NA", "HG"] {
            assert!(is_metal_ion(name), "{name} should be a metal ion");
        }
        assert!(!is_metal_ion("HEM"));
        assert!(!is_metal_ion("CL"));
        assert!(!is_metal_ion("SO4"));
    }
}
