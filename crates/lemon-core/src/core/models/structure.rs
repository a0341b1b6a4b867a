use super::atom::Atom;
use super::chain::Chain;
use super::residue::{Residue, ResidueKind};
use std::collections::BTreeMap;

/// One parsed structure record: atoms, residues and chains in file order.
///
/// Residues and chains refer to atoms by index into [`Structure::atoms`], which keeps
/// the record cheap to move between the pool worker that parsed it and the analysis
/// function that consumes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub(crate) id_code: Option<String>,
    pub(crate) atoms: Vec<Atom>,
    pub(crate) residues: Vec<Residue>,
    pub(crate) chains: Vec<Chain>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier code declared inside the record (e.g. the PDB `HEADER` id code).
    pub fn id_code(&self) -> Option<&str> {
        self.id_code.as_deref()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    pub fn chain(&self, id: char) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Returns an iterator over the atoms of a residue.
    ///
    /// The iterator is empty when `residue` is out of range.
    pub fn residue_atoms(&self, residue: usize) -> impl Iterator<Item = &Atom> {
        self.residues
            .get(residue)
            .map(|r| r.atoms.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&i| self.atoms.get(i))
    }

    /// Selects the indices of all residues satisfying `predicate`, in file order.
    pub fn select_residues<P>(&self, mut predicate: P) -> Vec<usize>
    where
        P: FnMut(&Residue) -> bool,
    {
        self.residues
            .iter()
            .enumerate()
            .filter(|(_, r)| predicate(r))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn residues_of_kind(&self, kind: ResidueKind) -> Vec<usize> {
        self.select_residues(|r| r.kind == kind)
    }

    /// Counts residue names over a selection of residue indices.
    ///
    /// Indices that do not refer to a residue are ignored.
    pub fn residue_name_counts<I>(&self, selection: I) -> BTreeMap<String, usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut counts = BTreeMap::new();
        for index in selection {
            if let Some(residue) = self.residues.get(index) {
                *counts.entry(residue.name.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::StructureBuilder;
    use super::*;
    use nalgebra::Point3;

    fn sample() -> Structure {
        let mut builder = StructureBuilder::new();
        builder.id_code("1ABC");
        builder.start_residue('A', "ALA", 1, None, false);
        builder
            .add_atom(1, "N", "N", None, Point3::new(0.0, 0.0, 0.0), 1.0, 0.0)
            .unwrap();
        builder
            .add_atom(2, "CA", "C", None, Point3::new(1.5, 0.0, 0.0), 1.0, 0.0)
            .unwrap();
        builder.start_residue('A', "ZN", 101, None, true);
        builder
            .add_atom(3, "ZN", "ZN", None, Point3::new(5.0, 0.0, 0.0), 1.0, 0.0)
            .unwrap();
        builder.start_residue('B', "ZN", 102, None, true);
        builder
            .add_atom(4, "ZN", "ZN", None, Point3::new(9.0, 0.0, 0.0), 1.0, 0.0)
            .unwrap();
        builder.start_residue('B', "HOH", 201, None, true);
        builder
            .add_atom(5, "O", "O", None, Point3::new(3.0, 3.0, 0.0), 1.0, 0.0)
            .unwrap();
        builder.build()
    }

    #[test]
    fn accessors_expose_file_order() {
        let structure = sample();
        assert_eq!(structure.id_code(), Some("1ABC"));
        assert_eq!(structure.atoms().len(), 5);
        assert_eq!(structure.residues().len(), 4);
        assert_eq!(structure.chains().len(), 2);
        assert_eq!(structure.chain('B').unwrap().residues(), &[2, 3]);
        let names: Vec<_> = structure.residue_atoms(0).map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["N", "CA"]);
    }

    #[test]
    fn residue_atoms_is_empty_for_unknown_residue() {
        assert_eq!(sample().residue_atoms(42).count(), 0);
    }

    #[test]
    fn residues_of_kind_and_counts_work_together() {
        let structure = sample();
        let metals = structure.residues_of_kind(ResidueKind::MetalIon);
        assert_eq!(metals, vec![1, 2]);

        let counts = structure.residue_name_counts(metals);
        assert_eq!(counts.get("ZN"), Some(&2));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn residue_name_counts_ignores_invalid_indices() {
        let counts = sample().residue_name_counts([3, 99]);
        assert_eq!(counts.get("HOH"), Some(&1));
        assert_eq!(counts.len(), 1);
    }
}
