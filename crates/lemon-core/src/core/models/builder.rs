use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use super::structure::Structure;
use nalgebra::Point3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Cannot add atom {serial} before any residue was started")]
    NoCurrentResidue { serial: usize },
}

type ResidueKey = (char, isize, Option<char>);

pub struct StructureBuilder {
    structure: Structure,

    // --- Builder-specific state for efficient construction ---
    chain_index: HashMap<char, usize>,
    residue_index: HashMap<ResidueKey, usize>,
    current_residue: Option<usize>,
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self {
            structure: Structure::new(),
            chain_index: HashMap::new(),
            residue_index: HashMap::new(),
            current_residue: None,
        }
    }

    pub fn id_code(&mut self, code: &str) -> &mut Self {
        let code = code.trim();
        self.structure.id_code = (!code.is_empty()).then(|| code.to_string());
        self
    }

    /// Makes the residue identified by chain, number and insertion code current,
    /// creating it (and its chain) on first sight.
    pub fn start_residue(
        &mut self,
        chain_id: char,
        name: &str,
        number: isize,
        insertion_code: Option<char>,
        hetero: bool,
    ) -> &mut Self {
        let chain_idx = *self.chain_index.entry(chain_id).or_insert_with(|| {
            let index = self.structure.chains.len();
            self.structure.chains.push(Chain::new(chain_id));
            index
        });

        let key = (chain_id, number, insertion_code);
        let residues = &mut self.structure.residues;
        let chains = &mut self.structure.chains;
        let res_idx = *self.residue_index.entry(key).or_insert_with(|| {
            let index = residues.len();
            residues.push(Residue::new(name, number, insertion_code, chain_id, hetero));
            chains[chain_idx].residues.push(index);
            index
        });
        self.current_residue = Some(res_idx);
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        element: &str,
        alt_loc: Option<char>,
        position: Point3<f64>,
        occupancy: f64,
        b_factor: f64,
    ) -> Result<usize, BuildError> {
        let res_idx = self
            .current_residue
            .ok_or(BuildError::NoCurrentResidue { serial })?;
        let atom_idx = self.structure.atoms.len();

        self.structure.atoms.push(Atom {
            serial,
            name: name.to_string(),
            element: element.to_ascii_uppercase(),
            alt_loc,
            position,
            occupancy,
            b_factor,
            residue: res_idx,
        });
        self.structure.residues[res_idx].atoms.push(atom_idx);
        Ok(atom_idx)
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
