#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                    // Chain identifier (e.g., 'A', 'B')
    pub(crate) residues: Vec<usize>, // Ordered indices of residues belonging to this chain
}

impl Chain {
    pub(crate) fn new(id: char) -> Self {
        Self {
            id,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[usize] {
        &self.residues
    }
}
