use nalgebra::Point3;

/// Represents one atom record of a structure.
///
/// Atoms are stored in file order inside a [`Structure`](super::structure::Structure)
/// and refer to their parent residue by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom serial number from the source file.
    pub serial: usize,
    /// The atom name (e.g., "CA", "ZN").
    pub name: String,
    /// The element symbol, upper-cased; empty when the source omits it.
    pub element: String,
    /// The alternate location indicator, if any.
    pub alt_loc: Option<char>,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Crystallographic occupancy.
    pub occupancy: f64,
    /// Temperature factor.
    pub b_factor: f64,
    /// Index of the parent residue in the owning structure.
    pub residue: usize,
}

impl Atom {
    pub fn is_hydrogen(&self) -> bool {
        if !self.element.is_empty() {
            return matches!(self.element.as_str(), "H" | "D");
        }
        matches!(
            self.name.trim().chars().next().map(|c| c.to_ascii_uppercase()),
            Some('H') | Some('D')
        )
    }

    pub fn distance_to(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}
