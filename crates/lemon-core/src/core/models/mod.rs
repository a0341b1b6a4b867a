//! # Core Models Module
//!
//! Data structures describing one parsed structure record.
//!
//! - [`atom`] - Individual atoms with coordinates and crystallographic columns
//! - [`residue`] - Residues grouped from consecutive atom records and their classification
//! - [`chain`] - Chains as ordered residue lists
//! - [`structure`] - The complete record plus a builder used by format readers
//!
//! Records are built once by a reader and then handed by value to analysis workers,
//! so the models favour flat vectors and plain indices over shared ownership.

pub mod atom;
pub mod builder;
pub mod chain;
pub mod residue;
pub mod structure;
