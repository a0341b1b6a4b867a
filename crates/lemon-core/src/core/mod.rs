//! # Core Module
//!
//! Fundamental building blocks shared by the engine and by analysis callers.
//!
//! - **Structure Representation** ([`models`]) - Atoms, residues, chains and whole structures
//! - **File I/O** ([`io`]) - PDB records, entry lists and sequence containers
//! - **Residue Knowledge** ([`utils`]) - Static residue-name classification tables

pub mod io;
pub mod models;
pub mod utils;
