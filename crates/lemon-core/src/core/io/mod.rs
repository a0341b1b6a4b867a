//! Provides input/output functionality for structure records and their containers.
//!
//! This module covers the three on-disk artefacts the engine consumes: individual
//! structure files (read through the [`traits::StructureFormat`] interface, with PDB as
//! the built-in format), plain-text entry lists, and Hadoop-style sequence containers
//! packing many compressed records behind string keys.

pub mod compression;
pub mod entries;
pub mod pdb;
pub mod sequence;
pub mod traits;
