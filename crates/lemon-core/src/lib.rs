//! # LEMON Core Library
//!
//! A parallel engine for mining very large collections of macromolecular structures,
//! such as a full mirror of the Protein Data Bank, by applying a caller-supplied
//! analysis function to every record.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the concurrency machinery
//! stays independent of the chemistry it drives.
//!
//! - **[`core`]: The Foundation.** Stateless structure models (`Structure`), the PDB
//!   reader/writer, entry lists and the Hadoop-style sequence container codec.
//!
//! - **[`engine`]: The Logic Core.** Record sources, the worker contract, the fixed-size
//!   dispatcher pool and the aggregator that serializes per-record results.
//!
//! - **[`workflows`]: The Public API.** Validates a run configuration, selects the
//!   record source and drives a complete mining run.

pub mod core;
pub mod engine;
pub mod workflows;
