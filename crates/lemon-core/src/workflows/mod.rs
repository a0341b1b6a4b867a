//! # Workflows Module
//!
//! Top-level entry points for library users. A workflow validates the run options,
//! loads the entry list, selects the record source and drives the engine to completion.
//!
//! - **Mining Workflow** ([`mine`]) - Applies a worker to every record of a directory
//!   mirror or a set of sequence containers.

pub mod mine;
