//! # Engine Module
//!
//! The parallel record-processing engine: it turns a record source plus a [`worker::Worker`]
//! into one invocation per record on a fixed pool, isolates per-record failures, and
//! serializes the results into a single sink.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run options and their builder
//! - **Sources** ([`source`]) - Directory mirrors and sequence-container archives
//! - **Worker contract** ([`worker`]) - The caller's analysis and its closure adapter
//! - **Dispatch** ([`dispatcher`]) - Shared FIFO queue feeding the pool
//! - **Aggregation** ([`aggregator`]) - Output ordering, sinks and run tally
//! - **State** ([`state`]) - Work items, results and the run summary
//! - **Progress** ([`progress`]) - Callback-based progress events
//! - **Errors** ([`error`]) - Fatal run errors and per-record failures

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod progress;
pub mod source;
pub mod state;
pub mod worker;
