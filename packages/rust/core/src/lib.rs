//! Core pipeline orchestration for listing-rewriter.
//!
//! This crate ties the generation backend and the property store together:
//! [`RecordProcessor`] handles one property, [`BatchRunner`] walks all of them.

pub mod batch;
pub mod processor;
pub mod prompt;

#[cfg(test)]
mod testing;

pub use batch::{BatchProgress, BatchReport, BatchRunner, RunStatus, SilentProgress};
pub use processor::{RecordOutcome, RecordProcessor, SkipReason};
