//! # Batch Driver
//!
//! Walks the input directory, fans assets out over a bounded worker pool and
//! collects one [`ConversionResult`] per file.

pub mod driver;
pub mod report;

pub use driver::{BatchDriver, HIDDEN_REASON, UNSUPPORTED_REASON};
pub use report::{BatchSummary, ConversionResult, Outcome};
