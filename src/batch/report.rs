use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConvertError;

/// What happened to one asset
#[derive(Debug)]
pub enum Outcome {
    /// Converted and written to `output`
    Success { output: PathBuf },

    /// Deliberately left alone
    Skipped { reason: String },

    /// Conversion was attempted and failed; the batch carried on
    Failed { error: ConvertError },
}

/// Per-asset result of a batch run
#[derive(Debug)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub outcome: Outcome,
}

impl ConversionResult {
    pub fn success(source: PathBuf, output: PathBuf) -> Self {
        Self { source, outcome: Outcome::Success { output } }
    }

    pub fn skipped<S: Into<String>>(source: PathBuf, reason: S) -> Self {
        Self { source, outcome: Outcome::Skipped { reason: reason.into() } }
    }

    pub fn failed(source: PathBuf, error: ConvertError) -> Self {
        Self { source, outcome: Outcome::Failed { error } }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// Output path when the conversion succeeded
    pub fn output(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Success { output } => Some(output),
            _ => None,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = file_name(&self.source);
        match &self.outcome {
            Outcome::Success { output } => write!(f, "✓ {} → {}", name, output.display()),
            Outcome::Skipped { reason } => write!(f, "- {} skipped: {}", name, reason),
            Outcome::Failed { error } => write!(f, "✗ {} failed: {}", name, error.user_message()),
        }
    }
}

/// Totals over a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            match result.outcome {
                Outcome::Success { .. } => summary.converted += 1,
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} skipped, {} failed",
            self.converted, self.skipped, self.failed
        )
    }
}
