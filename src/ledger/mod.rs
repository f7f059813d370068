//! Ledger records and how they are acquired.
//!
//! A ledger is a sequence of dated transaction amounts. It normally comes
//! from a CSV file; when that file is missing or unreadable the pipeline
//! falls back to a deterministic-shape synthetic ledger so the rest of the
//! stages always have input.

mod loader;
mod synthetic;

use std::path::Path;

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::warn;

use crate::error::DataError;

pub use loader::{CsvLoadError, load_csv};
pub use synthetic::synthetic_ledger;

/// Transaction direction as recorded in the ledger's `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// Money going out.
    Expense,
    /// Money coming in.
    Income,
}

impl RecordKind {
    /// Parse the ledger's `type` column. Unknown labels yield `None` and the
    /// row is kept; only amounts and dates decide whether a row survives.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("expense") {
            Some(Self::Expense)
        } else if label.eq_ignore_ascii_case("income") {
            Some(Self::Income)
        } else {
            None
        }
    }
}

/// One cleaned ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Transaction date. `None` only when the source had no date column at
    /// all; a present-but-unparseable date drops the row instead.
    pub date: Option<Date>,
    /// Transaction amount in ledger currency units. Always finite.
    pub amount: f64,
    /// Transaction direction, when the `type` column held a known label.
    pub kind: Option<RecordKind>,
}

/// Extract the amount column in ledger order.
pub fn amounts(records: &[LedgerRecord]) -> Vec<f64> {
    records.iter().map(|r| r.amount).collect()
}

/// Load a ledger from `path`, or synthesize one when the file cannot be read.
///
/// A missing or unreadable file is recovered here (logged, never surfaced to
/// the caller); a readable file without any numeric column is a real
/// [`DataError`] and propagates.
pub fn load_or_synthesize(
    path: &Path,
    synthetic_len: usize,
    seed: u64,
) -> Result<Vec<LedgerRecord>, DataError> {
    match load_csv(path) {
        Ok(records) => Ok(records),
        Err(loader::CsvLoadError::Data(err)) => Err(err),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Ledger file unavailable, generating synthetic ledger"
            );
            Ok(synthetic_ledger(synthetic_len, seed))
        }
    }
}
