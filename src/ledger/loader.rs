//! CSV ledger ingest.
//!
//! Row-level validation: rows whose amount (or date, when a date column
//! exists) fails coercion are dropped, not retained as nulls. Column
//! resolution is forgiving about case; when no column is named `amount` the
//! first column whose values all parse numerically is used instead.

use std::path::Path;

use thiserror::Error;
use time::Date;
use time::macros::format_description;
use tracing::debug;

use super::{LedgerRecord, RecordKind};
use crate::error::DataError;

/// Why a ledger CSV could not be loaded.
///
/// I/O and CSV-shape failures are recoverable (the caller substitutes a
/// synthetic ledger); a [`CsvLoadError::Data`] means the file was readable
/// but unusable and must surface.
#[derive(Debug, Error)]
pub enum CsvLoadError {
    /// The file could not be opened or read as CSV.
    #[error("Failed to read ledger CSV: {0}")]
    Csv(#[from] csv::Error),
    /// The file parsed but holds no usable amount column.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Load and clean a ledger CSV, sorted stably by date ascending.
pub fn load_csv(path: &Path) -> Result<Vec<LedgerRecord>, CsvLoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let date_col = find_column(&headers, "date");
    let kind_col = find_column(&headers, "type");

    // Rows are materialized first so the numeric-fallback scan can look at
    // actual values, not just headers. Unreadable rows are skipped.
    let rows: Vec<csv::StringRecord> = reader.records().filter_map(Result::ok).collect();

    let amount_col = match find_column(&headers, "amount") {
        Some(idx) => idx,
        None => numeric_fallback_column(&rows, date_col, kind_col)
            .ok_or(DataError::NoAmountColumn)?,
    };
    debug!(
        amount_col,
        date_col, kind_col, "Resolved ledger CSV columns"
    );

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(amount) = row.get(amount_col).and_then(parse_amount) else {
            continue;
        };
        let date = match date_col {
            Some(idx) => match row.get(idx).and_then(parse_date) {
                Some(date) => Some(date),
                // A date column exists but this row's value is unusable.
                None => continue,
            },
            None => None,
        };
        let kind = kind_col
            .and_then(|idx| row.get(idx))
            .and_then(RecordKind::parse);
        records.push(LedgerRecord { date, amount, kind });
    }

    // Stable, so rows without dates keep file order.
    records.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(records)
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// First column (other than the date/type columns) whose non-empty values
/// all coerce to numbers.
fn numeric_fallback_column(
    rows: &[csv::StringRecord],
    date_col: Option<usize>,
    kind_col: Option<usize>,
) -> Option<usize> {
    let width = rows.iter().map(csv::StringRecord::len).max()?;
    (0..width).find(|&idx| {
        if Some(idx) == date_col || Some(idx) == kind_col {
            return false;
        }
        let mut any = false;
        for row in rows {
            let Some(field) = row.get(idx) else {
                return false;
            };
            if field.trim().is_empty() {
                continue;
            }
            if parse_amount(field).is_none() {
                return false;
            }
            any = true;
        }
        any
    })
}

/// Coerce an amount field, tolerating currency symbols and thousands
/// separators the way the original ledger exports format them.
fn parse_amount(field: &str) -> Option<f64> {
    let cleaned = field.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(field: &str) -> Option<Date> {
    let field = field.trim();
    let iso = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(field, &iso) {
        return Some(date);
    }
    let slashed = format_description!("[month padding:none]/[day padding:none]/[year]");
    Date::parse(field, &slashed).ok()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use time::macros::date;

    use super::*;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp csv");
        file.write_all(content.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn parses_and_sorts_by_date() {
        let file = write_csv(
            "Date,amount,type\n\
             2023-01-03,98.0,EXPENSE\n\
             2023-01-01,100.0,EXPENSE\n\
             2023-01-02,105.0,INCOME\n",
        );
        let records = load_csv(file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, Some(date!(2023 - 01 - 01)));
        assert_eq!(records[0].amount, 100.0);
        assert_eq!(records[1].kind, Some(RecordKind::Income));
        assert_eq!(records[2].amount, 98.0);
    }

    #[test]
    fn drops_rows_failing_coercion() {
        let file = write_csv(
            "Date,amount\n\
             2023-01-01,100.0\n\
             not-a-date,105.0\n\
             2023-01-03,abc\n\
             2023-01-04,\"$1,250.50\"\n",
        );
        let records = load_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].amount, 1250.50);
    }

    #[test]
    fn falls_back_to_first_numeric_column() {
        let file = write_csv(
            "Date,description,total\n\
             2023-01-01,groceries,42.5\n\
             2023-01-02,rent,900\n",
        );
        let records = load_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 42.5);
    }

    #[test]
    fn no_numeric_column_is_a_data_error() {
        let file = write_csv(
            "Date,description\n\
             2023-01-01,groceries\n",
        );
        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(
            err,
            CsvLoadError::Data(DataError::NoAmountColumn)
        ));
    }

    #[test]
    fn slashed_dates_are_accepted() {
        let file = write_csv(
            "Date,amount\n\
             1/5/2023,10.0\n\
             1/4/2023,20.0\n",
        );
        let records = load_csv(file.path()).unwrap();
        assert_eq!(records[0].date, Some(date!(2023 - 01 - 04)));
        assert_eq!(records[0].amount, 20.0);
    }
}
