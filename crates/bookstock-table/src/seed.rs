//! Bulk loading of the book table from a delimited text file.
//!
//! Each non-blank line carries the nine column values in declared order,
//! separated by `::`:
//!
//! ```text
//! 0131103628::The C Programming Language::1988::Kernighan::272::4::52.99::120::2021/05/01
//! ```
//!
//! Lines that do not split into nine fields, or that the store rejects, are
//! logged and skipped. The load itself only fails when the file cannot be read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::error::StoreError;
use crate::schema::Column;
use crate::store::BookStore;

/// Field separator used by seed files.
pub const SEED_DELIMITER: &str = "::";

/// Outcome of a seed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Splits one seed line into its nine trimmed fields.
///
/// `line_no` is only used for the error message.
pub fn parse_seed_line(line: &str, line_no: usize) -> Result<[String; 9], StoreError> {
    let fields: Vec<String> = line
        .split(SEED_DELIMITER)
        .map(|f| f.trim().to_string())
        .collect();

    if fields.len() != Column::ALL.len() {
        return Err(StoreError::Seed {
            line: line_no,
            reason: format!(
                "expected {} fields separated by '{}', found {}",
                Column::ALL.len(),
                SEED_DELIMITER,
                fields.len()
            ),
        });
    }
    if let Some(col) = Column::ALL
        .iter()
        .zip(&fields)
        .find_map(|(col, f)| (!col.nullable() && f.is_empty()).then_some(col))
    {
        return Err(StoreError::Seed {
            line: line_no,
            reason: format!("{} is required", col),
        });
    }

    fields.try_into().map_err(|_| StoreError::Seed {
        line: line_no,
        reason: "field count changed while parsing".into(),
    })
}

/// Loads every line of `path` into `store`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_seed_file(store: &BookStore, path: impl AsRef<Path>) -> Result<SeedReport, StoreError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut report = SeedReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = match parse_seed_line(&line, line_no) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "skipping malformed seed line");
                report.skipped += 1;
                continue;
            }
        };

        let values: [&str; 9] = std::array::from_fn(|i| fields[i].as_str());
        match store.insert(&values) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                warn!(line = line_no, isbn = %fields[0], error = %e, "error processing book, ensure correct format");
                report.skipped += 1;
            }
        }
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "seed file loaded"
    );
    Ok(report)
}
