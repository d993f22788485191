//! Append-only audit log of accepted mutations.
//!
//! One entry per line, plain text, self-describing:
//!
//! ```text
//! MODIFY - value at row: 2 (starting from zero) under column: PRICE: 12.50 was changed to: 9.99.
//! ADD ROW - New row was added with the following values: ISBN: 1, BOOK_NAME: Dune, ...
//! DELETED ROW - Book with ISBN: 1 and Title: Dune by: Herbert was removed from the table.
//! ```
//!
//! The file is opened in append mode for every entry and never truncated.

use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use bookstock_table::Column;
use parking_lot::Mutex;

/// One accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEntry {
    Modify {
        row: usize,
        column: String,
        previous: Option<String>,
        new: String,
    },
    AddRow {
        /// Values in declared column order.
        values: [String; 9],
    },
    DeletedRow {
        isbn: String,
        name: String,
        author: String,
    },
}

impl AuditEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEntry::Modify { .. } => "MODIFY",
            AuditEntry::AddRow { .. } => "ADD ROW",
            AuditEntry::DeletedRow { .. } => "DELETED ROW",
        }
    }
}

impl std::fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditEntry::Modify {
                row,
                column,
                previous,
                new,
            } => write!(
                f,
                "MODIFY - value at row: {} (starting from zero) under column: {}: {} was changed to: {}.",
                row,
                column,
                previous.as_deref().unwrap_or("null"),
                new
            ),
            AuditEntry::AddRow { values } => {
                let fields: Vec<String> = Column::ALL
                    .iter()
                    .zip(values)
                    .map(|(col, value)| format!("{}: {}", col.name(), value))
                    .collect();
                write!(
                    f,
                    "ADD ROW - New row was added with the following values: {}",
                    fields.join(", ")
                )
            }
            AuditEntry::DeletedRow { isbn, name, author } => write!(
                f,
                "DELETED ROW - Book with ISBN: {} and Title: {} by: {} was removed from the table.",
                isbn, name, author
            ),
        }
    }
}

/// Single-writer handle on the audit log file.
pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Records the log location. The file is created on the first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as one line. Appends are serialized so lines land
    /// in commit order.
    pub fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        let _guard = self.write_lock.lock();
        // Embedded newlines would split one entry across lines.
        let line = entry.to_string().replace(['\r', '\n'], " ");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    /// Reads back every line written so far. A missing file has no entries.
    pub fn lines(&self) -> io::Result<Vec<String>> {
        let _guard = self.write_lock.lock();
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        BufReader::new(file).lines().collect()
    }
}
