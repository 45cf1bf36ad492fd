//! Catalog (table of contents) parsing.
//!
//! The catalog is a markdown pipe table, one manual per row:
//!
//! ```text
//! | Manual          | File              | Keywords               |
//! |-----------------|-------------------|------------------------|
//! | Security Rules  | security_rules.md | auth, jwt, injection   |
//! ```
//!
//! Lines that do not start with `|` are prose and are ignored. Every table
//! row either becomes a [`DocumentDescriptor`] or a [`RowDiagnostic`]
//! explaining why it was dropped.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A manual listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub file_ref: String,
    /// Lower-cased, never empty.
    pub keywords: Vec<String>,
}

/// Why a table row did not produce a manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("expected 3 columns, found {found}")]
    ColumnCount { found: usize },
    #[error("empty {column} cell")]
    EmptyCell { column: &'static str },
    #[error("header or divider row '{name}'")]
    HeaderArtifact { name: String },
    #[error("manual '{name}' has no keywords")]
    NoKeywords { name: String },
    #[error("duplicate manual name '{name}'")]
    DuplicateName { name: String },
}

impl RowError {
    /// Header and separator rows are part of every well-formed table.
    pub fn is_artifact(&self) -> bool {
        matches!(self, RowError::HeaderArtifact { .. })
    }
}

/// A dropped row and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    pub line: usize,
    pub error: RowError,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Parsed catalog snapshot. Entries keep source row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub entries: Vec<DocumentDescriptor>,
    pub skipped: Vec<RowDiagnostic>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_file(&self, file_ref: &str) -> Option<&DocumentDescriptor> {
        self.entries.iter().find(|e| e.file_ref == file_ref)
    }

    /// Skipped rows that indicate a broken catalog, excluding header
    /// and separator rows.
    pub fn malformed(&self) -> impl Iterator<Item = &RowDiagnostic> {
        self.skipped.iter().filter(|d| !d.error.is_artifact())
    }
}

/// Parse one line. Returns `None` when the line is not a table row.
pub fn parse_row(line: &str) -> Option<Result<DocumentDescriptor, RowError>> {
    let rest = line.strip_prefix('|')?;
    Some(parse_cells(rest))
}

fn parse_cells(rest: &str) -> Result<DocumentDescriptor, RowError> {
    // Each cell is closed by a pipe; text after the last pipe is not a cell.
    let mut cells: Vec<&str> = rest.split('|').collect();
    cells.pop();
    if cells.len() < 3 {
        return Err(RowError::ColumnCount { found: cells.len() });
    }

    let name = cells[0].trim();
    if name.is_empty() {
        return Err(RowError::EmptyCell { column: "name" });
    }

    let lowered = name.to_lowercase();
    if lowered.contains("manual") || lowered.contains("---") {
        return Err(RowError::HeaderArtifact {
            name: name.to_string(),
        });
    }

    let file_ref = cells[1].trim();
    if file_ref.is_empty() {
        return Err(RowError::EmptyCell { column: "file" });
    }

    let keywords: Vec<String> = cells[2]
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase)
        .collect();
    if keywords.is_empty() {
        return Err(RowError::NoKeywords {
            name: name.to_string(),
        });
    }

    Ok(DocumentDescriptor {
        name: name.to_string(),
        file_ref: file_ref.to_string(),
        keywords,
    })
}

/// Parse the full catalog text. Never fails; bad rows land in `skipped`.
pub fn parse_catalog(text: &str) -> Catalog {
    let mut catalog = Catalog::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, line) in text.lines().enumerate() {
        let Some(parsed) = parse_row(line) else {
            continue;
        };
        let outcome = parsed.and_then(|entry| {
            if seen.insert(entry.name.clone()) {
                Ok(entry)
            } else {
                Err(RowError::DuplicateName { name: entry.name })
            }
        });
        match outcome {
            Ok(entry) => catalog.entries.push(entry),
            Err(error) => catalog.skipped.push(RowDiagnostic {
                line: idx + 1,
                error,
            }),
        }
    }

    catalog
}
