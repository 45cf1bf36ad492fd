use std::fmt;

use serde::Serialize;

use crate::catalog::RowDiagnostic;
use crate::memory::MemoryField;

/// A non-fatal problem hit while building context. The request still
/// succeeds; the affected input is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A selected manual could not be read and was dropped.
    ManualUnreadable {
        name: String,
        file_ref: String,
        reason: String,
    },
    /// A memory document could not be read and was treated as empty.
    MemoryUnreadable { field: MemoryField, reason: String },
    /// A malformed catalog row was skipped.
    CatalogRowSkipped(RowDiagnostic),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ManualUnreadable {
                name,
                file_ref,
                reason,
            } => write!(f, "manual '{name}' ({file_ref}) unreadable: {reason}"),
            Warning::MemoryUnreadable { field, reason } => {
                write!(f, "memory field '{field}' unreadable: {reason}")
            }
            Warning::CatalogRowSkipped(diag) => write!(f, "catalog row skipped, {diag}"),
        }
    }
}
