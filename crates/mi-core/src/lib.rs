//! Manual selection and prompt assembly.
//!
//! Parses the manuals catalog, scores each manual against a task and its
//! file-path hints, picks the few most relevant ones and composes them with
//! project memory into a system prompt for a model call.
//!
//! Zero I/O. Reading manuals and memory from disk lives in `mi-store`.

pub mod catalog;
pub mod compose;
pub mod constants;
pub mod error;
pub mod memory;
pub mod response;
pub mod score;
pub mod select;
pub mod warning;

pub use catalog::{Catalog, DocumentDescriptor, RowDiagnostic, RowError, parse_catalog, parse_row};
pub use compose::{
    ContextResult, EmptyContext, ManualSection, QUALITY_GATE, assemble, build_system_prompt,
    render_context_prefix, user_message,
};
pub use constants::{FALLBACK_SCORE, GENERAL_RULES_FILE, MAX_MANUALS};
pub use error::CoreError;
pub use memory::{MemoryField, MemoryState, append_note, render_memory_section};
pub use response::extract_modified_files;
pub use score::{MatchStrategy, ScoredDescriptor, Scorer, score};
pub use select::{SelectionPolicy, rank, select};
pub use warning::Warning;
