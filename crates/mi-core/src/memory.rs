//! Project memory: three free-text documents carried across requests.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the three memory documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryField {
    Plan,
    Notes,
    Checklist,
}

impl MemoryField {
    /// Render order of the memory section.
    pub const ALL: [MemoryField; 3] = [MemoryField::Plan, MemoryField::Notes, MemoryField::Checklist];

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryField::Plan => "plan",
            MemoryField::Notes => "notes",
            MemoryField::Checklist => "checklist",
        }
    }

    /// File backing this field inside the memory directory.
    pub fn file_name(self) -> &'static str {
        match self {
            MemoryField::Plan => "project-plan.md",
            MemoryField::Notes => "context-notes.md",
            MemoryField::Checklist => "task-checklist.md",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            MemoryField::Plan => "Project Plan",
            MemoryField::Notes => "Context Notes",
            MemoryField::Checklist => "Task Checklist",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            MemoryField::Plan => "_No project plan found._",
            MemoryField::Notes => "_No context notes found._",
            MemoryField::Checklist => "_No checklist found._",
        }
    }
}

impl fmt::Display for MemoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(MemoryField::Plan),
            "notes" => Ok(MemoryField::Notes),
            "checklist" => Ok(MemoryField::Checklist),
            other => Err(CoreError::UnknownMemoryField(other.to_string())),
        }
    }
}

/// Full contents of the three memory documents. Missing documents are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    pub plan: String,
    pub notes: String,
    pub checklist: String,
}

impl MemoryState {
    pub fn get(&self, field: MemoryField) -> &str {
        match field {
            MemoryField::Plan => &self.plan,
            MemoryField::Notes => &self.notes,
            MemoryField::Checklist => &self.checklist,
        }
    }

    pub fn set(&mut self, field: MemoryField, content: String) {
        match field {
            MemoryField::Plan => self.plan = content,
            MemoryField::Notes => self.notes = content,
            MemoryField::Checklist => self.checklist = content,
        }
    }
}

/// Render memory for the system prompt, in plan / notes / checklist order.
pub fn render_memory_section(state: &MemoryState) -> String {
    let sections: Vec<String> = MemoryField::ALL
        .iter()
        .map(|&field| {
            let body = match state.get(field) {
                "" => field.placeholder(),
                body => body,
            };
            format!("## {}\n{}", field.heading(), body)
        })
        .collect();

    format!("# Project Memory\n\n{}", sections.join("\n\n---\n\n"))
}

/// `## [YYYY-MM-DD] Update`
pub fn note_header(date: NaiveDate) -> String {
    format!("## [{}] Update", date.format("%Y-%m-%d"))
}

/// Append a dated section to existing notes. The result always starts
/// with `existing`.
pub fn append_note(existing: &str, entry: &str, date: NaiveDate) -> String {
    format!("{existing}\n\n{}\n\n{entry}", note_header(date))
}
