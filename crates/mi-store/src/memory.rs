use std::io;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use mi_core::{MemoryField, MemoryState, Warning, append_note};
use tokio::fs;

use crate::error::{Result, StoreError};

/// The three memory documents on disk. Writes are whole-file and
/// last-writer-wins; there is no locking between concurrent writers.
pub struct MemoryStore {
    dir: PathBuf,
}

impl MemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, field: MemoryField) -> PathBuf {
        self.dir.join(field.file_name())
    }

    /// Read all three documents concurrently.
    ///
    /// A missing document is empty. Any other read failure also yields an
    /// empty field, reported as a warning.
    pub async fn load(&self) -> (MemoryState, Vec<Warning>) {
        let (plan, notes, checklist) = tokio::join!(
            self.read_field(MemoryField::Plan),
            self.read_field(MemoryField::Notes),
            self.read_field(MemoryField::Checklist),
        );

        let mut state = MemoryState::default();
        let mut warnings = Vec::new();
        for (field, (content, warning)) in MemoryField::ALL.into_iter().zip([plan, notes, checklist]) {
            state.set(field, content);
            warnings.extend(warning);
        }
        (state, warnings)
    }

    async fn read_field(&self, field: MemoryField) -> (String, Option<Warning>) {
        match fs::read_to_string(self.path_for(field)).await {
            Ok(content) => (content, None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (String::new(), None),
            Err(e) => {
                let warning = Warning::MemoryUnreadable {
                    field,
                    reason: e.to_string(),
                };
                tracing::warn!("{warning}");
                (String::new(), Some(warning))
            }
        }
    }

    /// Overwrite a document with `content`.
    pub async fn save(&self, field: MemoryField, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(field);
        fs::write(&path, content)
            .await
            .map_err(|source| StoreError::Io { path, source })?;
        tracing::debug!(%field, bytes = content.len(), "saved memory field");
        Ok(())
    }

    /// Append a section dated today (UTC) to the notes document.
    pub async fn append_notes(&self, entry: &str) -> Result<()> {
        self.append_notes_on(entry, Utc::now().date_naive()).await
    }

    /// Append a dated section to the notes document. Read-then-write, so a
    /// concurrent writer between the two steps is overwritten.
    pub async fn append_notes_on(&self, entry: &str, date: NaiveDate) -> Result<()> {
        let path = self.path_for(MemoryField::Notes);
        let existing = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        self.save(MemoryField::Notes, &append_note(&existing, entry, date))
            .await
    }
}
