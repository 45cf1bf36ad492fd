use std::path::PathBuf;

use futures_util::future::join_all;
use mi_core::{Catalog, DocumentDescriptor, ManualSection, ScoredDescriptor, Warning, parse_catalog};
use serde::Serialize;
use tokio::fs;

use crate::error::{Result, StoreError};

/// Catalog entry plus its content, for browsing.
#[derive(Debug, Clone, Serialize)]
pub struct ManualListing {
    pub name: String,
    pub file: String,
    pub keywords: Vec<String>,
    /// Empty when the file could not be read.
    pub content: String,
    pub available: bool,
}

/// Read access to the manuals directory.
pub struct ManualLibrary {
    dir: PathBuf,
    catalog_path: PathBuf,
}

impl ManualLibrary {
    pub fn new(dir: impl Into<PathBuf>, catalog_file: &str) -> Self {
        let dir = dir.into();
        let catalog_path = dir.join(catalog_file);
        Self { dir, catalog_path }
    }

    /// Parse the catalog. Fails with `CatalogUnavailable` if it can't be read.
    pub async fn load_catalog(&self) -> Result<Catalog> {
        let text = fs::read_to_string(&self.catalog_path)
            .await
            .map_err(|source| StoreError::CatalogUnavailable {
                path: self.catalog_path.clone(),
                source,
            })?;

        let catalog = parse_catalog(&text);
        for diag in catalog.malformed() {
            tracing::warn!(catalog = %self.catalog_path.display(), "skipping catalog row: {diag}");
        }
        if catalog.is_empty() {
            tracing::warn!(catalog = %self.catalog_path.display(), "catalog lists no manuals");
        }
        tracing::debug!(
            entries = catalog.len(),
            skipped = catalog.skipped.len(),
            "parsed catalog"
        );
        Ok(catalog)
    }

    pub async fn read_manual(&self, descriptor: &DocumentDescriptor) -> std::io::Result<String> {
        fs::read_to_string(self.dir.join(&descriptor.file_ref)).await
    }

    /// Read the selected manuals concurrently, in selection order.
    /// Unreadable manuals are dropped and reported as warnings.
    pub async fn read_selected(
        &self,
        selected: &[ScoredDescriptor],
    ) -> (Vec<ManualSection>, Vec<Warning>) {
        let reads = join_all(selected.iter().map(|s| self.read_manual(&s.descriptor))).await;

        let mut sections = Vec::with_capacity(selected.len());
        let mut warnings = Vec::new();
        for (scored, read) in selected.iter().zip(reads) {
            let descriptor = &scored.descriptor;
            match read {
                Ok(content) => sections.push(ManualSection {
                    name: descriptor.name.clone(),
                    content,
                }),
                Err(e) => {
                    let warning = Warning::ManualUnreadable {
                        name: descriptor.name.clone(),
                        file_ref: descriptor.file_ref.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        (sections, warnings)
    }

    /// Every catalog entry with its content.
    pub async fn list(&self) -> Result<Vec<ManualListing>> {
        let catalog = self.load_catalog().await?;
        let reads = join_all(catalog.entries.iter().map(|d| self.read_manual(d))).await;

        Ok(catalog
            .entries
            .into_iter()
            .zip(reads)
            .map(|(d, read)| {
                let available = read.is_ok();
                ManualListing {
                    name: d.name,
                    file: d.file_ref,
                    keywords: d.keywords,
                    content: read.unwrap_or_default(),
                    available,
                }
            })
            .collect())
    }
}
