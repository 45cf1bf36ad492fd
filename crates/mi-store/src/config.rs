//! Engine configuration.
//!
//! Everything lives under one root directory:
//!
//! ```text
//! <root>/
//! ├── mi.toml          (optional)
//! ├── manuals/
//! │   ├── toc.md
//! │   └── *.md
//! └── memory/
//!     ├── project-plan.md
//!     ├── context-notes.md
//!     └── task-checklist.md
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use mi_core::{GENERAL_RULES_FILE, MAX_MANUALS, MatchStrategy, SelectionPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Optional config file inside the root.
pub const CONFIG_FILE: &str = "mi.toml";

/// Environment variable overriding the root directory.
pub const ROOT_ENV: &str = "MI_ROOT";

/// Resolve the root directory.
/// Priority: explicit path > `MI_ROOT` > current directory.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }
    env::var(ROOT_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding the catalog and manual files.
    pub manuals_dir: PathBuf,
    /// Directory holding the three memory documents.
    pub memory_dir: PathBuf,
    /// Catalog file name inside `manuals_dir`.
    pub catalog_file: String,
    /// `file_ref` of the manual injected when nothing else matches.
    pub general_rules_file: String,
    pub max_manuals: usize,
    pub match_strategy: MatchStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manuals_dir: PathBuf::from("manuals"),
            memory_dir: PathBuf::from("memory"),
            catalog_file: "toc.md".to_string(),
            general_rules_file: GENERAL_RULES_FILE.to_string(),
            max_manuals: MAX_MANUALS,
            match_strategy: MatchStrategy::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults with directories resolved against `root`.
    pub fn rooted(root: &Path) -> Self {
        Self::default().resolve(root)
    }

    /// Read `<root>/mi.toml` if present, then resolve relative directories
    /// against `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let config = match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| StoreError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(root = %root.display(), ?config, "loaded engine config");
        Ok(config.resolve(root))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn resolve(mut self, root: &Path) -> Self {
        self.manuals_dir = root.join(&self.manuals_dir);
        self.memory_dir = root.join(&self.memory_dir);
        self
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.manuals_dir.join(&self.catalog_file)
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_selected: self.max_manuals,
            fallback_file: self.general_rules_file.clone(),
        }
    }
}
