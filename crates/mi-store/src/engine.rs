use std::path::Path;

use mi_core::{
    ContextResult, EmptyContext, MemoryField, MemoryState, Scorer, SelectionPolicy, Warning,
    assemble, build_system_prompt, render_memory_section, select, user_message,
};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::manuals::{ManualLibrary, ManualListing};
use crate::memory::MemoryStore;

/// Everything the model-calling layer needs for one request.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub system_prompt: String,
    pub user_message: String,
    pub matched_names: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Entry point for building prompt context. Holds configuration only;
/// every call re-reads the catalog and memory from disk.
pub struct ContextEngine {
    config: EngineConfig,
    scorer: Scorer,
    policy: SelectionPolicy,
    manuals: ManualLibrary,
    memory: MemoryStore,
}

impl ContextEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scorer: Scorer::new(config.match_strategy),
            policy: config.selection_policy(),
            manuals: ManualLibrary::new(&config.manuals_dir, &config.catalog_file),
            memory: MemoryStore::new(&config.memory_dir),
            config,
        }
    }

    /// Load `<root>/mi.toml` (if any) and build an engine over `root`.
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self::new(EngineConfig::load(root)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Select manuals for a task and render them. An empty selection
    /// renders as an empty prefix.
    pub async fn select_and_assemble(&self, task: &str, path_hints: &[String]) -> Result<ContextResult> {
        self.select_and_assemble_with(task, path_hints, EmptyContext::Blank)
            .await
    }

    pub async fn select_and_assemble_with(
        &self,
        task: &str,
        path_hints: &[String],
        empty: EmptyContext,
    ) -> Result<ContextResult> {
        let catalog = self.manuals.load_catalog().await?;
        let selected = select(&catalog.entries, task, path_hints, &self.scorer, &self.policy);
        tracing::debug!(
            selected = ?selected
                .iter()
                .map(|s| (s.descriptor.name.as_str(), s.score))
                .collect::<Vec<_>>(),
            "selected manuals"
        );

        let (sections, read_warnings) = self.manuals.read_selected(&selected).await;
        let warnings: Vec<Warning> = catalog
            .malformed()
            .cloned()
            .map(Warning::CatalogRowSkipped)
            .chain(read_warnings)
            .collect();

        Ok(assemble(sections, warnings, empty))
    }

    pub async fn load_memory_state(&self) -> MemoryState {
        self.memory.load().await.0
    }

    pub async fn load_memory_report(&self) -> (MemoryState, Vec<Warning>) {
        self.memory.load().await
    }

    /// Overwrite a memory field by name. Unknown names are rejected
    /// before touching the disk.
    pub async fn save_memory_field(&self, name: &str, content: &str) -> Result<()> {
        let field: MemoryField = name.parse()?;
        self.memory.save(field, content).await
    }

    pub async fn append_notes(&self, entry: &str) -> Result<()> {
        self.memory.append_notes(entry).await
    }

    pub fn build_system_prompt(&self, context_prefix: &str, memory_section: &str) -> String {
        build_system_prompt(context_prefix, memory_section)
    }

    /// Build the system prompt and user message for a task. Manual
    /// selection and memory loading run concurrently.
    pub async fn prepare_prompt(
        &self,
        task: &str,
        path_hints: &[String],
        agent_id: Option<&str>,
    ) -> Result<PreparedPrompt> {
        let (context, (memory, memory_warnings)) = tokio::join!(
            self.select_and_assemble(task, path_hints),
            self.load_memory_report(),
        );
        let ContextResult {
            prompt_prefix,
            matched_names,
            mut warnings,
        } = context?;
        warnings.extend(memory_warnings);

        let memory_section = render_memory_section(&memory);
        Ok(PreparedPrompt {
            system_prompt: build_system_prompt(&prompt_prefix, &memory_section),
            user_message: user_message(task, agent_id),
            matched_names,
            warnings,
        })
    }

    pub async fn list_manuals(&self) -> Result<Vec<ManualListing>> {
        self.manuals.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use mi_core::{MatchStrategy, QUALITY_GATE};
    use std::fs;
    use tempfile::TempDir;

    const TOC: &str = "\
| Manual | File | Keywords |
|--------|------|----------|
| General Rules | general_rules.md | general |
| Security Rules | security_rules.md | auth, jwt, injection |
| React Rules | react_rules.md | react, component |
| Api Rules | api_rules.md | api, middleware |
";

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let manuals = dir.path().join("manuals");
        fs::create_dir_all(&manuals).unwrap();
        fs::write(manuals.join("toc.md"), TOC).unwrap();
        fs::write(manuals.join("general_rules.md"), "Be consistent.").unwrap();
        fs::write(manuals.join("security_rules.md"), "Validate tokens.").unwrap();
        fs::write(manuals.join("react_rules.md"), "Use hooks.").unwrap();
        // api_rules.md intentionally missing
        dir
    }

    fn engine(dir: &TempDir) -> ContextEngine {
        ContextEngine::open(dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_jwt_task_matches_security() {
        let dir = workspace();
        let result = engine(&dir)
            .select_and_assemble("Add JWT auth", &[])
            .await
            .unwrap();
        assert_eq!(result.matched_names, vec!["Security Rules"]);
        assert!(result.prompt_prefix.contains("## Security Rules\n\nValidate tokens."));
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_to_general_rules() {
        let dir = workspace();
        let result = engine(&dir)
            .select_and_assemble("refactor CSS spacing", &[])
            .await
            .unwrap();
        assert_eq!(result.matched_names, vec!["General Rules"]);
    }

    #[tokio::test]
    async fn test_missing_manual_dropped_with_warning() {
        let dir = workspace();
        let result = engine(&dir)
            .select_and_assemble("jwt middleware", &[])
            .await
            .unwrap();
        // Security Rules (2) and Api Rules (2) selected; api file is missing
        assert_eq!(result.matched_names, vec!["Security Rules"]);
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.prompt_prefix.contains("Api Rules"));
    }

    #[tokio::test]
    async fn test_nothing_readable_renders_per_caller() {
        let dir = workspace();
        let engine = engine(&dir);
        let blank = engine.select_and_assemble("api", &[]).await.unwrap();
        assert_eq!(blank.prompt_prefix, "");
        assert!(blank.matched_names.is_empty());

        let sentinel = engine
            .select_and_assemble_with("api", &[], EmptyContext::Sentinel)
            .await
            .unwrap();
        assert_eq!(sentinel.prompt_prefix, "# No manuals matched for this task.");
    }

    #[tokio::test]
    async fn test_catalog_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = engine(&dir)
            .select_and_assemble("anything", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CatalogUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_rows_reported() {
        let dir = workspace();
        let toc = dir.path().join("manuals/toc.md");
        fs::write(&toc, format!("{TOC}| Broken | broken.md |\n")).unwrap();
        let result = engine(&dir)
            .select_and_assemble("jwt", &[])
            .await
            .unwrap();
        assert!(matches!(
            result.warnings.as_slice(),
            [Warning::CatalogRowSkipped(_)]
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_memory() {
        let dir = workspace();
        let engine = engine(&dir);
        engine.save_memory_field("notes", "X").await.unwrap();
        assert_eq!(engine.load_memory_state().await.notes, "X");
    }

    #[tokio::test]
    async fn test_invalid_field_rejected_before_io() {
        let dir = workspace();
        let engine = engine(&dir);
        let err = engine.save_memory_field("todo", "X").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownMemoryField(_)));
        assert!(!dir.path().join("memory").exists());
    }

    #[tokio::test]
    async fn test_prepare_prompt() {
        let dir = workspace();
        let engine = engine(&dir);
        engine.save_memory_field("plan", "Ship v1.").await.unwrap();

        let prepared = engine
            .prepare_prompt("fix react component", &[], Some("reviewer"))
            .await
            .unwrap();
        assert_eq!(prepared.matched_names, vec!["React Rules"]);
        assert_eq!(prepared.user_message, "[Agent: reviewer]\nfix react component");
        assert!(prepared.system_prompt.contains("Use hooks."));
        assert!(prepared.system_prompt.contains("## Project Plan\nShip v1."));
        assert!(prepared.system_prompt.ends_with(QUALITY_GATE));
    }

    #[tokio::test]
    async fn test_word_boundary_config() {
        let dir = workspace();
        fs::write(dir.path().join("mi.toml"), "match_strategy = \"word-boundary\"\n").unwrap();
        let engine = engine(&dir);
        assert_eq!(engine.config().match_strategy, MatchStrategy::WordBoundary);

        let result = engine.select_and_assemble("make it reactive", &[]).await.unwrap();
        assert_eq!(result.matched_names, vec!["General Rules"]);
    }

    #[tokio::test]
    async fn test_list_manuals() {
        let dir = workspace();
        let listing = engine(&dir).list_manuals().await.unwrap();
        assert_eq!(listing.len(), 4);
        assert!(!listing.iter().find(|m| m.file == "api_rules.md").unwrap().available);
    }
}
