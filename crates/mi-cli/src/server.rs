use std::sync::Arc;

use mi_core::{extract_modified_files, render_memory_section};
use mi_store::{ContextEngine, StoreError};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Clone)]
pub struct MiServer {
    engine: Arc<ContextEngine>,
    tool_router: ToolRouter<Self>,
}

impl MiServer {
    pub fn new(engine: ContextEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            tool_router: Self::tool_router(),
        }
    }
}

fn store_error(e: StoreError) -> McpError {
    match e {
        StoreError::UnknownMemoryField(_) => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct ContextRequest {
    /// Natural-language description of the task
    task: String,
    /// Paths of files the task will touch. Keywords matching a path add
    /// to that manual's score.
    #[serde(default)]
    file_paths: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PromptRequest {
    /// Natural-language description of the task
    task: String,
    /// Paths of files the task will touch
    #[serde(default)]
    file_paths: Vec<String>,
    /// Identifier of the requesting agent; "user" or absent means no tag
    agent_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MemorySaveRequest {
    /// One of: plan, notes, checklist
    name: String,
    /// Full replacement content for the document
    content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NotesAppendRequest {
    /// Text of the note. It is stored under a dated heading.
    entry: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ModifiedFilesRequest {
    /// Model response text containing a MODIFIED_FILES: section
    response: String,
}

#[tool_router]
impl MiServer {
    #[tool(
        description = "Select the project manuals relevant to a task and return them as a prompt prefix. Up to three manuals are chosen by keyword match against the task and file paths; the general rules manual is used when nothing matches. Unreadable manuals are skipped and listed under warnings."
    )]
    async fn mi_context(
        &self,
        Parameters(req): Parameters<ContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .engine
            .select_and_assemble(&req.task, &req.file_paths)
            .await
            .map_err(store_error)?;

        Ok(json_result(&serde_json::json!({
            "context_prefix": result.prompt_prefix,
            "matched_manuals": result.matched_names,
            "warnings": result.warnings,
        })))
    }

    #[tool(
        description = "Build the complete system prompt for a task: persona, matched manuals, project memory and the self-check quality gate. Also returns the user message, tagged with the agent id when one is given."
    )]
    async fn mi_prompt(
        &self,
        Parameters(req): Parameters<PromptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let prepared = self
            .engine
            .prepare_prompt(&req.task, &req.file_paths, req.agent_id.as_deref())
            .await
            .map_err(store_error)?;

        Ok(json_result(&serde_json::json!({
            "system_prompt": prepared.system_prompt,
            "user_message": prepared.user_message,
            "matched_manuals": prepared.matched_names,
            "warnings": prepared.warnings,
        })))
    }

    #[tool(
        description = "Load the project plan, context notes and task checklist. Missing documents come back empty. Also returns the rendered memory section as it appears in prompts."
    )]
    async fn mi_memory_load(&self) -> Result<CallToolResult, McpError> {
        let (state, warnings) = self.engine.load_memory_report().await;
        let section = render_memory_section(&state);

        Ok(json_result(&serde_json::json!({
            "plan": state.plan,
            "notes": state.notes,
            "checklist": state.checklist,
            "memory_section": section,
            "warnings": warnings,
        })))
    }

    #[tool(
        description = "Overwrite one memory document. name must be plan, notes or checklist; anything else is rejected without writing."
    )]
    async fn mi_memory_save(
        &self,
        Parameters(req): Parameters<MemorySaveRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.engine
            .save_memory_field(&req.name, &req.content)
            .await
            .map_err(store_error)?;
        tracing::debug!(field = %req.name, "memory saved via MCP");

        Ok(json_result(&serde_json::json!({
            "saved": req.name,
            "bytes": req.content.len(),
        })))
    }

    #[tool(
        description = "Append an entry to the context notes under a heading with today's date. Use this to record decisions worth keeping across sessions."
    )]
    async fn mi_notes_append(
        &self,
        Parameters(req): Parameters<NotesAppendRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.engine
            .append_notes(&req.entry)
            .await
            .map_err(store_error)?;

        Ok(json_result(&serde_json::json!({ "appended": true })))
    }

    #[tool(
        description = "List catalog entries with their keywords, full manual content, and whether the manual file is readable. Unreadable manuals have empty content."
    )]
    async fn mi_manuals(&self) -> Result<CallToolResult, McpError> {
        let manuals = self.engine.list_manuals().await.map_err(store_error)?;
        Ok(json_result(&serde_json::json!({ "manuals": manuals })))
    }

    #[tool(
        description = "Extract the file list from the MODIFIED_FILES: section of a model response."
    )]
    async fn mi_modified_files(
        &self,
        Parameters(req): Parameters<ModifiedFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let files = extract_modified_files(&req.response);
        Ok(json_result(&serde_json::json!({ "files": files })))
    }
}

#[tool_handler]
impl ServerHandler for MiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "You have access to this project's manuals and persistent project memory.\n\n\
                 WORKFLOW:\n\
                 1. Before starting a coding task, call mi_prompt (or mi_context for manuals only) \
                    with the task description and the file paths you expect to touch. \
                    Follow the returned manuals precisely.\n\
                 2. Call mi_memory_load to see the current plan, notes and checklist.\n\
                 3. Record durable decisions with mi_notes_append. Rewrite the plan or checklist \
                    with mi_memory_save when they change.\n\
                 4. End every response with a MODIFIED_FILES: section listing the files you changed, \
                    one per line. mi_modified_files parses it back out.\n\n\
                 Warnings in tool results mean a manual or memory document could not be read; \
                 the rest of the result is still usable."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
