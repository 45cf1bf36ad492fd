//! Prompt composition: manuals, memory and the quality gate.

use serde::Serialize;

use crate::constants::DEFAULT_AGENT_ID;
use crate::warning::Warning;

/// Role statement that opens every system prompt, one paragraph per line.
pub const PERSONA: [&str; 3] = [
    "You are a senior software engineer. You write clean, typed, well-structured code.",
    "You follow the project manuals precisely. You never skip error handling.",
    "You always log MODIFIED_FILES at the end of your response.",
];

/// Self-check block appended verbatim to every system prompt.
pub const QUALITY_GATE: &str = r#"
---

SELF-CHECK (mandatory at end of every response):

Review your own response against these quality gates before finalizing:

- [ ] **Manual compliance**: Did I follow all rules from the matched manuals?
- [ ] **Error handling**: Is every async operation wrapped in try/catch?
- [ ] **Type safety**: No `any` types used without justification?
- [ ] **Security**: No SQL injection, XSS, or exposed secrets?
- [ ] **Validation**: Are all inputs validated at API boundaries?
- [ ] **Loading/Error states**: Are all async UI states handled?
- [ ] **MODIFIED_FILES logged**: Did I list all files I changed at the end?

At the end of your response, output:
QUALITY_GATE_RESULTS:
- Manual compliance: PASS/FAIL
- Error handling: PASS/FAIL
- Type safety: PASS/FAIL
- Security: PASS/FAIL
- Validation: PASS/FAIL
- Loading/Error states: PASS/FAIL (or N/A)
- MODIFIED_FILES logged: PASS/FAIL
"#;

const MANUALS_HEADER: &str =
    "# Injected Manuals\n\nThe following project manuals are relevant to this task:\n\n";

const MANUAL_SEPARATOR: &str = "\n\n---\n\n";

/// Rendered in place of the manuals block by the standalone CLI.
pub const NO_MANUALS_SENTINEL: &str = "# No manuals matched for this task.";

/// What an empty manuals block renders as. Each caller picks its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyContext {
    /// Empty string; the prompt simply has no manuals block.
    #[default]
    Blank,
    /// An explicit "no manuals matched" line.
    Sentinel,
}

/// A selected manual whose content was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSection {
    pub name: String,
    pub content: String,
}

/// Output of manual selection for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextResult {
    pub prompt_prefix: String,
    /// Manuals actually injected, highest score first.
    pub matched_names: Vec<String>,
    pub warnings: Vec<Warning>,
}

fn render_manual(section: &ManualSection) -> String {
    format!("## {}\n\n{}", section.name, section.content)
}

pub fn render_context_prefix(sections: &[ManualSection], empty: EmptyContext) -> String {
    if sections.is_empty() {
        return match empty {
            EmptyContext::Blank => String::new(),
            EmptyContext::Sentinel => NO_MANUALS_SENTINEL.to_string(),
        };
    }

    let body: Vec<String> = sections.iter().map(render_manual).collect();
    format!("{MANUALS_HEADER}{}", body.join(MANUAL_SEPARATOR))
}

/// Build the context result from the manuals that were read successfully.
pub fn assemble(
    sections: Vec<ManualSection>,
    warnings: Vec<Warning>,
    empty: EmptyContext,
) -> ContextResult {
    ContextResult {
        prompt_prefix: render_context_prefix(&sections, empty),
        matched_names: sections.into_iter().map(|s| s.name).collect(),
        warnings,
    }
}

/// Persona, then manuals, then memory, then the quality gate.
/// Empty blocks are left out.
pub fn build_system_prompt(context_prefix: &str, memory_section: &str) -> String {
    let mut parts: Vec<String> = PERSONA.iter().map(|line| line.to_string()).collect();

    if !context_prefix.is_empty() {
        parts.push(format!("\n{context_prefix}"));
    }
    if !memory_section.is_empty() {
        parts.push(format!("\n{memory_section}"));
    }

    let mut prompt = parts.join("\n\n");
    prompt.push_str(QUALITY_GATE);
    prompt
}

/// User message for the model. Tasks issued by an agent are tagged with its id.
pub fn user_message(task: &str, agent_id: Option<&str>) -> String {
    match agent_id {
        Some(id) if id != DEFAULT_AGENT_ID => format!("[Agent: {id}]\n{task}"),
        _ => task.to_string(),
    }
}
