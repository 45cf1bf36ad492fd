/// Maximum number of manuals injected into one prompt.
pub const MAX_MANUALS: usize = 3;

/// File reference of the manual injected when nothing else scores.
pub const GENERAL_RULES_FILE: &str = "general_rules.md";

/// Points per keyword found in the task text.
pub const TASK_HIT_WEIGHT: u32 = 2;

/// Points per file-path hint containing a keyword.
pub const PATH_HIT_WEIGHT: u32 = 1;

/// Nominal score given to the general rules fallback.
pub const FALLBACK_SCORE: u32 = 1;

/// Agent id meaning "a human is asking"; no agent tag is added for it.
pub const DEFAULT_AGENT_ID: &str = "user";
