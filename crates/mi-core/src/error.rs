use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown memory field '{0}' (expected one of: plan, notes, checklist)")]
    UnknownMemoryField(String),
}
