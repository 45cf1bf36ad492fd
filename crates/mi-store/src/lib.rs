pub mod config;
pub mod engine;
pub mod error;
pub mod manuals;
pub mod memory;

pub use config::{CONFIG_FILE, EngineConfig, ROOT_ENV, resolve_root};
pub use engine::{ContextEngine, PreparedPrompt};
pub use error::{Result, StoreError};
pub use manuals::{ManualLibrary, ManualListing};
pub use memory::MemoryStore;
