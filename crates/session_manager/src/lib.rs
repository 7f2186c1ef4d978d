//! session_manager - conversation collection and fetch orchestration
//!
//! Owns the saved-state structures (`AppState`), their file storage, the
//! command parser for the UI text surface, and the `SessionController`
//! that is the single mutator of every conversation tree. Completion
//! fetches run on worker tasks and come back through a channel the
//! controller drains on its own task, so tree mutation never races a
//! fetch.

pub mod commands;
pub mod controller;
pub mod error;
pub mod paths;
pub mod storage;
pub mod structs;

// Re-export commonly used types
pub use commands::{parse_command, Command};
pub use controller::{FetchOutcome, SessionController, Submission};
pub use error::{Result, SessionError};
pub use storage::{FileStateStorage, StateStorage};
pub use structs::{AppState, ConversationEntry};
