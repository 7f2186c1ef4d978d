//! chat_core - Core types for the branching chat client
//!
//! This crate provides the foundational types used across all chat-related crates:
//! - `message` - Role, Turn and ChatMessage node types
//! - `tree` - ConversationTree with per-node branch selection
//! - `transcript` - plain-text rendering of the current conversation
//! - `error` - domain errors for tree operations

pub mod error;
pub mod message;
pub mod transcript;
pub mod tree;

// Re-export commonly used types
pub use error::TreeError;
pub use message::{ChatMessage, Role, Turn};
pub use tree::ConversationTree;
