//! Saved-state structures
//!
//! The wire format is owned by this crate and consumed by the
//! surrounding application:
//! `{ "conversations": [[title, tree], ...], "current_conv_idx": n|null }`
//! where each tree is the recursive node encoding. The round trip is
//! lossless, including branches that are not on any current path.

use chat_core::ConversationTree;
use serde::{Deserialize, Serialize};

/// One saved conversation: its list title and its full tree.
/// Serializes as a two-element array `[title, tree]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConversationEntry(pub String, pub ConversationTree);

impl ConversationEntry {
    pub fn new(title: impl Into<String>, tree: ConversationTree) -> Self {
        Self(title.into(), tree)
    }

    pub fn title(&self) -> &str {
        &self.0
    }

    pub fn tree(&self) -> &ConversationTree {
        &self.1
    }
}

/// Everything the application persists between runs.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub conversations: Vec<ConversationEntry>,
    pub current_conv_idx: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Role;

    #[test]
    fn entry_serializes_as_pair() {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "S", None).unwrap();
        let entry = ConversationEntry::new("First chat", tree);

        let value = serde_json::to_value(&entry).unwrap();
        let pair = value.as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0], "First chat");
        assert_eq!(pair[1]["role"], "system");
    }

    #[test]
    fn empty_state_shape() {
        let value = serde_json::to_value(AppState::default()).unwrap();
        assert_eq!(value["conversations"].as_array().unwrap().len(), 0);
        assert!(value["current_conv_idx"].is_null());
    }

    #[test]
    fn state_round_trips() {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "S", None).unwrap();
        tree.add_message(Role::User, "A", None).unwrap();
        tree.add_message(Role::User, "B", Some(0)).unwrap();

        let state = AppState {
            conversations: vec![ConversationEntry::new("branched", tree)],
            current_conv_idx: Some(0),
        };

        let json = serde_json::to_string(&state).unwrap();
        let restored: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
