//! Message types - Role, Turn and the tree node

use serde::{Deserialize, Serialize};

/// The speaker of a message.
///
/// Serialized as its lowercase wire label. Labels outside the three
/// well-known ones round-trip verbatim through `Other`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    /// The wire label for this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(label) => label,
        }
    }

    /// Display name used in transcripts. Unrecognized labels are shown
    /// with the first letter capitalized.
    pub fn speaker_label(&self) -> String {
        match self {
            Role::System => "System".to_string(),
            Role::User => "You".to_string(),
            Role::Assistant => "Assistant".to_string(),
            Role::Other(label) => {
                let mut chars = label.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(label),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// A plain `(role, content)` pair.
///
/// This is the snapshot unit handed to completion workers and the shape
/// providers see on the wire; it carries no tree state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A node in the conversation tree.
///
/// Role and content are immutable once created. Children are owned by
/// their parent, appended in creation order and never reordered or
/// removed; `selected_child` is the node's private memory of which child
/// is currently active below it. All mutation goes through
/// [`crate::ConversationTree`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    role: Role,
    content: String,
    #[serde(default)]
    children: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_child: Option<usize>,
}

impl ChatMessage {
    pub(crate) fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            children: Vec::new(),
            selected_child: None,
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn children(&self) -> &[ChatMessage] {
        &self.children
    }

    /// The currently selected child index, validated against the current
    /// child count. A stale index (possible in subtrees that were off the
    /// current path when siblings were recorded) reads as no selection.
    pub fn selected_child(&self) -> Option<usize> {
        self.selected_child.filter(|&i| i < self.children.len())
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> &mut ChatMessage {
        &mut self.children[index]
    }

    /// Append a child and make it the active branch.
    pub(crate) fn push_child(&mut self, child: ChatMessage) {
        self.children.push(child);
        self.selected_child = Some(self.children.len() - 1);
    }

    pub(crate) fn select_child(&mut self, index: usize) {
        self.selected_child = Some(index);
    }

    /// Borrow this node's turn data as an owned snapshot.
    pub fn to_turn(&self) -> Turn {
        Turn::new(self.role.clone(), self.content.clone())
    }
}
