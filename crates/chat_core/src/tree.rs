//! ConversationTree - branch-aware conversation storage
//!
//! A single root node owns the whole tree. The "current conversation" is
//! never stored separately: it is derived by walking from the root and
//! following each node's `selected_child`. Switching a branch anywhere on
//! the path therefore automatically restores whatever was last active
//! below the newly selected branch.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::message::{ChatMessage, Role, Turn};

/// A branching conversation. Serializes as the recursive node encoding of
/// its root (`null` when empty), so every explored branch and every
/// `selected_child` survives a round trip.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ConversationTree {
    root: Option<ChatMessage>,
}

impl ConversationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Append a message to the tree.
    ///
    /// With `after_index` absent the message becomes the new current leaf
    /// (or the root of an empty tree). With `after_index` present it is
    /// appended as an additional child of the node at that path position
    /// and becomes that node's active branch; the previously active
    /// subtree stays attached to its old sibling, reachable again by
    /// reselecting it.
    pub fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        after_index: Option<usize>,
    ) -> Result<(), TreeError> {
        let message = ChatMessage::new(role, content.into());
        match after_index {
            Some(index) => {
                let len = self.path_len();
                let parent = self
                    .path_node_mut(index)
                    .ok_or(TreeError::PositionOutOfRange { index, len })?;
                parent.push_child(message);
                tracing::debug!(position = index, "added branch message");
            }
            None => match self.root {
                None => self.root = Some(message),
                Some(ref mut root) => {
                    let mut node = root;
                    while let Some(i) = node.selected_child() {
                        node = node.child_mut(i);
                    }
                    node.push_child(message);
                }
            },
        }
        Ok(())
    }

    /// The sequence of messages from the root through each selected
    /// child. Non-empty trees always yield at least the root. O(depth).
    pub fn current_path(&self) -> Vec<&ChatMessage> {
        let mut path = Vec::new();
        let mut node = match &self.root {
            Some(root) => root,
            None => return path,
        };
        loop {
            path.push(node);
            match node.selected_child() {
                Some(i) => node = &node.children()[i],
                None => return path,
            }
        }
    }

    /// Length of the current conversation without materializing it.
    pub fn path_len(&self) -> usize {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0,
        };
        let mut len = 1;
        while let Some(i) = node.selected_child() {
            node = &node.children()[i];
            len += 1;
        }
        len
    }

    /// Owned `(role, content)` snapshot of the current conversation,
    /// suitable for handing to a worker task.
    pub fn current_turns(&self) -> Vec<Turn> {
        self.current_path().iter().map(|m| m.to_turn()).collect()
    }

    /// Number of alternative continuations at the given path position.
    pub fn branch_width(&self, index: usize) -> Result<usize, TreeError> {
        let len = self.path_len();
        self.path_node(index)
            .map(|node| node.children().len())
            .ok_or(TreeError::PositionOutOfRange { index, len })
    }

    /// The 0-based index of the active branch at a path position, if the
    /// node there has one. Used for the `(k/width)` transcript indicator.
    pub fn selected_index_at(&self, index: usize) -> Option<usize> {
        self.path_node(index).and_then(ChatMessage::selected_child)
    }

    /// Role of the message at a path position, if any.
    pub fn role_at(&self, index: usize) -> Option<&Role> {
        self.path_node(index).map(ChatMessage::role)
    }

    /// Make `branch_index` the active branch at path position `index`.
    ///
    /// Only that node's selection changes; descendants of the newly
    /// selected branch keep their own selections, so whatever was last
    /// explored below it reappears unchanged. Both bounds are checked
    /// before any mutation.
    pub fn change_branch(&mut self, index: usize, branch_index: usize) -> Result<(), TreeError> {
        let len = self.path_len();
        let node = self
            .path_node_mut(index)
            .ok_or(TreeError::PositionOutOfRange { index, len })?;
        let width = node.children().len();
        if branch_index >= width {
            return Err(TreeError::BranchOutOfRange {
                index: branch_index,
                width,
            });
        }
        node.select_child(branch_index);
        tracing::debug!(position = index, branch = branch_index, "switched branch");
        Ok(())
    }

    /// Serialize the whole tree (all branches, all selections) to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore a tree previously produced by [`Self::to_json`].
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    fn path_node(&self, index: usize) -> Option<&ChatMessage> {
        let mut node = self.root.as_ref()?;
        for _ in 0..index {
            let i = node.selected_child()?;
            node = &node.children()[i];
        }
        Some(node)
    }

    fn path_node_mut(&mut self, index: usize) -> Option<&mut ChatMessage> {
        let mut node = self.root.as_mut()?;
        for _ in 0..index {
            let i = node.selected_child()?;
            node = node.child_mut(i);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ConversationTree {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "S", None).unwrap();
        tree.add_message(Role::User, "A", None).unwrap();
        tree
    }

    #[test]
    fn empty_tree_has_no_path() {
        let tree = ConversationTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.path_len(), 0);
        assert!(tree.current_path().is_empty());
    }

    #[test]
    fn first_message_becomes_root() {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "S", None).unwrap();
        assert_eq!(tree.path_len(), 1);
        assert_eq!(tree.role_at(0), Some(&Role::System));
    }

    #[test]
    fn add_message_with_position_on_empty_tree_fails() {
        let mut tree = ConversationTree::new();
        let err = tree.add_message(Role::User, "A", Some(0)).unwrap_err();
        assert_eq!(err, TreeError::PositionOutOfRange { index: 0, len: 0 });
    }

    #[test]
    fn appending_extends_current_path() {
        let tree = seeded();
        let path = tree.current_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1].content(), "A");
        assert_eq!(path[0].selected_child(), Some(0));
    }

    #[test]
    fn branching_keeps_old_sibling() {
        let mut tree = seeded();
        tree.add_message(Role::User, "B", Some(0)).unwrap();

        // Path now runs through the new sibling.
        let path = tree.current_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1].content(), "B");
        assert_eq!(tree.branch_width(0).unwrap(), 2);

        // The old branch is still attached.
        assert_eq!(path[0].children()[0].content(), "A");
    }

    #[test]
    fn change_branch_restores_old_path() {
        let mut tree = seeded();
        tree.add_message(Role::User, "B", Some(0)).unwrap();
        tree.change_branch(0, 0).unwrap();
        assert_eq!(tree.current_path()[1].content(), "A");
    }

    #[test]
    fn change_branch_rejects_bad_indices_without_mutation() {
        let mut tree = seeded();
        let before = tree.clone();

        let err = tree.change_branch(5, 0).unwrap_err();
        assert_eq!(err, TreeError::PositionOutOfRange { index: 5, len: 2 });

        let err = tree.change_branch(0, 7).unwrap_err();
        assert_eq!(err, TreeError::BranchOutOfRange { index: 7, width: 1 });

        assert_eq!(tree, before);
    }

    #[test]
    fn branch_width_out_of_range() {
        let tree = seeded();
        assert!(tree.branch_width(2).is_err());
    }

    #[test]
    fn current_turns_snapshots_path() {
        let tree = seeded();
        let turns = tree.current_turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "A");
    }
}
