//! Plain-text rendering of the current conversation
//!
//! Produces the numbered transcript the surrounding UI displays verbatim.
//! Every message after the root carries a `(k/width)` indicator showing
//! which of its parent's branches is active and how many exist.

use std::fmt::Write;

use crate::tree::ConversationTree;

const SEPARATOR_WIDTH: usize = 50;

/// Render the current conversation as display text.
pub fn render(tree: &ConversationTree) -> String {
    let path = tree.current_path();
    if path.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (i, message) in path.iter().enumerate() {
        let speaker = message.role().speaker_label();
        if i == 0 {
            let _ = writeln!(out, "{i}: <{speaker}>");
        } else {
            let parent = path[i - 1];
            let width = parent.children().len();
            let active = parent.selected_child().map_or(1, |k| k + 1);
            let _ = writeln!(out, "{i}: <({active}/{width}) {speaker}>");
        }
        out.push_str(message.content());
        let _ = writeln!(out, "\n{}", "-".repeat(SEPARATOR_WIDTH));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn empty_tree_renders_empty() {
        assert_eq!(render(&ConversationTree::new()), "");
    }

    #[test]
    fn root_has_no_branch_indicator() {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "hello", None).unwrap();
        let text = render(&tree);
        assert!(text.starts_with("0: <System>\nhello\n"));
    }

    #[test]
    fn branch_indicator_tracks_selection() {
        let mut tree = ConversationTree::new();
        tree.add_message(Role::System, "S", None).unwrap();
        tree.add_message(Role::User, "A", None).unwrap();
        tree.add_message(Role::User, "B", Some(0)).unwrap();

        let text = render(&tree);
        assert!(text.contains("1: <(2/2) You>"));

        tree.change_branch(0, 0).unwrap();
        let text = render(&tree);
        assert!(text.contains("1: <(1/2) You>"));
    }
}
