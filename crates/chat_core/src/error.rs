use thiserror::Error;

/// Errors that can occur while manipulating a `ConversationTree`.
///
/// Every variant is reported before any mutation happens, so a failed
/// operation leaves the tree exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("position {index} is outside the current conversation (length {len})")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("branch {index} does not exist at this position (width {width})")]
    BranchOutOfRange { index: usize, width: usize },
}
