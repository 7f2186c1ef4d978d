//! Session events - triggers for state transitions

use serde::{Deserialize, Serialize};

/// Defines the events that can trigger state transitions in the FSM.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// A user submission was accepted and a completion fetch was spawned.
    FetchIssued,

    /// The in-flight fetch delivered a reply.
    FetchResolved,

    /// The in-flight fetch failed; the error text is shown to the user.
    FetchFailed { error: String },
}

impl SessionEvent {
    /// Short event name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchIssued => "fetch_issued",
            Self::FetchResolved => "fetch_resolved",
            Self::FetchFailed { .. } => "fetch_failed",
        }
    }
}
