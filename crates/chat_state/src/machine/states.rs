//! Session states
//!
//! A session has exactly two states: idle, or waiting on one completion
//! fetch. Title fetches do not pass through the machine; they never gate
//! user input.

use serde::{Deserialize, Serialize};

/// The fetch lifecycle state of a session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// The session is idle, awaiting user input.
    #[default]
    Idle,

    /// A completion fetch is in flight. At most one exists per session;
    /// all mutation-triggering input is refused until it resolves.
    Fetching,
}

impl SessionState {
    /// Whether user input may mutate the conversation right now.
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Get a human-readable description of the current state.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready for input",
            Self::Fetching => "Waiting for a reply",
        }
    }
}
