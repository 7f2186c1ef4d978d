//! chat_state - Session state machine for the branching chat client
//!
//! One conversation is either idle or waiting on a completion fetch.
//! While a fetch is in flight every mutation-triggering input must be
//! refused; the machine is the single flag the session layer consults.

pub mod machine;

// Re-export commonly used types
pub use machine::{SessionEvent, SessionState, StateMachine, StateTransition};
