//! State transitions - FSM transition logic
//!
//! Implements the state machine that handles event-driven state
//! transitions. Events with no defined transition leave the state
//! unchanged rather than failing: a misdelivered event must never wedge
//! a session.

use chrono::{DateTime, Utc};

use super::events::SessionEvent;
use super::states::SessionState;

/// Represents a state transition result.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state before the transition.
    pub from: SessionState,
    /// The state after the transition.
    pub to: SessionState,
    /// The event that triggered the transition.
    pub event: SessionEvent,
    /// Whether the state actually changed.
    pub changed: bool,
    /// When the event was handled.
    pub at: DateTime<Utc>,
}

/// State machine for the session fetch lifecycle.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state.
    current_state: SessionState,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in Idle state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Idle,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> &SessionState {
        &self.current_state
    }

    /// Whether user input may mutate the conversation right now.
    pub fn accepts_user_input(&self) -> bool {
        self.current_state.accepts_user_input()
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event and transition to a new state.
    pub fn handle_event(&mut self, event: SessionEvent) -> StateTransition {
        let old_state = self.current_state.clone();
        let new_state = Self::compute_next_state(&old_state, &event);
        let changed = old_state != new_state;

        if changed {
            tracing::debug!(from = ?old_state, to = ?new_state, event = event.name(), "session transition");
        } else {
            tracing::warn!(state = ?old_state, event = event.name(), "event ignored in current state");
        }

        self.current_state = new_state.clone();

        let transition = StateTransition {
            from: old_state,
            to: new_state,
            event,
            changed,
            at: Utc::now(),
        };

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Compute the next state given current state and event.
    fn compute_next_state(state: &SessionState, event: &SessionEvent) -> SessionState {
        use SessionEvent::*;
        use SessionState::*;

        match (state, event) {
            (Idle, FetchIssued) => Fetching,
            // The Idle transition happens on both outcomes so the session
            // can never be left stuck waiting.
            (Fetching, FetchResolved) => Idle,
            (Fetching, FetchFailed { .. }) => Idle,

            // Default: no transition.
            _ => state.clone(),
        }
    }

    /// Check if an event would change the state without executing it.
    pub fn can_transition(&self, event: &SessionEvent) -> bool {
        Self::compute_next_state(&self.current_state, event) != self.current_state
    }

    /// Reset to Idle state.
    pub fn reset(&mut self) {
        self.current_state = SessionState::Idle;
    }
}
