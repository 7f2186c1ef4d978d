//! SessionController - the single mutator of every conversation tree
//!
//! All tree mutation happens inside controller methods, which the owning
//! task calls directly. Completion fetches run on spawned worker tasks
//! that only ever see an owned `Vec<Turn>` snapshot; their results come
//! back through an unbounded channel the owning task drains via
//! `process_next_outcome`/`try_process_outcomes`. That hand-off gives the
//! strict (mutate, fetch, mutate) alternation per tree: the submit-side
//! mutation happens before the fetch is spawned, and the result mutation
//! happens before the machine returns to `Idle` and re-enables input.

use std::sync::Arc;

use chat_core::{transcript, ConversationTree, Role, Turn};
use chat_state::{SessionEvent, StateMachine};
use completion_client::{CompletionError, CompletionFetcher};
use tokio::sync::mpsc;

use crate::commands::{parse_command, Command};
use crate::error::{Result, SessionError};
use crate::storage::StateStorage;
use crate::structs::{AppState, ConversationEntry};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const PLACEHOLDER_TITLE: &str = "New conversation";
const PENDING_TITLE: &str = "Retrieving title...";
const BUSY_NOTICE: &str = "still waiting on the previous reply";

/// A completed fetch, delivered back to the owning task.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A reply to append at the current leaf.
    Reply {
        conversation: usize,
        result: std::result::Result<Turn, CompletionError>,
    },
    /// A regenerated reply to attach as a new sibling branch at
    /// `position` (0-based path index of the parent).
    Branch {
        conversation: usize,
        position: usize,
        result: std::result::Result<Turn, CompletionError>,
    },
    /// A conversation title. Never gates input; failures keep the
    /// placeholder.
    Title {
        conversation: usize,
        result: std::result::Result<String, CompletionError>,
    },
}

/// What became of one line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    /// The tree was mutated and a fetch is now in flight.
    FetchStarted,
    /// Handled synchronously (branch switch, empty input); no fetch.
    Handled,
    /// Refused; the text is shown to the user, nothing was mutated.
    Rejected(String),
}

pub struct SessionController {
    conversations: Vec<ConversationEntry>,
    current_idx: Option<usize>,
    machine: StateMachine,
    fetcher: Arc<CompletionFetcher>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl SessionController {
    pub fn new(fetcher: Arc<CompletionFetcher>) -> Self {
        Self::from_state(fetcher, AppState::default())
    }

    /// Restore a controller from saved state.
    pub fn from_state(fetcher: Arc<CompletionFetcher>, state: AppState) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let current_idx = state
            .current_conv_idx
            .filter(|&idx| idx < state.conversations.len());
        Self {
            conversations: state.conversations,
            current_idx,
            machine: StateMachine::new(),
            fetcher,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Load saved state through the given storage.
    pub async fn load(fetcher: Arc<CompletionFetcher>, storage: &dyn StateStorage) -> Result<Self> {
        let state = storage.load_state().await?;
        Ok(Self::from_state(fetcher, state))
    }

    /// Persist the whole collection through the given storage.
    pub async fn save(&self, storage: &dyn StateStorage) -> Result<()> {
        storage.save_state(&self.snapshot()).await
    }

    /// Owned copy of everything worth persisting.
    pub fn snapshot(&self) -> AppState {
        AppState {
            conversations: self.conversations.clone(),
            current_conv_idx: self.current_idx,
        }
    }

    pub fn is_fetching(&self) -> bool {
        !self.machine.accepts_user_input()
    }

    pub fn conversations(&self) -> &[ConversationEntry] {
        &self.conversations
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_idx
    }

    pub fn current_tree(&self) -> Option<&ConversationTree> {
        self.current_idx.map(|idx| self.conversations[idx].tree())
    }

    /// Render the current conversation for display.
    pub fn transcript(&self) -> String {
        self.current_tree().map(transcript::render).unwrap_or_default()
    }

    /// Start a fresh conversation and make it current. Refused while a
    /// fetch is in flight.
    pub fn new_conversation(&mut self) -> Result<usize> {
        if self.is_fetching() {
            return Err(SessionError::Busy);
        }
        Ok(self.create_conversation())
    }

    /// Switch the current conversation. Refused while a fetch is in
    /// flight, so an arriving reply always lands in the tree it was
    /// issued for.
    pub fn select_conversation(&mut self, idx: usize) -> Result<()> {
        if self.is_fetching() {
            return Err(SessionError::Busy);
        }
        if idx >= self.conversations.len() {
            return Err(SessionError::ConversationOutOfRange(idx));
        }
        self.current_idx = Some(idx);
        Ok(())
    }

    /// Interpret one line of user input.
    pub fn submit(&mut self, input: &str) -> Submission {
        if self.is_fetching() {
            return Submission::Rejected(BUSY_NOTICE.to_string());
        }
        match parse_command(input) {
            Command::Empty => Submission::Handled,
            Command::Usage(hint) => Submission::Rejected(hint.to_string()),
            Command::Say(text) => self.say(text),
            Command::SwitchBranch { level, branch } => self.switch_branch(level, branch),
            Command::NewBranch { level, text } => self.new_branch(level, text),
        }
    }

    /// Wait for the next fetch outcome and apply it on the owning task.
    /// Returns any user-visible notice text. `None` means the outcome was
    /// applied silently (the transcript already shows the effect).
    pub async fn process_next_outcome(&mut self) -> Option<String> {
        match self.outcome_rx.recv().await {
            Some(outcome) => self.apply_outcome(outcome),
            // Unreachable while the controller holds its sender half.
            None => None,
        }
    }

    /// Apply every already-delivered outcome without blocking.
    pub fn try_process_outcomes(&mut self) -> Vec<String> {
        let mut notices = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(notice) = self.apply_outcome(outcome) {
                notices.push(notice);
            }
        }
        notices
    }

    fn create_conversation(&mut self) -> usize {
        let mut tree = ConversationTree::new();
        // The root cannot fail to attach to an empty tree.
        let _ = tree.add_message(Role::System, SYSTEM_PROMPT, None);
        self.conversations
            .push(ConversationEntry::new(PLACEHOLDER_TITLE, tree));
        let idx = self.conversations.len() - 1;
        self.current_idx = Some(idx);
        idx
    }

    fn ensure_current(&mut self) -> usize {
        match self.current_idx {
            Some(idx) if idx < self.conversations.len() => idx,
            _ => self.create_conversation(),
        }
    }

    fn say(&mut self, text: String) -> Submission {
        let idx = self.ensure_current();
        if let Err(err) = self.conversations[idx].1.add_message(Role::User, text, None) {
            return Submission::Rejected(err.to_string());
        }
        self.begin_fetch(idx, None, None);
        Submission::FetchStarted
    }

    fn switch_branch(&mut self, level: usize, branch: usize) -> Submission {
        let Some(idx) = self.current_idx else {
            return Submission::Rejected("no conversation to switch branches in".to_string());
        };
        if level == 0 || branch == 0 {
            return Submission::Rejected(crate::commands::USAGE.to_string());
        }
        match self.conversations[idx].1.change_branch(level - 1, branch - 1) {
            Ok(()) => Submission::Handled,
            Err(err) => Submission::Rejected(err.to_string()),
        }
    }

    fn new_branch(&mut self, level: usize, text: Option<String>) -> Submission {
        let idx = self.ensure_current();
        let path_len = self.conversations[idx].1.path_len();
        if level < 1 || level >= path_len {
            return Submission::Rejected(format!(
                "requested branch level outside range (1 - {})",
                path_len.saturating_sub(1)
            ));
        }

        if self.conversations[idx].1.role_at(level) == Some(&Role::Assistant) {
            // Regenerate: fetch as if turns at and after `level` did not
            // exist; the reply lands as a new sibling of the old one.
            self.begin_fetch(idx, Some(level), Some(level - 1));
            return Submission::FetchStarted;
        }

        let Some(text) = text else {
            return Submission::Rejected(format!(
                "new-branch for level {level} also requires a prompt (e.g. /nb {level} Hello, world!)"
            ));
        };
        if let Err(err) = self.conversations[idx]
            .1
            .add_message(Role::User, text, Some(level - 1))
        {
            return Submission::Rejected(err.to_string());
        }
        self.begin_fetch(idx, None, None);
        Submission::FetchStarted
    }

    /// Snapshot the current path and hand it to a worker. The mutation
    /// that produced the path has already happened on this task.
    fn begin_fetch(
        &mut self,
        conversation: usize,
        truncate_before: Option<usize>,
        branch_position: Option<usize>,
    ) {
        self.machine.handle_event(SessionEvent::FetchIssued);
        let turns = self.conversations[conversation].1.current_turns();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_next(&turns, truncate_before).await;
            let outcome = match branch_position {
                Some(position) => FetchOutcome::Branch {
                    conversation,
                    position,
                    result,
                },
                None => FetchOutcome::Reply {
                    conversation,
                    result,
                },
            };
            // The receiver only disappears when the controller does.
            let _ = tx.send(outcome);
        });
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> Option<String> {
        match outcome {
            FetchOutcome::Reply {
                conversation,
                result,
            } => match result {
                Ok(turn) => {
                    let notice = self.append_reply(conversation, turn, None);
                    self.machine.handle_event(SessionEvent::FetchResolved);
                    self.maybe_request_title(conversation);
                    notice
                }
                Err(err) => self.fail_fetch(err),
            },
            FetchOutcome::Branch {
                conversation,
                position,
                result,
            } => match result {
                Ok(turn) => {
                    let notice = self.append_reply(conversation, turn, Some(position));
                    self.machine.handle_event(SessionEvent::FetchResolved);
                    notice
                }
                Err(err) => self.fail_fetch(err),
            },
            FetchOutcome::Title {
                conversation,
                result,
            } => {
                match result {
                    Ok(title) => {
                        if let Some(entry) = self.conversations.get_mut(conversation) {
                            entry.0 = title;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "title fetch failed, keeping placeholder");
                        if let Some(entry) = self.conversations.get_mut(conversation) {
                            if entry.0 == PENDING_TITLE {
                                entry.0 = PLACEHOLDER_TITLE.to_string();
                            }
                        }
                    }
                }
                None
            }
        }
    }

    fn append_reply(
        &mut self,
        conversation: usize,
        turn: Turn,
        position: Option<usize>,
    ) -> Option<String> {
        let Some(entry) = self.conversations.get_mut(conversation) else {
            return Some(format!("reply arrived for unknown conversation {conversation}"));
        };
        match entry.1.add_message(turn.role, turn.content, position) {
            Ok(()) => None,
            Err(err) => Some(err.to_string()),
        }
    }

    fn fail_fetch(&mut self, err: CompletionError) -> Option<String> {
        let text = err.to_string();
        self.machine.handle_event(SessionEvent::FetchFailed {
            error: text.clone(),
        });
        Some(text)
    }

    /// After the first full exchange, trade the placeholder title for a
    /// model-provided one. The title fetch runs outside the state
    /// machine and never blocks input.
    fn maybe_request_title(&mut self, conversation: usize) {
        let Some(entry) = self.conversations.get_mut(conversation) else {
            return;
        };
        if entry.0 != PLACEHOLDER_TITLE {
            return;
        }
        entry.0 = PENDING_TITLE.to_string();

        let turns = entry.1.current_turns();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_title(&turns).await;
            let _ = tx.send(FetchOutcome::Title {
                conversation,
                result,
            });
        });
    }
}
