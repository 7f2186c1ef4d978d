//! End-to-end controller flows against fake providers

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_core::{Role, Turn};
use completion_client::{CompletionError, CompletionFetcher, CompletionProvider};
use session_manager::{SessionController, Submission};
use tokio::sync::Notify;

/// Answers every request with a fixed reply and records what it saw.
struct FixedProvider {
    reply: String,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl FixedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(&self, messages: &[Turn]) -> Result<Turn, CompletionError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        Ok(Turn::new(Role::Assistant, self.reply.clone()))
    }
}

/// Blocks every request until released, simulating a slow network.
struct GatedProvider {
    gate: Notify,
}

impl GatedProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self { gate: Notify::new() })
    }

    fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CompletionProvider for GatedProvider {
    async fn complete(&self, _messages: &[Turn]) -> Result<Turn, CompletionError> {
        self.gate.notified().await;
        Ok(Turn::new(Role::Assistant, "slow reply"))
    }
}

/// Answers in call order but holds the second and third request (the
/// first title fetch and the second reply) until released, so outcome
/// arrival order can be forced from the test.
struct StaggeredProvider {
    calls: Mutex<usize>,
    title_gate: Notify,
    reply_gate: Notify,
}

impl StaggeredProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            title_gate: Notify::new(),
            reply_gate: Notify::new(),
        })
    }
}

#[async_trait]
impl CompletionProvider for StaggeredProvider {
    async fn complete(&self, _messages: &[Turn]) -> Result<Turn, CompletionError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        match call {
            2 => self.title_gate.notified().await,
            3 => self.reply_gate.notified().await,
            _ => {}
        }
        Ok(Turn::new(Role::Assistant, format!("answer {call}")))
    }
}

/// Always fails, like a dead network.
struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _messages: &[Turn]) -> Result<Turn, CompletionError> {
        Err(CompletionError::EmptyResponse)
    }
}

fn controller_with(provider: Arc<dyn CompletionProvider>) -> SessionController {
    SessionController::new(Arc::new(CompletionFetcher::new(Some(provider))))
}

fn path_contents(controller: &SessionController) -> Vec<String> {
    controller
        .current_tree()
        .map(|tree| {
            tree.current_path()
                .iter()
                .map(|m| m.content().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn plain_text_runs_a_full_exchange() {
    let provider = FixedProvider::new("the reply");
    let mut controller = controller_with(provider.clone());

    assert_eq!(controller.submit("hello"), Submission::FetchStarted);
    assert!(controller.is_fetching());

    // The user turn was appended synchronously, before the fetch.
    assert_eq!(path_contents(&controller)[1], "hello");

    controller.process_next_outcome().await;
    assert!(!controller.is_fetching());
    assert_eq!(
        path_contents(&controller),
        ["You are a helpful assistant.", "hello", "the reply"]
    );
}

#[tokio::test]
async fn submission_while_fetching_is_rejected() {
    let provider = GatedProvider::new();
    let mut controller = controller_with(provider.clone());

    assert_eq!(controller.submit("first"), Submission::FetchStarted);

    // Second submission while the fetch is still in flight.
    let rejected = controller.submit("second");
    assert!(matches!(rejected, Submission::Rejected(_)));
    assert_eq!(path_contents(&controller).len(), 2);

    // Conversation management is refused too.
    assert!(controller.new_conversation().is_err());
    assert!(controller.select_conversation(0).is_err());

    provider.release();
    controller.process_next_outcome().await;
    assert!(!controller.is_fetching());
    assert_eq!(path_contents(&controller)[2], "slow reply");
}

#[tokio::test]
async fn failed_fetch_reports_and_returns_to_idle() {
    let mut controller = controller_with(Arc::new(FailingProvider));

    controller.submit("hello");
    let notice = controller.process_next_outcome().await;

    assert!(notice.unwrap().contains("no choices"));
    assert!(!controller.is_fetching());
    // The tree holds only what the user produced.
    assert_eq!(path_contents(&controller).len(), 2);
}

#[tokio::test]
async fn nb_regenerates_assistant_reply_as_sibling() {
    let provider = FixedProvider::new("take two");
    let mut controller = controller_with(provider.clone());

    controller.submit("hello");
    controller.process_next_outcome().await; // reply
    controller.process_next_outcome().await; // title

    // Level 2 is the assistant reply; no prompt text needed.
    assert_eq!(controller.submit("/nb 2"), Submission::FetchStarted);
    controller.process_next_outcome().await;

    let tree = controller.current_tree().unwrap();
    assert_eq!(tree.branch_width(1).unwrap(), 2);
    assert_eq!(path_contents(&controller)[2], "take two");

    // The regeneration request saw only the turns before the old reply.
    let last_request = provider.requests().last().unwrap().clone();
    assert_eq!(last_request.len(), 2);
    assert_eq!(last_request[1].content, "hello");
}

#[tokio::test]
async fn nb_with_text_branches_the_user_turn() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider.clone());

    controller.submit("original question");
    controller.process_next_outcome().await; // reply
    controller.process_next_outcome().await; // title

    assert_eq!(
        controller.submit("/nb 1 different question"),
        Submission::FetchStarted
    );
    controller.process_next_outcome().await;

    let tree = controller.current_tree().unwrap();
    assert_eq!(tree.branch_width(0).unwrap(), 2);
    assert_eq!(
        path_contents(&controller)[1..],
        ["different question".to_string(), "reply".to_string()]
    );

    // Switching back restores the first branch and everything below it.
    assert_eq!(controller.submit("/sw 1 1"), Submission::Handled);
    assert_eq!(
        path_contents(&controller)[1..],
        ["original question".to_string(), "reply".to_string()]
    );
}

#[tokio::test]
async fn nb_requires_text_on_user_levels() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider);

    controller.submit("hello");
    controller.process_next_outcome().await;
    controller.process_next_outcome().await;

    let result = controller.submit("/nb 1");
    match result {
        Submission::Rejected(text) => assert!(text.contains("requires a prompt")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn nb_range_is_checked() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider);

    controller.submit("hello");
    controller.process_next_outcome().await;
    controller.process_next_outcome().await;

    for input in ["/nb 0 text", "/nb 3 text", "/nb 99"] {
        assert!(
            matches!(controller.submit(input), Submission::Rejected(_)),
            "{input} should be rejected"
        );
    }
}

#[tokio::test]
async fn sw_errors_leave_tree_unchanged() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider);

    controller.submit("hello");
    controller.process_next_outcome().await;
    controller.process_next_outcome().await;
    let before = path_contents(&controller);

    assert!(matches!(controller.submit("/sw 9 1"), Submission::Rejected(_)));
    assert!(matches!(controller.submit("/sw 1 9"), Submission::Rejected(_)));
    assert_eq!(path_contents(&controller), before);
}

#[tokio::test]
async fn title_is_fetched_after_first_exchange() {
    let provider = FixedProvider::new("Short answer");
    let mut controller = controller_with(provider.clone());

    controller.submit("hello");
    controller.process_next_outcome().await; // reply; spawns title fetch

    assert_eq!(controller.conversations()[0].title(), "Retrieving title...");
    controller.process_next_outcome().await; // title
    assert_eq!(controller.conversations()[0].title(), "Short answer");

    // Only the first exchange requests a title.
    controller.submit("more");
    controller.process_next_outcome().await;
    assert_eq!(controller.conversations()[0].title(), "Short answer");
    assert_eq!(provider.requests().len(), 3); // 2 replies + 1 title
}

#[tokio::test]
async fn failed_title_keeps_placeholder() {
    // Offline fetcher: replies come from the stub, titles are not
    // configured and silently fail.
    let mut controller = SessionController::new(Arc::new(CompletionFetcher::new(None)));

    controller.submit("hello");
    assert!(controller.process_next_outcome().await.is_none()); // reply
    assert!(controller.process_next_outcome().await.is_none()); // title failure, silent

    assert_eq!(controller.conversations()[0].title(), "New conversation");
    assert!(!controller.is_fetching());
}

#[tokio::test]
async fn stale_title_outcome_does_not_end_the_fetch() {
    let provider = StaggeredProvider::new();
    let mut controller = controller_with(provider.clone());

    controller.submit("first");
    controller.process_next_outcome().await; // reply; title fetch now held

    // A second exchange starts while the old title fetch is in flight.
    assert_eq!(controller.submit("second"), Submission::FetchStarted);

    // Deliver the stale title first. Applying it must not return the
    // controller to idle: the reply is still pending.
    provider.title_gate.notify_one();
    assert!(controller.process_next_outcome().await.is_none());
    assert_eq!(controller.conversations()[0].title(), "answer 2");
    assert!(controller.is_fetching());

    // Draining until idle picks up the reply as well.
    provider.reply_gate.notify_one();
    while controller.is_fetching() {
        controller.process_next_outcome().await;
    }
    assert_eq!(path_contents(&controller)[4], "answer 3");
}

#[tokio::test]
async fn submit_on_fresh_controller_creates_a_conversation() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider);

    assert!(controller.conversations().is_empty());
    controller.submit("hello");

    assert_eq!(controller.conversations().len(), 1);
    assert_eq!(controller.current_index(), Some(0));
    assert_eq!(path_contents(&controller)[0], "You are a helpful assistant.");
}

#[tokio::test]
async fn empty_input_is_a_no_op() {
    let provider = FixedProvider::new("reply");
    let mut controller = controller_with(provider);

    assert_eq!(controller.submit("   "), Submission::Handled);
    assert!(controller.conversations().is_empty());
}
