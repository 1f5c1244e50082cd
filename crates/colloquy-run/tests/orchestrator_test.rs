use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use colloquy_llm::{
    estimate_tokens, ChatTurn, FragmentStream, GenerateRequest, InferenceClient, Role,
    SimulatedInferenceClient,
};
use colloquy_persist::{StateError, StateManager, Store};
use colloquy_run::{RunOrchestrator, RunStatus};
use futures::StreamExt;

/// Test double that records every request it receives.
struct RecordingClient {
    inner: SimulatedInferenceClient,
    calls: AtomicUsize,
    last_turns: Mutex<Vec<ChatTurn>>,
}

impl RecordingClient {
    fn new() -> Self {
        Self {
            inner: SimulatedInferenceClient::new(),
            calls: AtomicUsize::new(0),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_turns(&self) -> Vec<ChatTurn> {
        self.last_turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for RecordingClient {
    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_turns.lock().unwrap() = request.messages.clone();
        self.inner.generate(request).await
    }

    async fn generate_stream(&self, request: GenerateRequest) -> anyhow::Result<FragmentStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_turns.lock().unwrap() = request.messages.clone();
        self.inner.generate_stream(request).await
    }
}

async fn state_manager() -> Arc<StateManager> {
    let store = Store::open_in_memory().await.expect("in-memory store");
    Arc::new(StateManager::new(store))
}

async fn seed_conversation(state: &StateManager) -> (String, String) {
    let assistant = state
        .create_assistant("Bot", "Analyze markets", "gpt-4", None)
        .await
        .unwrap();
    let thread = state.create_thread(&assistant.id, None, None).await.unwrap();
    state
        .add_message(&thread.id, Role::User, "How are markets?", None)
        .await
        .unwrap();
    (thread.id, assistant.id)
}

#[tokio::test]
async fn test_completed_run_appends_assistant_message() {
    let state = state_manager().await;
    let (thread_id, assistant_id) = seed_conversation(&state).await;

    let orchestrator = RunOrchestrator::new(
        Arc::clone(&state),
        Arc::new(SimulatedInferenceClient::new()),
    );

    let run = orchestrator
        .create_run(&thread_id, &assistant_id, None)
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.thread_id, thread_id);
    assert_eq!(run.assistant_id, assistant_id);
    assert!(run.completed_at.is_some());
    assert!(run.last_error.is_none());

    let messages = state.get_messages(&thread_id, 0, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(
        messages[1].token_count,
        i64::from(estimate_tokens(&messages[1].content))
    );
}

#[tokio::test]
async fn test_failed_inference_becomes_failed_run_not_error() {
    let state = state_manager().await;
    let (thread_id, assistant_id) = seed_conversation(&state).await;

    let orchestrator = RunOrchestrator::new(
        Arc::clone(&state),
        Arc::new(SimulatedInferenceClient::failing("backend overloaded")),
    );

    let run = orchestrator
        .create_run(&thread_id, &assistant_id, None)
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.completed_at.is_none());
    assert!(run.last_error.as_deref().unwrap().contains("backend overloaded"));

    // Nothing was appended to the thread
    let messages = state.get_messages(&thread_id, 0, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_missing_thread_fails_before_inference_is_touched() {
    let state = state_manager().await;
    let (_, assistant_id) = seed_conversation(&state).await;

    let client = Arc::new(RecordingClient::new());
    let orchestrator = RunOrchestrator::new(Arc::clone(&state), client.clone());

    let err = orchestrator
        .create_run("missing", &assistant_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, StateError::ThreadNotFound(_)));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_missing_assistant_fails_before_inference_is_touched() {
    let state = state_manager().await;
    let (thread_id, _) = seed_conversation(&state).await;

    let client = Arc::new(RecordingClient::new());
    let orchestrator = RunOrchestrator::new(Arc::clone(&state), client.clone());

    let err = orchestrator
        .create_run(&thread_id, "missing", None)
        .await
        .unwrap_err();

    assert!(matches!(err, StateError::AssistantNotFound(_)));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_instructions_override_prepends_transient_system_turn() {
    let state = state_manager().await;
    let (thread_id, assistant_id) = seed_conversation(&state).await;

    let client = Arc::new(RecordingClient::new());
    let orchestrator = RunOrchestrator::new(Arc::clone(&state), client.clone());

    orchestrator
        .create_run(&thread_id, &assistant_id, Some("Answer in one sentence"))
        .await
        .unwrap();

    let turns = client.last_turns();
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[0].content, "Answer in one sentence");
    assert_eq!(turns[1].content, "How are markets?");

    // The override is transient: it was never written to the thread
    let messages = state.get_messages(&thread_id, 0, 10).await.unwrap();
    assert!(messages.iter().all(|m| m.role != Role::System));
}

#[tokio::test]
async fn test_streamed_run_persists_the_aggregate() {
    let state = state_manager().await;
    let (thread_id, assistant_id) = seed_conversation(&state).await;

    let orchestrator = RunOrchestrator::new(
        Arc::clone(&state),
        Arc::new(SimulatedInferenceClient::new()),
    );

    let mut stream = orchestrator
        .create_run_stream(&thread_id, &assistant_id, None)
        .await
        .unwrap();

    let mut assembled = String::new();
    while let Some(fragment) = stream.next().await {
        assembled.push_str(&fragment.unwrap());
    }
    assert!(!assembled.is_empty());

    let messages = state.get_messages(&thread_id, 0, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, assembled);
}

#[tokio::test]
async fn test_streamed_run_with_failing_backend_persists_nothing() {
    let state = state_manager().await;
    let (thread_id, assistant_id) = seed_conversation(&state).await;

    let orchestrator = RunOrchestrator::new(
        Arc::clone(&state),
        Arc::new(SimulatedInferenceClient::failing("connection dropped")),
    );

    let mut stream = orchestrator
        .create_run_stream(&thread_id, &assistant_id, None)
        .await
        .unwrap();

    let first = stream.next().await.unwrap();
    assert!(first.is_err());
    assert!(stream.next().await.is_none());

    let messages = state.get_messages(&thread_id, 0, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_end_to_end_conversation_cycle() {
    let state = state_manager().await;

    let assistant = state
        .create_assistant("Bot", "Analyze markets", "gpt-4", None)
        .await
        .unwrap();
    let thread = state.create_thread(&assistant.id, None, None).await.unwrap();
    state
        .add_message(&thread.id, Role::User, "How are markets?", None)
        .await
        .unwrap();

    let orchestrator = RunOrchestrator::new(
        Arc::clone(&state),
        Arc::new(SimulatedInferenceClient::new()),
    );

    let run = orchestrator
        .create_run(&thread.id, &assistant.id, None)
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let messages = state.get_messages(&thread.id, 0, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
}
