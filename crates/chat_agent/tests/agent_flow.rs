use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use chat_agent::agent::{Agent, AgentEvent, AgentRequest};
use chat_agent::commands::SlashCommand;
use chat_provider::{
    ChatMessage, CompletionError, CompletionProvider, ModelTurn, Role, ToolCallRequest,
};
use serde_json::{json, Value};
use session_store::SessionStore;
use tempfile::TempDir;
use tool_bridge::{BridgeError, CallToolResult, ToolBridge, ToolDescriptor, ToolServer};

const TEST_PROMPT: &str = "you are a test assistant";

struct ScriptedProvider {
    turns: Mutex<VecDeque<Result<ModelTurn, CompletionError>>>,
    snapshots: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl CompletionProvider for ScriptedProvider {
    fn model_id(&self) -> String {
        "test/model".to_string()
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[Value],
    ) -> Result<ModelTurn, CompletionError> {
        self.snapshots
            .lock()
            .expect("snapshot lock should not be poisoned")
            .push(messages.to_vec());
        self.turns
            .lock()
            .expect("turn lock should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::new("provider script exhausted")))
    }
}

struct FakeToolServer {
    invocations: Arc<Mutex<Vec<(String, Value)>>>,
    fail_calls: bool,
}

impl ToolServer for FakeToolServer {
    fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, BridgeError> {
        Ok(vec![serde_json::from_value(json!({
            "name": "view",
            "description": "Reads a file",
            "inputSchema": {"type": "object"}
        }))
        .expect("descriptor should deserialize")])
    }

    fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<CallToolResult, BridgeError> {
        if self.fail_calls {
            return Err(BridgeError::Disconnected);
        }
        self.invocations
            .lock()
            .expect("invocation lock should not be poisoned")
            .push((name.to_string(), arguments.clone()));
        Ok(serde_json::from_value(json!({
            "content": [{"type": "text", "text": "file contents"}]
        }))
        .expect("result should deserialize"))
    }

    fn shutdown(&mut self) {}
}

struct Harness {
    requests: mpsc::Sender<AgentRequest>,
    events: mpsc::Receiver<AgentEvent>,
    handle: thread::JoinHandle<()>,
    store: SessionStore,
    snapshots: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    invocations: Arc<Mutex<Vec<(String, Value)>>>,
    _dir: TempDir,
}

impl Harness {
    fn start(turns: Vec<Result<ModelTurn, CompletionError>>, fail_tool_calls: bool) -> Self {
        let dir = TempDir::new().expect("tempdir should be created");
        let store = SessionStore::new(dir.path());
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let invocations = Arc::new(Mutex::new(Vec::new()));

        let provider = Box::new(ScriptedProvider {
            turns: Mutex::new(turns.into()),
            snapshots: Arc::clone(&snapshots),
        });
        let bridge = ToolBridge::connect(FakeToolServer {
            invocations: Arc::clone(&invocations),
            fail_calls: fail_tool_calls,
        })
        .expect("bridge connect should succeed");

        let (request_tx, request_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let agent = Agent::new(
            provider,
            bridge,
            store.clone(),
            TEST_PROMPT.to_string(),
            event_tx,
        );
        let handle = thread::Builder::new()
            .name("agent-under-test".to_string())
            .spawn(move || agent.run(request_rx))
            .expect("agent thread should spawn");

        Self {
            requests: request_tx,
            events: event_rx,
            handle,
            store,
            snapshots,
            invocations,
            _dir: dir,
        }
    }

    fn submit(&self, request: AgentRequest) -> Vec<AgentEvent> {
        self.requests
            .send(request)
            .expect("agent should be running");
        let mut seen = Vec::new();
        loop {
            match self
                .events
                .recv()
                .expect("agent should answer every request")
            {
                AgentEvent::TurnComplete => return seen,
                event => seen.push(event),
            }
        }
    }

    // Returns the tempdir alongside the store so the session directory
    // outlives the harness; dropping it here would delete the files the
    // caller is about to inspect.
    fn finish(self) -> (SessionStore, TempDir) {
        self.requests
            .send(AgentRequest::Shutdown)
            .expect("agent should be running");
        // Drain the terminal event from shutdown, then join.
        while let Ok(event) = self.events.recv() {
            if event == AgentEvent::TurnComplete {
                break;
            }
        }
        self.handle.join().expect("agent thread should not panic");
        (self.store, self._dir)
    }
}

fn view_request(arguments: &str) -> ModelTurn {
    ModelTurn::ToolRequest {
        text: None,
        calls: vec![ToolCallRequest::new("call-1", "view", arguments)],
    }
}

#[test]
fn plain_reply_appends_two_messages_and_persists_them() {
    let harness = Harness::start(
        vec![Ok(ModelTurn::FinalReply {
            text: "hi there".to_string(),
        })],
        false,
    );

    let events = harness.submit(AgentRequest::UserMessage("hello".to_string()));
    assert_eq!(
        events,
        vec![AgentEvent::AssistantReply("hi there".to_string())]
    );

    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].len(), 2);
    assert_eq!(snapshots[0][0], ChatMessage::system(TEST_PROMPT));
    assert_eq!(snapshots[0][1], ChatMessage::user("hello"));
    drop(snapshots);

    harness.submit(AgentRequest::Command(SlashCommand::Save));
    let (store, _dir) = harness.finish();

    let summaries = store.list(20).expect("list should succeed");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "hello");
    let document = store.load(&summaries[0].id).expect("load should succeed");
    assert_eq!(document.messages.len(), 2);
    assert_eq!(document.messages[0], ChatMessage::user("hello"));
    assert_eq!(document.messages[1], ChatMessage::assistant("hi there"));
}

#[test]
fn tool_call_round_appends_four_messages_in_order() {
    let harness = Harness::start(
        vec![
            Ok(view_request(r#"{"path":"notes.md"}"#)),
            Ok(ModelTurn::FinalReply {
                text: "done".to_string(),
            }),
        ],
        false,
    );

    let events = harness.submit(AgentRequest::UserMessage("show me notes.md".to_string()));
    assert_eq!(
        events,
        vec![
            AgentEvent::ToolCallStarted {
                name: "view".to_string()
            },
            AgentEvent::AssistantReply("done".to_string()),
        ]
    );

    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    assert_eq!(snapshots.len(), 2);
    let second_call = &snapshots[1];
    assert_eq!(second_call.len(), 4);
    assert_eq!(second_call[0].role, Role::System);
    assert_eq!(second_call[1].role, Role::User);
    assert_eq!(second_call[2].role, Role::Assistant);
    assert_eq!(second_call[2].tool_calls.len(), 1);
    assert_eq!(second_call[3].role, Role::Tool);
    assert_eq!(second_call[3].tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(second_call[3].text(), "file contents");
    drop(snapshots);

    assert_eq!(
        *harness.invocations.lock().expect("invocations readable"),
        vec![("view".to_string(), json!({"path": "notes.md"}))]
    );

    harness.finish();
}

#[test]
fn multi_call_turn_appends_one_tool_message_per_call_in_request_order() {
    let harness = Harness::start(
        vec![
            Ok(ModelTurn::ToolRequest {
                text: None,
                calls: vec![
                    ToolCallRequest::new("call-1", "view", r#"{"path":"a.md"}"#),
                    ToolCallRequest::new("call-2", "view", r#"{"path":"b.md"}"#),
                ],
            }),
            Ok(ModelTurn::FinalReply {
                text: "both read".to_string(),
            }),
        ],
        false,
    );

    let events = harness.submit(AgentRequest::UserMessage("compare a.md and b.md".to_string()));
    assert_eq!(
        events,
        vec![
            AgentEvent::ToolCallStarted {
                name: "view".to_string()
            },
            AgentEvent::ToolCallStarted {
                name: "view".to_string()
            },
            AgentEvent::AssistantReply("both read".to_string()),
        ]
    );

    // Both results land before the next completion, one tool message per
    // call, each tagged with the id of the call it answers.
    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    assert_eq!(snapshots.len(), 2);
    let second_call = &snapshots[1];
    assert_eq!(second_call.len(), 5);
    assert_eq!(second_call[2].tool_calls.len(), 2);
    assert_eq!(second_call[3].role, Role::Tool);
    assert_eq!(second_call[3].tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(second_call[4].role, Role::Tool);
    assert_eq!(second_call[4].tool_call_id.as_deref(), Some("call-2"));
    drop(snapshots);

    assert_eq!(
        *harness.invocations.lock().expect("invocations readable"),
        vec![
            ("view".to_string(), json!({"path": "a.md"})),
            ("view".to_string(), json!({"path": "b.md"})),
        ]
    );

    harness.finish();
}

#[test]
fn tool_transport_failure_becomes_result_text_and_turn_continues() {
    let harness = Harness::start(
        vec![
            Ok(view_request(r#"{"path":"notes.md"}"#)),
            Ok(ModelTurn::FinalReply {
                text: "recovered".to_string(),
            }),
        ],
        true,
    );

    let events = harness.submit(AgentRequest::UserMessage("read it".to_string()));
    assert!(events.contains(&AgentEvent::AssistantReply("recovered".to_string())));

    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    assert_eq!(snapshots.len(), 2);
    let tool_message = &snapshots[1][3];
    assert_eq!(tool_message.role, Role::Tool);
    assert!(
        tool_message.text().starts_with("Error calling view:"),
        "unexpected tool result: {}",
        tool_message.text()
    );
    drop(snapshots);

    harness.finish();
}

#[test]
fn malformed_arguments_are_substituted_without_reaching_the_server() {
    let harness = Harness::start(
        vec![
            Ok(view_request("{not json")),
            Ok(ModelTurn::FinalReply {
                text: "recovered".to_string(),
            }),
        ],
        false,
    );

    let events = harness.submit(AgentRequest::UserMessage("read it".to_string()));
    assert!(events.contains(&AgentEvent::AssistantReply("recovered".to_string())));

    assert!(harness
        .invocations
        .lock()
        .expect("invocations readable")
        .is_empty());

    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    let tool_message = &snapshots[1][3];
    assert!(tool_message
        .text()
        .starts_with("Error calling view: malformed arguments:"));
    drop(snapshots);

    harness.finish();
}

#[test]
fn unknown_tool_is_substituted_without_reaching_the_server() {
    let harness = Harness::start(
        vec![
            Ok(ModelTurn::ToolRequest {
                text: None,
                calls: vec![ToolCallRequest::new("call-1", "bogus", "{}")],
            }),
            Ok(ModelTurn::FinalReply {
                text: "recovered".to_string(),
            }),
        ],
        false,
    );

    harness.submit(AgentRequest::UserMessage("try it".to_string()));

    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    assert_eq!(
        snapshots[1][3].text(),
        "Error calling bogus: unknown tool"
    );
    drop(snapshots);
    assert!(harness
        .invocations
        .lock()
        .expect("invocations readable")
        .is_empty());

    harness.finish();
}

#[test]
fn completion_failure_surfaces_as_error_event() {
    let harness = Harness::start(vec![Err(CompletionError::new("boom"))], false);

    let events = harness.submit(AgentRequest::UserMessage("hello".to_string()));
    assert!(events.iter().any(|event| matches!(
        event,
        AgentEvent::Error(text) if text.contains("model request failed")
    )));

    harness.finish();
}

#[test]
fn save_without_user_messages_writes_nothing() {
    let harness = Harness::start(Vec::new(), false);

    let events = harness.submit(AgentRequest::Command(SlashCommand::Save));
    assert_eq!(
        events,
        vec![AgentEvent::Info("nothing to save yet".to_string())]
    );

    let (store, _dir) = harness.finish();
    assert!(store.list(20).expect("list should succeed").is_empty());
}

#[test]
fn clear_saves_the_old_session_and_starts_a_new_one() {
    let harness = Harness::start(
        vec![
            Ok(ModelTurn::FinalReply {
                text: "first".to_string(),
            }),
            Ok(ModelTurn::FinalReply {
                text: "second".to_string(),
            }),
        ],
        false,
    );

    harness.submit(AgentRequest::UserMessage("one".to_string()));
    let events = harness.submit(AgentRequest::Command(SlashCommand::Clear));
    assert!(events.iter().any(|event| matches!(
        event,
        AgentEvent::Info(text) if text.starts_with("started new session")
    )));
    harness.submit(AgentRequest::UserMessage("two".to_string()));
    harness.submit(AgentRequest::Command(SlashCommand::Save));

    let (store, _dir) = harness.finish();
    let summaries = store.list(20).expect("list should succeed");
    assert_eq!(summaries.len(), 2);
    let titles: Vec<&str> = summaries
        .iter()
        .map(|summary| summary.title.as_str())
        .collect();
    assert!(titles.contains(&"one"));
    assert!(titles.contains(&"two"));
}

#[test]
fn load_replays_user_and_assistant_messages() {
    let harness = Harness::start(
        vec![
            Ok(ModelTurn::FinalReply {
                text: "hi there".to_string(),
            }),
            Ok(ModelTurn::FinalReply {
                text: "welcome back".to_string(),
            }),
        ],
        false,
    );

    harness.submit(AgentRequest::UserMessage("hello".to_string()));
    harness.submit(AgentRequest::Command(SlashCommand::Save));
    harness.submit(AgentRequest::Command(SlashCommand::Clear));

    let events = harness.submit(AgentRequest::Command(SlashCommand::Load("1".to_string())));
    assert_eq!(
        events[0],
        AgentEvent::Replay {
            role: Role::User,
            text: "hello".to_string()
        }
    );
    assert_eq!(
        events[1],
        AgentEvent::Replay {
            role: Role::Assistant,
            text: "hi there".to_string()
        }
    );
    assert!(matches!(
        &events[2],
        AgentEvent::Info(text) if text.starts_with("loaded session")
    ));

    // The resumed history feeds the next turn: system + the two restored
    // messages + the new user message.
    harness.submit(AgentRequest::UserMessage("back again".to_string()));
    let snapshots = harness.snapshots.lock().expect("snapshots readable");
    let resumed = snapshots.last().expect("resumed turn should be recorded");
    assert_eq!(resumed.len(), 4);
    assert_eq!(resumed[0].role, Role::System);
    assert_eq!(resumed[3], ChatMessage::user("back again"));
    drop(snapshots);

    harness.finish();
}

#[test]
fn load_with_bad_index_is_an_error() {
    let harness = Harness::start(Vec::new(), false);

    let events = harness.submit(AgentRequest::Command(SlashCommand::Load("7".to_string())));
    assert!(matches!(&events[0], AgentEvent::Error(_)));

    let events = harness.submit(AgentRequest::Command(SlashCommand::Load("x".to_string())));
    assert!(matches!(&events[0], AgentEvent::Error(_)));

    harness.finish();
}

#[test]
fn status_reports_model_and_tool_inventory() {
    let harness = Harness::start(Vec::new(), false);

    let events = harness.submit(AgentRequest::Command(SlashCommand::Status));
    match &events[0] {
        AgentEvent::Info(text) => {
            assert!(text.contains("test/model"));
            assert!(text.contains("view"));
        }
        other => panic!("expected status info, got {other:?}"),
    }

    harness.finish();
}

#[test]
fn unknown_command_is_reported() {
    let harness = Harness::start(Vec::new(), false);

    let events = harness.submit(AgentRequest::Command(SlashCommand::Unknown(
        "/model".to_string(),
    )));
    assert_eq!(
        events,
        vec![AgentEvent::Error(
            "unknown command /model; try /help".to_string()
        )]
    );

    harness.finish();
}
