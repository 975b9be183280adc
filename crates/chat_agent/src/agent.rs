//! Agent task: exclusive owner of conversation state and the turn loop.

use std::sync::mpsc;

use chat_provider::{ChatMessage, CompletionProvider, ModelTurn, Role, ToolCallRequest};
use serde_json::Value;
use session_store::SessionStore;
use tool_bridge::{ToolBridge, ToolServer};

use crate::commands::{SlashCommand, HELP_TEXT};

const SESSION_LIST_LIMIT: usize = 20;

/// Work items sent from the shell to the agent task.
pub enum AgentRequest {
    UserMessage(String),
    Command(SlashCommand),
    /// Swap the completion provider after a settings change. The bridge
    /// connection and its cached tool schema survive the swap.
    ReplaceProvider(Box<dyn CompletionProvider>),
    Shutdown,
}

/// Events flowing back to the shell. Every request is answered by a stream of
/// zero or more non-terminal events followed by exactly one `TurnComplete`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Info(String),
    Error(String),
    ToolCallStarted { name: String },
    AssistantReply(String),
    Replay { role: Role, text: String },
    TurnComplete,
}

pub struct Agent<S: ToolServer> {
    provider: Box<dyn CompletionProvider>,
    bridge: ToolBridge<S>,
    store: SessionStore,
    system_prompt: String,
    session_id: String,
    title: Option<String>,
    history: Vec<ChatMessage>,
    events: mpsc::Sender<AgentEvent>,
}

impl<S: ToolServer> Agent<S> {
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        bridge: ToolBridge<S>,
        store: SessionStore,
        system_prompt: String,
        events: mpsc::Sender<AgentEvent>,
    ) -> Self {
        let history = vec![ChatMessage::system(system_prompt.clone())];
        Self {
            provider,
            bridge,
            store,
            system_prompt,
            session_id: SessionStore::generate_id(),
            title: None,
            history,
            events,
        }
    }

    /// Drains requests until shutdown. Consumes the agent; run on its own
    /// thread with the shell holding the other channel ends.
    pub fn run(mut self, requests: mpsc::Receiver<AgentRequest>) {
        while let Ok(request) = requests.recv() {
            match request {
                AgentRequest::UserMessage(text) => self.run_turn(text),
                AgentRequest::Command(command) => self.handle_command(command),
                AgentRequest::ReplaceProvider(provider) => {
                    self.provider = provider;
                    self.emit(AgentEvent::Info(format!(
                        "model set to {}",
                        self.provider.model_id()
                    )));
                }
                AgentRequest::Shutdown => break,
            }
            if self.events.send(AgentEvent::TurnComplete).is_err() {
                break;
            }
        }

        self.save_session(false);
        self.bridge.shutdown();
        let _ = self.events.send(AgentEvent::TurnComplete);
    }

    fn emit(&self, event: AgentEvent) {
        let _ = self.events.send(event);
    }

    /// One full agent turn: the only exit is a model reply with no tool calls.
    fn run_turn(&mut self, text: String) {
        let span = tracing::info_span!("turn", session = %self.session_id);
        let _guard = span.enter();

        if self.title.is_none() {
            self.title = Some(text.clone());
        }
        self.history.push(ChatMessage::user(text));

        loop {
            let turn = match self
                .provider
                .complete(&self.history, self.bridge.function_declarations())
            {
                Ok(turn) => turn,
                Err(error) => {
                    tracing::warn!(%error, "completion request failed");
                    self.emit(AgentEvent::Error(format!("model request failed: {error}")));
                    return;
                }
            };
            self.history.push(turn.to_message());

            match turn {
                ModelTurn::FinalReply { text } => {
                    self.emit(AgentEvent::AssistantReply(text));
                    return;
                }
                ModelTurn::ToolRequest { calls, .. } => {
                    for call in calls {
                        let name = call.function.name.clone();
                        self.emit(AgentEvent::ToolCallStarted { name: name.clone() });
                        tracing::info!(tool = %name, "dispatching tool call");
                        let result_text = self.execute_call(&call);
                        self.history
                            .push(ChatMessage::tool_result(call.id, result_text));
                    }
                }
            }
        }
    }

    /// Executes one requested invocation. Failures never abort the turn; they
    /// come back as the tool-result text the model will read.
    fn execute_call(&mut self, call: &ToolCallRequest) -> String {
        let name = call.function.name.as_str();
        if !self.bridge.has_tool(name) {
            return format!("Error calling {name}: unknown tool");
        }

        let arguments: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(error) => {
                return format!("Error calling {name}: malformed arguments: {error}");
            }
        };

        match self.bridge.invoke(name, &arguments) {
            Ok(text) => text,
            Err(error) => format!("Error calling {name}: {error}"),
        }
    }

    fn handle_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Help => self.emit(AgentEvent::Info(HELP_TEXT.to_string())),
            SlashCommand::Skills => self.run_bridge_command("list_skills", Value::Object(Default::default())),
            SlashCommand::Search(query) => {
                if query.is_empty() {
                    self.emit(AgentEvent::Error("usage: /search <query>".to_string()));
                } else {
                    self.run_bridge_command(
                        "search_cloud_skills",
                        serde_json::json!({ "query": query }),
                    );
                }
            }
            SlashCommand::Clear => self.handle_clear(),
            SlashCommand::Sessions => self.handle_sessions(),
            SlashCommand::Load(argument) => self.handle_load(&argument),
            SlashCommand::Save => self.save_session(true),
            SlashCommand::Status => self.handle_status(),
            // The shell owns the settings editor; nothing to do here.
            SlashCommand::Settings => {}
            SlashCommand::Unknown(command) => {
                self.emit(AgentEvent::Error(format!(
                    "unknown command {command}; try /help"
                )));
            }
        }
    }

    fn run_bridge_command(&mut self, tool: &str, arguments: Value) {
        match self.bridge.invoke(tool, &arguments) {
            Ok(text) => self.emit(AgentEvent::Info(text)),
            Err(error) => self.emit(AgentEvent::Error(format!("{tool} failed: {error}"))),
        }
    }

    fn handle_clear(&mut self) {
        self.save_session(false);
        self.session_id = SessionStore::generate_id();
        self.title = None;
        self.history = vec![ChatMessage::system(self.system_prompt.clone())];
        self.emit(AgentEvent::Info(format!(
            "started new session {}",
            self.session_id
        )));
    }

    fn handle_sessions(&mut self) {
        match self.store.list(SESSION_LIST_LIMIT) {
            Ok(summaries) if summaries.is_empty() => {
                self.emit(AgentEvent::Info("no saved sessions".to_string()));
            }
            Ok(summaries) => {
                let lines: Vec<String> = summaries
                    .iter()
                    .enumerate()
                    .map(|(index, summary)| {
                        format!(
                            "{}. {} — {}, {} messages, updated {}",
                            index + 1,
                            summary.title,
                            summary.model,
                            summary.message_count,
                            summary.updated_at
                        )
                    })
                    .collect();
                self.emit(AgentEvent::Info(lines.join("\n")));
            }
            Err(error) => self.emit(AgentEvent::Error(format!("cannot list sessions: {error}"))),
        }
    }

    fn handle_load(&mut self, argument: &str) {
        let Ok(number) = argument.trim().parse::<usize>() else {
            self.emit(AgentEvent::Error(
                "usage: /load <number from /sessions>".to_string(),
            ));
            return;
        };

        let summaries = match self.store.list(SESSION_LIST_LIMIT) {
            Ok(summaries) => summaries,
            Err(error) => {
                self.emit(AgentEvent::Error(format!("cannot list sessions: {error}")));
                return;
            }
        };
        let Some(summary) = number.checked_sub(1).and_then(|index| summaries.get(index)) else {
            self.emit(AgentEvent::Error(format!(
                "no session {number}; run /sessions first"
            )));
            return;
        };

        let document = match self.store.load(&summary.id) {
            Ok(document) => document,
            Err(error) => {
                self.emit(AgentEvent::Error(format!("cannot load session: {error}")));
                return;
            }
        };

        self.session_id = document.id.clone();
        self.title = Some(document.title.clone());
        self.history = vec![ChatMessage::system(self.system_prompt.clone())];
        self.history.extend(document.messages.iter().cloned());

        for message in &document.messages {
            if !matches!(message.role, Role::User | Role::Assistant) {
                continue;
            }
            let text = message.text();
            if text.is_empty() {
                continue;
            }
            self.emit(AgentEvent::Replay {
                role: message.role,
                text: text.to_string(),
            });
        }
        self.emit(AgentEvent::Info(format!(
            "loaded session {} ({})",
            document.id, document.title
        )));
    }

    fn handle_status(&mut self) {
        let tools: Vec<&str> = self.bridge.tool_names().collect();
        self.emit(AgentEvent::Info(format!(
            "session {} | model {} | {} messages | tools: {}",
            self.session_id,
            self.provider.model_id(),
            self.history.len().saturating_sub(1),
            tools.join(", ")
        )));
    }

    fn save_session(&mut self, announce: bool) {
        let title = self.title.clone().unwrap_or_else(|| "untitled".to_string());
        match self.store.save(
            &self.session_id,
            &title,
            &self.provider.model_id(),
            &self.history,
        ) {
            Ok(Some(path)) => {
                tracing::info!(session = %self.session_id, path = %path.display(), "session saved");
                if announce {
                    self.emit(AgentEvent::Info(format!("saved to {}", path.display())));
                }
            }
            Ok(None) => {
                if announce {
                    self.emit(AgentEvent::Info("nothing to save yet".to_string()));
                }
            }
            Err(error) => {
                tracing::warn!(%error, "session save failed");
                self.emit(AgentEvent::Error(format!("save failed: {error}")));
            }
        }
    }
}
