//! Readline presentation shell. Owns the terminal, never the conversation.

use std::sync::mpsc;

use anyhow::anyhow;
use chat_provider::Role;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent::{AgentEvent, AgentRequest};
use crate::commands::{parse_slash_command, SlashCommand};
use crate::providers::{provider_from_settings, OpenRouterProvider};
use crate::settings::Settings;

const PROMPT: &str = "you> ";

/// Blocking input loop. Each submission is answered by draining agent events
/// until `TurnComplete`, so a second submission mid-turn is impossible.
pub fn run(
    mut editor: DefaultEditor,
    requests: mpsc::Sender<AgentRequest>,
    events: mpsc::Receiver<AgentEvent>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    println!(
        "{} — chatting with {} (Ctrl-D to exit, /help for commands)",
        "skillchat".bold(),
        settings.model.cyan()
    );

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                match parse_slash_command(input) {
                    Some(SlashCommand::Settings) => {
                        if let Some(updated) = edit_settings(&mut editor, &settings) {
                            settings = updated;
                            match provider_from_settings(&settings) {
                                Ok(provider) => {
                                    if requests
                                        .send(AgentRequest::ReplaceProvider(provider))
                                        .is_err()
                                        || !drain_turn(&events)
                                    {
                                        break;
                                    }
                                }
                                Err(error) => {
                                    render_event(&AgentEvent::Error(format!(
                                        "provider rebuild failed: {error}"
                                    )));
                                }
                            }
                        }
                        continue;
                    }
                    Some(command) => {
                        if requests.send(AgentRequest::Command(command)).is_err() {
                            break;
                        }
                    }
                    None => {
                        if requests
                            .send(AgentRequest::UserMessage(input.to_string()))
                            .is_err()
                        {
                            break;
                        }
                    }
                }

                if !drain_turn(&events) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = requests.send(AgentRequest::Shutdown);
                let _ = drain_turn(&events);
                println!("bye");
                break;
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}

fn drain_turn(events: &mpsc::Receiver<AgentEvent>) -> bool {
    loop {
        match events.recv() {
            Ok(AgentEvent::TurnComplete) => return true,
            Ok(event) => render_event(&event),
            Err(_) => return false,
        }
    }
}

fn render_event(event: &AgentEvent) {
    match event {
        AgentEvent::Info(text) => println!("{}", text.dimmed()),
        AgentEvent::Error(text) => eprintln!("{}", format!("error: {text}").red()),
        AgentEvent::ToolCallStarted { name } => {
            println!("{}", format!("→ {name}").yellow());
        }
        AgentEvent::AssistantReply(text) => {
            println!("{}", "assistant".cyan().bold());
            println!("{text}\n");
        }
        AgentEvent::Replay { role, text } => {
            let label = match role {
                Role::User => "you".green().bold(),
                _ => "assistant".cyan().bold(),
            };
            println!("{label}");
            println!("{text}\n");
        }
        AgentEvent::TurnComplete => {}
    }
}

fn edit_settings(editor: &mut DefaultEditor, current: &Settings) -> Option<Settings> {
    match guided_settings(editor, Some(current)) {
        Ok(updated) => {
            match updated.save() {
                Ok(path) => println!("{}", format!("settings saved to {}", path.display()).dimmed()),
                Err(error) => render_event(&AgentEvent::Error(format!("settings save failed: {error}"))),
            }
            Some(updated)
        }
        Err(error) => {
            render_event(&AgentEvent::Error(error.to_string()));
            None
        }
    }
}

/// Field-by-field settings entry, used both for `/settings` and for first-run
/// or invalid-settings recovery. Empty input keeps the shown default.
pub fn guided_settings(
    editor: &mut DefaultEditor,
    existing: Option<&Settings>,
) -> anyhow::Result<Settings> {
    println!("{}", "settings (empty input keeps the default)".bold());

    let api_key = loop {
        let label = if existing.is_some() {
            "OpenRouter API key [keep existing]"
        } else {
            "OpenRouter API key"
        };
        let entered = prompt_field(editor, label, "")?;
        let entered = entered.trim();
        if !entered.is_empty() {
            break entered.to_string();
        }
        if let Some(existing) = existing {
            break existing.api_key.clone();
        }
        println!("{}", "an API key is required".red());
    };

    let defaults = existing
        .cloned()
        .unwrap_or_else(|| Settings::with_api_key(api_key.clone()));

    let settings = Settings {
        api_key,
        model: prompt_field(editor, "model", &defaults.model)?,
        base_url: prompt_field(editor, "base URL", &defaults.base_url)?,
        skills_dir: prompt_field(editor, "skills directory", &defaults.skills_dir)?,
        workdir: prompt_field(editor, "working directory", &defaults.workdir)?,
        tool_server: defaults.tool_server,
    };

    check_model_is_routable(&settings);
    Ok(settings)
}

/// Advisory only: an unreachable listing never blocks settings entry.
fn check_model_is_routable(settings: &Settings) {
    let Ok(provider) =
        OpenRouterProvider::new(&settings.api_key, &settings.base_url, &settings.model)
    else {
        return;
    };
    let Ok(ids) = provider.list_model_ids() else {
        return;
    };
    if !ids.is_empty() && !ids.iter().any(|id| id == &settings.model) {
        println!(
            "{}",
            format!(
                "warning: {} is not in the provider's model listing; keeping it anyway",
                settings.model
            )
            .yellow()
        );
    }
}

fn prompt_field(editor: &mut DefaultEditor, label: &str, default: &str) -> anyhow::Result<String> {
    let prompt = if default.is_empty() {
        format!("{label}: ")
    } else {
        format!("{label} [{default}]: ")
    };

    match editor.readline(&prompt) {
        Ok(line) => {
            let entered = line.trim();
            if entered.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(entered.to_string())
            }
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            Err(anyhow!("settings entry cancelled"))
        }
        Err(error) => Err(error.into()),
    }
}
