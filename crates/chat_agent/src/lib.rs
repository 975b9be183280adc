//! Terminal chat agent runtime + readline shell crate.
//!
//! ## Bootstrap
//!
//! `skillchat` reads flat YAML settings from `~/.skillchat/settings.yaml`
//! (`api_key`, `model`, `base_url`, `skills_dir`, `workdir`, `tool_server`;
//! unknown keys survive rewrites). Missing or invalid settings trigger the
//! guided entry flow instead of a crash.
//!
//! Set `SKILLCHAT_LOG` to a tracing env-filter directive to enable logging,
//! e.g. `SKILLCHAT_LOG=chat_agent=debug`.
//!
//! ## Task split
//!
//! The shell task owns the terminal; the agent task exclusively owns
//! conversation history. They exchange [`agent::AgentRequest`] /
//! [`agent::AgentEvent`] values over std mpsc channels, and every request is
//! answered by a terminal `TurnComplete` event, so the shell never prompts
//! while a turn is in flight.

pub mod agent;
pub mod commands;
pub mod prompt;
pub mod providers;
pub mod settings;
pub mod shell;
