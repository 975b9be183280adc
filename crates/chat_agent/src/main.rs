use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use rustyline::DefaultEditor;
use session_store::SessionStore;
use tool_bridge::{StdioToolServer, ToolBridge};
use tracing_subscriber::EnvFilter;

use chat_agent::agent::Agent;
use chat_agent::prompt::{self, DEFAULT_SYSTEM_PROMPT};
use chat_agent::providers;
use chat_agent::settings::Settings;
use chat_agent::shell;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SKILLCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let system_prompt = match parse_prompt_flag()? {
        Some(path) => prompt::system_prompt_from_file(&path)?,
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;

    let settings = match Settings::load() {
        Some(settings) => settings,
        None => {
            let entered = shell::guided_settings(&mut editor, None)?;
            let path = entered.save()?;
            println!("settings saved to {}", path.display());
            entered
        }
    };

    let provider = providers::provider_from_settings(&settings)
        .map_err(|error| anyhow::anyhow!("provider setup failed: {error}"))?;

    let (program, args) = settings.tool_server_command();
    let server = StdioToolServer::spawn(&program, &args, "skillchat", env!("CARGO_PKG_VERSION"))
        .with_context(|| format!("failed to start tool server `{}`", settings.tool_server))?;
    let bridge = ToolBridge::connect(server).context("tool server handshake failed")?;

    let store = SessionStore::new(Settings::sessions_root()?);

    let (request_tx, request_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let agent = Agent::new(provider, bridge, store, system_prompt, event_tx);
    let agent_thread = thread::Builder::new()
        .name("agent".to_string())
        .spawn(move || agent.run(request_rx))
        .context("failed to spawn agent thread")?;

    let result = shell::run(editor, request_tx, event_rx, settings);
    let _ = agent_thread.join();
    result
}

fn parse_prompt_flag() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--prompt" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--prompt requires a path"))?;
                return Ok(Some(PathBuf::from(value)));
            }
            other => return Err(anyhow::anyhow!("unknown argument: {other}")),
        }
    }
    Ok(None)
}
