#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Skills,
    Search(String),
    Clear,
    Sessions,
    Load(String),
    Save,
    Status,
    Settings,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim().to_string()),
        None => (trimmed, String::new()),
    };

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/skills" => SlashCommand::Skills,
        "/search" => SlashCommand::Search(argument),
        "/clear" => SlashCommand::Clear,
        "/sessions" => SlashCommand::Sessions,
        "/load" => SlashCommand::Load(argument),
        "/save" => SlashCommand::Save,
        "/status" => SlashCommand::Status,
        "/settings" => SlashCommand::Settings,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

pub const HELP_TEXT: &str = "\
/help          show this help
/skills        list installed skills
/search <q>    search cloud skills
/clear         save and start a new session
/sessions      list saved sessions
/load <n>      load a session by listing number
/save          save the current session
/status        show session and connection status
/settings      edit settings";
