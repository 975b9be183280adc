#[must_use]
pub fn session_file_name(session_id: &str) -> String {
    format!("{session_id}.json")
}
