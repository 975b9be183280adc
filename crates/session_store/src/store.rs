use std::fs;
use std::path::{Path, PathBuf};

use chat_provider::{ChatMessage, Role};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::SessionStoreError;
use crate::paths::session_file_name;
use crate::schema::{SessionDocument, SessionSummary};

/// Titles are clipped to this many characters before persisting.
pub const MAX_TITLE_CHARS: usize = 60;

const ID_CHARS: usize = 12;

/// Filesystem-backed session persistence, one JSON document per session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Short random session identifier, lowercase hex.
    #[must_use]
    pub fn generate_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        hex[..ID_CHARS].to_string()
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root.join(session_file_name(session_id))
    }

    /// Persists a session snapshot. System messages are stripped first; when
    /// nothing remains the file is not written at all and `None` is returned.
    ///
    /// `created_at` survives rewrites by re-reading any existing document;
    /// `updated_at` is always refreshed. The document lands via a temp file
    /// and rename so a concurrent reader never sees a partial record.
    pub fn save(
        &self,
        session_id: &str,
        title: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<Option<PathBuf>, SessionStoreError> {
        let persisted: Vec<ChatMessage> = messages
            .iter()
            .filter(|message| message.role != Role::System)
            .cloned()
            .collect();
        if persisted.is_empty() {
            return Ok(None);
        }

        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(SessionStoreError::ClockFormat)?;
        let path = self.session_path(session_id);
        let created_at = match self.load(session_id) {
            Ok(existing) => existing.created_at,
            Err(_) => now.clone(),
        };

        let document = SessionDocument {
            id: session_id.to_string(),
            title: clip_title(title),
            created_at,
            updated_at: now,
            model: model.to_string(),
            messages: persisted,
        };

        fs::create_dir_all(&self.root)
            .map_err(|source| SessionStoreError::io("creating session root", &self.root, source))?;
        let body = serde_json::to_vec_pretty(&document)
            .map_err(|source| SessionStoreError::json_serialize(&path, source))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, body)
            .map_err(|source| SessionStoreError::io("writing session file", &tmp_path, source))?;
        fs::rename(&tmp_path, &path)
            .map_err(|source| SessionStoreError::io("renaming session file", &path, source))?;

        Ok(Some(path))
    }

    pub fn load(&self, session_id: &str) -> Result<SessionDocument, SessionStoreError> {
        let path = self.session_path(session_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionStoreError::SessionNotFound {
                    id: session_id.to_string(),
                });
            }
            Err(source) => {
                return Err(SessionStoreError::io("reading session file", &path, source));
            }
        };

        serde_json::from_slice(&bytes)
            .map_err(|source| SessionStoreError::json_parse(&path, source))
    }

    /// Lists stored sessions, newest first by `updated_at`.
    ///
    /// Files that cannot be read or parsed are skipped individually; one
    /// corrupt session never hides the rest.
    pub fn list(&self, limit: usize) -> Result<Vec<SessionSummary>, SessionStoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SessionStoreError::io(
                    "listing session root",
                    &self.root,
                    source,
                ));
            }
        };

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let Ok(document) = serde_json::from_slice::<SessionDocument>(&bytes) else {
                continue;
            };
            summaries.push(SessionSummary::from(&document));
        }

        // Sort on the parsed instant, not the string: Rfc3339 omits a zero
        // subsecond part, and "...05Z" compares after "...05.9Z" bytewise.
        summaries.sort_by_key(|summary| std::cmp::Reverse(updated_at_instant(&summary.updated_at)));
        summaries.truncate(limit);
        Ok(summaries)
    }
}

/// Nanosecond sort key for an `updated_at` value. Documents with a
/// timestamp this store never wrote sort last rather than being dropped.
fn updated_at_instant(value: &str) -> i128 {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(OffsetDateTime::unix_timestamp_nanos)
        .unwrap_or(i128::MIN)
}

fn clip_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::{clip_title, updated_at_instant, SessionStore, MAX_TITLE_CHARS};

    #[test]
    fn generated_ids_are_short_lowercase_hex() {
        let id = SessionStore::generate_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, SessionStore::generate_id());
    }

    #[test]
    fn updated_at_instant_orders_subsecond_timestamps_within_a_second() {
        let whole = updated_at_instant("2026-08-27T10:00:05Z");
        let fractional = updated_at_instant("2026-08-27T10:00:05.5Z");
        assert!(fractional > whole);
    }

    #[test]
    fn updated_at_instant_sorts_unparsable_timestamps_last() {
        assert_eq!(updated_at_instant("not a timestamp"), i128::MIN);
        assert!(updated_at_instant("1970-01-01T00:00:00Z") > i128::MIN);
    }

    #[test]
    fn clip_title_preserves_short_titles_and_clips_by_chars() {
        assert_eq!(clip_title("hello"), "hello");

        let long = "x".repeat(MAX_TITLE_CHARS + 20);
        assert_eq!(clip_title(&long).chars().count(), MAX_TITLE_CHARS);
    }
}
