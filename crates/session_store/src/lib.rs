mod error;
mod paths;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use paths::session_file_name;
pub use schema::{SessionDocument, SessionSummary};
pub use store::{SessionStore, MAX_TITLE_CHARS};
