//! Client side of the external tool-execution process.
//!
//! The bridge speaks line-delimited JSON-RPC 2.0 over the child process stdio
//! (the stdio tool-server convention), caches the advertised tool schema once
//! per connection, and rewrites it into the model API's function-declaration
//! shape. Tool invocation results are flattened to text for the model.

pub mod bridge;
pub mod error;
pub mod protocol;
pub mod transport;

pub use bridge::{ToolBridge, ToolServer};
pub use error::BridgeError;
pub use protocol::{CallToolResult, ContentBlock, ToolDescriptor};
pub use transport::{StdioToolServer, TOOL_CALL_TIMEOUT};
