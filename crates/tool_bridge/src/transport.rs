//! Child-process stdio transport for the tool server.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wait_timeout::ChildExt;

use crate::bridge::ToolServer;
use crate::error::BridgeError;
use crate::protocol::{
    CallToolResult, ListToolsResult, RpcRequest, RpcResponse, ToolDescriptor, METHOD_CALL_TOOL,
    METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_LIST_TOOLS, PROTOCOL_VERSION,
};

/// Wall-clock limit for awaiting any single tool-server response.
pub const TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(120);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Tool server reached by spawning a child process and exchanging
/// newline-delimited JSON-RPC frames over its stdio.
pub struct StdioToolServer {
    child: Child,
    stdin: ChildStdin,
    incoming: mpsc::Receiver<RpcResponse>,
    next_id: u64,
    shut_down: bool,
}

impl StdioToolServer {
    /// Spawns the server process and performs the initialize handshake.
    pub fn spawn(
        program: &str,
        args: &[String],
        client_name: &str,
        client_version: &str,
    ) -> Result<Self, BridgeError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                command: program.to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::connection("tool server stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::connection("tool server stdout unavailable"))?;

        let (sender, incoming) = mpsc::channel();
        thread::spawn(move || read_responses(stdout, sender));

        let mut server = Self {
            child,
            stdin,
            incoming,
            next_id: 0,
            shut_down: false,
        };

        server.request(
            METHOD_INITIALIZE,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": client_name, "version": client_version },
            }),
        )?;
        server.notify(METHOD_INITIALIZED)?;
        Ok(server)
    }

    fn notify(&mut self, method: &str) -> Result<(), BridgeError> {
        self.write_frame(&RpcRequest::notification(method))
    }

    fn request(&mut self, method: &str, params: Value) -> Result<Value, BridgeError> {
        self.next_id += 1;
        let id = self.next_id;
        self.write_frame(&RpcRequest::call(id, method, params))?;
        self.await_response(id, method)
    }

    fn write_frame(&mut self, frame: &RpcRequest) -> Result<(), BridgeError> {
        let mut line = serde_json::to_string(frame)
            .map_err(|error| BridgeError::protocol(format!("frame encoding failed: {error}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .and_then(|()| self.stdin.flush())
            .map_err(|error| BridgeError::connection(format!("write to tool server: {error}")))
    }

    fn await_response(&mut self, id: u64, operation: &str) -> Result<Value, BridgeError> {
        let deadline = Instant::now() + TOOL_CALL_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BridgeError::Timeout {
                    operation: operation.to_string(),
                    timeout_secs: TOOL_CALL_TIMEOUT.as_secs(),
                });
            }

            let response = match self.incoming.recv_timeout(remaining) {
                Ok(response) => response,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(BridgeError::Timeout {
                        operation: operation.to_string(),
                        timeout_secs: TOOL_CALL_TIMEOUT.as_secs(),
                    });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(BridgeError::Disconnected);
                }
            };

            // Stale ids belong to calls that already timed out; drop them.
            match response.id {
                Some(got) if got == id => {
                    if let Some(error) = response.error {
                        return Err(BridgeError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return response.result.ok_or_else(|| {
                        BridgeError::protocol(format!("`{operation}` response carried no result"))
                    });
                }
                _ => continue,
            }
        }
    }
}

impl ToolServer for StdioToolServer {
    fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, BridgeError> {
        let result = self.request(METHOD_LIST_TOOLS, json!({}))?;
        let parsed: ListToolsResult = serde_json::from_value(result)
            .map_err(|error| BridgeError::protocol(format!("malformed tools/list: {error}")))?;
        Ok(parsed.tools)
    }

    fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<CallToolResult, BridgeError> {
        let result = self.request(
            METHOD_CALL_TOOL,
            json!({ "name": name, "arguments": arguments }),
        )?;
        serde_json::from_value(result)
            .map_err(|error| BridgeError::protocol(format!("malformed tools/call: {error}")))
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let _ = self.child.kill();
        if let Ok(None) = self.child.wait_timeout(SHUTDOWN_GRACE) {
            let _ = self.child.wait();
        }
    }
}

impl Drop for StdioToolServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_responses(stdout: std::process::ChildStdout, sender: mpsc::Sender<RpcResponse>) {
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Non-frame output (server logging) is ignored.
        let Ok(response) = serde_json::from_str::<RpcResponse>(trimmed) else {
            continue;
        };
        if sender.send(response).is_err() {
            break;
        }
    }
}
