use chat_provider::ToolDeclaration;
use serde_json::Value;

use crate::error::BridgeError;
use crate::protocol::{CallToolResult, ToolDescriptor};

/// Server interface the bridge drives. The stdio transport is the production
/// implementation; tests substitute an in-process fake.
pub trait ToolServer: Send {
    fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, BridgeError>;
    fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<CallToolResult, BridgeError>;
    fn shutdown(&mut self);
}

/// Connection-scoped view over one tool server.
///
/// The advertised schema is fetched once at connect time and reused for the
/// connection lifetime, both as declarations and as pre-rendered function
/// declarations for completion requests.
pub struct ToolBridge<S: ToolServer> {
    server: S,
    declarations: Vec<ToolDeclaration>,
    function_declarations: Vec<Value>,
}

impl<S: ToolServer> ToolBridge<S> {
    pub fn connect(mut server: S) -> Result<Self, BridgeError> {
        let descriptors = server.list_tools()?;
        let declarations: Vec<ToolDeclaration> =
            descriptors.into_iter().map(Into::into).collect();
        let function_declarations = declarations
            .iter()
            .map(ToolDeclaration::to_function_declaration)
            .collect();
        Ok(Self {
            server,
            declarations,
            function_declarations,
        })
    }

    /// Cached schema in the model API's function-declaration shape.
    pub fn function_declarations(&self) -> &[Value] {
        &self.function_declarations
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|decl| decl.name.as_str())
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.declarations.iter().any(|decl| decl.name == name)
    }

    /// Dispatches one invocation and flattens the result to text.
    ///
    /// Server-reported tool failures still produce text (the model is expected
    /// to read them); only transport-level failures surface as errors.
    pub fn invoke(&mut self, name: &str, arguments: &Value) -> Result<String, BridgeError> {
        let result = self.server.call_tool(name, arguments)?;
        Ok(result.joined_text())
    }

    pub fn shutdown(&mut self) {
        self.server.shutdown();
    }
}
