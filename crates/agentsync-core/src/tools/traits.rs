use crate::error::AgentSyncError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type ToolResult = Result<Value, AgentSyncError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value) -> ToolResult;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Named tools in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `DuplicateTool` and leaves the registry untouched when the
    /// name is taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), AgentSyncError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentSyncError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: Box<dyn Tool>) -> Result<Self, AgentSyncError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Looks the tool up, checks `args` against its schema, then runs it.
    /// Failures raised by the tool itself come back as `ToolExecution`.
    pub async fn invoke(&self, name: &str, args: Value) -> ToolResult {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentSyncError::UnknownTool(name.to_string()))?;

        super::validate_arguments(name, &tool.parameters_schema(), &args)?;

        tracing::debug!(tool = name, "invoking tool");
        tool.execute(args).await.map_err(|e| match e {
            AgentSyncError::ToolExecution { .. } | AgentSyncError::InvalidArguments { .. } => e,
            other => AgentSyncError::tool(name, other.to_string()),
        })
    }
}

/// Text handed back to a model for a tool's output. Strings pass through as-is.
pub fn render_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
