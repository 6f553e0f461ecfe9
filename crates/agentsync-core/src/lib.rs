pub mod agent;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod tools;

// Re-export key types
pub use agent::{
    Agent, AgentRun, AgentTurn, OutputMode, RouteDecision, Supervisor, Workflow, WorkflowEvent,
    WorkflowRun,
};
pub use config::{Settings, ValidationMode};
pub use conversation::Conversation;
pub use error::{AgentSyncError, Result};
pub use llm::{LlmClient, LlmResponse, Message, OpenAIClient, Role, ToolCall};
pub use tools::{Tool, ToolDefinition, ToolRegistry, ToolResult};
