use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool error: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Agent {agent} exceeded maximum steps ({limit})")]
    AgentStepLimitExceeded { agent: String, limit: usize },

    #[error("Supervisor exceeded maximum routing steps ({0})")]
    SupervisorStepLimitExceeded(usize),

    #[error("Supervisor has no agents to delegate to")]
    EmptyAgentSet,

    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),

    #[error("Routing selected unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Routing selected {0} agents in a single step")]
    AmbiguousRoute(usize),

    #[error("{what} timed out after {secs}s")]
    StepTimeout { what: String, secs: u64 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentSyncError {
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn invalid_args(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Timeouts and transport failures may succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StepTimeout { .. } | Self::Http(_))
    }

    /// Process exit code: 1 for configuration problems, 2 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable() {
        let err = AgentSyncError::StepTimeout {
            what: "model call".into(),
            secs: 5,
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "model call timed out after 5s");
        assert!(!AgentSyncError::EmptyAgentSet.is_retryable());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(AgentSyncError::Config("missing key".into()).exit_code(), 1);
        assert_eq!(AgentSyncError::tool("send_email", "rejected").exit_code(), 2);
        assert_eq!(AgentSyncError::SupervisorStepLimitExceeded(3).exit_code(), 2);
    }
}
