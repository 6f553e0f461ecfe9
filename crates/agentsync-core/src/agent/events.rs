/// Progress of a workflow run - what the CLI prints while it waits.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Routing { step: usize },
    Delegated { agent: String },
    AgentThinking { agent: String, iteration: usize },
    ToolStart { agent: String, name: String },
    ToolResult { agent: String, name: String, success: bool, summary: String },
    AgentFinished { agent: String, iterations: usize },
    Done { routing_steps: usize },
    Error(String),
}
