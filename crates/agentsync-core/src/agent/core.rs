use super::{with_timeout, WorkflowEvent};
use crate::constants::limits;
use crate::conversation::Conversation;
use crate::error::AgentSyncError;
use crate::llm::{LlmClient, Message, ToolCall};
use crate::prompts;
use crate::tools::{render_output, Tool, ToolDefinition, ToolRegistry};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// One model response: the message plus any tool invocations it requests.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub message: Message,
    pub tool_calls: Vec<ToolCall>,
}

impl AgentTurn {
    pub fn is_terminal(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Everything one agent added while handling a hand-off.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub agent: String,
    /// New turns in the order they happened.
    pub messages: Vec<Message>,
    pub content: String,
    pub tool_calls: Vec<ToolExecution>,
    pub iterations: usize,
    /// The run ended on an error message instead of a model answer.
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub tool_name: String,
    pub params: Value,
    pub success: bool,
    pub result_summary: String,
}

/// A model bound to a prompt and a fixed set of tools.
pub struct Agent {
    name: String,
    prompt: Option<String>,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: usize,
    step_timeout: Option<Duration>,
}

impl Agent {
    pub fn new(name: impl Into<String>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            prompt: None,
            llm,
            tools: ToolRegistry::new(),
            max_iterations: limits::AGENT_MAX_STEPS,
            step_timeout: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn register_tool(&mut self, tool: Box<dyn Tool>) -> Result<(), AgentSyncError> {
        self.tools.register(tool)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn prompt(&self) -> Cow<'_, str> {
        match self.prompt {
            Some(ref prompt) => Cow::Borrowed(prompt),
            None => Cow::Owned(prompts::default_agent_prompt(&self.name, &self.tools.names())),
        }
    }

    /// Asks the model for the next turn given everything said so far.
    pub async fn respond(&self, conversation: &[Message]) -> Result<AgentTurn, AgentSyncError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(self.prompt()));
        messages.extend_from_slice(conversation);

        let tool_definitions: Vec<ToolDefinition> = self.tools.definitions();

        let response = with_timeout(
            self.step_timeout,
            || format!("model call for agent {}", self.name),
            self.llm.chat(&messages, &tool_definitions),
        )
        .await?;

        let message = response.message.with_author(&self.name);
        let tool_calls = message.tool_calls().to_vec();
        Ok(AgentTurn { message, tool_calls })
    }

    /// Run the respond / invoke tools / respond loop until the model answers
    /// without requesting a tool.
    pub async fn run(&self, conversation: &Conversation) -> Result<AgentRun, AgentSyncError> {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.run_with_events(conversation, &tx).await
    }

    pub async fn run_with_events(
        &self,
        conversation: &Conversation,
        event_tx: &UnboundedSender<WorkflowEvent>,
    ) -> Result<AgentRun, AgentSyncError> {
        let mut pending: Vec<Message> = Vec::new();
        let mut tool_executions = Vec::new();
        let mut iterations = 0;

        loop {
            if iterations >= self.max_iterations {
                return Err(AgentSyncError::AgentStepLimitExceeded {
                    agent: self.name.clone(),
                    limit: self.max_iterations,
                });
            }

            iterations += 1;
            let _ = event_tx.send(WorkflowEvent::AgentThinking {
                agent: self.name.clone(),
                iteration: iterations,
            });

            let view: Vec<Message> = conversation
                .messages()
                .iter()
                .chain(pending.iter())
                .cloned()
                .collect();
            let turn = self.respond(&view).await?;

            if turn.is_terminal() {
                let content = turn.message.content.clone();
                pending.push(turn.message);
                let _ = event_tx.send(WorkflowEvent::AgentFinished {
                    agent: self.name.clone(),
                    iterations,
                });
                return Ok(self.finish(pending, content, tool_executions, iterations, false));
            }

            pending.push(turn.message);

            let mut unknown = Vec::new();
            for tool_call in &turn.tool_calls {
                let tool_name = tool_call.name();
                let _ = event_tx.send(WorkflowEvent::ToolStart {
                    agent: self.name.clone(),
                    name: tool_name.to_string(),
                });

                let (success, result_str) = if self.tools.contains(tool_name) {
                    self.execute_tool(tool_call).await
                } else {
                    let err = AgentSyncError::UnknownTool(tool_name.to_string());
                    tracing::warn!(agent = %self.name, "{}", err);
                    unknown.push(tool_name.to_string());
                    (false, format!("Error: {err}"))
                };

                let summary = if success {
                    truncate_str(&result_str, limits::SUMMARY_CHARS)
                } else {
                    result_str.clone()
                };

                let _ = event_tx.send(WorkflowEvent::ToolResult {
                    agent: self.name.clone(),
                    name: tool_name.to_string(),
                    success,
                    summary: summary.clone(),
                });

                tool_executions.push(ToolExecution {
                    tool_name: tool_name.to_string(),
                    params: tool_call.parse_arguments().unwrap_or(Value::Null),
                    success,
                    result_summary: summary,
                });

                // every request gets its result, even a refused one
                pending.push(
                    Message::tool_result(&tool_call.id, result_str).with_author(tool_name),
                );
            }

            if !unknown.is_empty() {
                let content = format!(
                    "Error: {} requested tools it does not have: {}",
                    self.name,
                    unknown.join(", ")
                );
                pending.push(Message::assistant(&content).with_author(&self.name));
                let _ = event_tx.send(WorkflowEvent::AgentFinished {
                    agent: self.name.clone(),
                    iterations,
                });
                return Ok(self.finish(pending, content, tool_executions, iterations, true));
            }
        }
    }

    fn finish(
        &self,
        messages: Vec<Message>,
        content: String,
        tool_calls: Vec<ToolExecution>,
        iterations: usize,
        failed: bool,
    ) -> AgentRun {
        tracing::debug!(agent = %self.name, iterations, failed, "agent turn complete");
        AgentRun {
            agent: self.name.clone(),
            messages,
            content,
            tool_calls,
            iterations,
            failed,
        }
    }

    /// Tool failures become text for the model; they never abort the loop.
    async fn execute_tool(&self, tool_call: &ToolCall) -> (bool, String) {
        let tool_name = tool_call.name();

        let params = match tool_call.parse_arguments() {
            Ok(p) => p,
            Err(e) => {
                let err = AgentSyncError::invalid_args(
                    tool_name,
                    format!("arguments are not valid JSON: {e}"),
                );
                return (false, format!("Error: {err}"));
            }
        };

        let invocation = self.tools.invoke(tool_name, params);
        match with_timeout(self.step_timeout, || format!("tool {tool_name}"), invocation).await {
            Ok(value) => (true, render_output(&value)),
            Err(e) => {
                tracing::warn!(agent = %self.name, tool = tool_name, "tool failed: {}", e);
                (false, format!("Error: {e}"))
            }
        }
    }
}

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
