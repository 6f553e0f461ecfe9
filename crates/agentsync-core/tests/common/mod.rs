#![allow(dead_code)]

use agentsync_core::{
    AgentSyncError, LlmClient, LlmResponse, Message, Tool, ToolCall, ToolDefinition, ToolResult,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Plays back canned replies in order and records what it was shown.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Message>>,
    calls: Mutex<Vec<(Vec<Message>, Vec<ToolDefinition>)>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages passed on the `n`th call.
    pub fn messages_seen(&self, n: usize) -> Vec<Message> {
        self.calls.lock().unwrap()[n].0.clone()
    }

    pub fn tools_seen(&self, n: usize) -> Vec<String> {
        self.calls.lock().unwrap()[n].1.iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, AgentSyncError> {
        self.calls.lock().unwrap().push((messages.to_vec(), tools.to_vec()));
        let message = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentSyncError::Llm("script exhausted".into()))?;
        Ok(LlmResponse { message, usage: None })
    }
}

/// Returns the same reply forever.
pub struct RepeatLlm {
    reply: Message,
    calls: Mutex<usize>,
}

impl RepeatLlm {
    pub fn new(reply: Message) -> Self {
        Self { reply, calls: Mutex::new(0) }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl LlmClient for RepeatLlm {
    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse, AgentSyncError> {
        *self.calls.lock().unwrap() += 1;
        Ok(LlmResponse {
            message: self.reply.clone(),
            usage: None,
        })
    }
}

/// Never answers within any sane deadline.
pub struct StalledLlm;

#[async_trait::async_trait]
impl LlmClient for StalledLlm {
    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse, AgentSyncError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(LlmResponse {
            message: Message::assistant("too late"),
            usage: None,
        })
    }
}

pub struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes input"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"}
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        Ok(serde_json::json!({"echoed": params["text"]}))
    }
}

pub struct FailingTool;

#[async_trait::async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> ToolResult {
        Err(AgentSyncError::Llm("boom".into()))
    }
}

pub struct SlowTool;

#[async_trait::async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Takes an hour"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> ToolResult {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::String("finished".into()))
    }
}

pub fn call(id: &str, name: &str, args: Value) -> ToolCall {
    ToolCall::new(id, name, args.to_string())
}

pub fn calls_tool(id: &str, name: &str, args: Value) -> Message {
    Message::assistant_with_tools("", vec![call(id, name, args)])
}

pub fn handoff(id: &str, agent: &str) -> Message {
    calls_tool(id, &format!("transfer_to_{agent}"), serde_json::json!({}))
}

/// Email sender that records every send and answers with a fixed outcome.
pub struct RecordingSender {
    outcome: Result<bool, String>,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingSender {
    pub fn new(delivered: bool) -> Self {
        Self {
            outcome: Ok(delivered),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl agentsync_core::tools::EmailSender for RecordingSender {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
    ) -> Result<bool, AgentSyncError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), subject.to_string(), content.to_string()));
        self.outcome.clone().map_err(|m| AgentSyncError::tool("send_email", m))
    }
}
