//! The supervisor routes a conversation between its agents.
//!
//! Each routing step asks the routing model which agent should act next. The
//! model answers by calling one `transfer_to_<agent>` hand-off tool, or by
//! replying without a tool call when the task is finished:
//!
//! ```text
//! Routing ──DelegateTo(agent)──▶ Delegating ──agent run complete──▶ Routing
//!    │
//!    └──────────Done──────────▶ Done
//! ```
//!
//! Routing and delegation are strictly sequential: every agent sees the
//! conversation produced by the turn before it.

use super::{with_timeout, Agent, Workflow, WorkflowEvent, WorkflowRun};
use crate::constants::{limits, names};
use crate::conversation::Conversation;
use crate::error::AgentSyncError;
use crate::llm::{LlmClient, Message};
use crate::prompts;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

/// What `invoke` hands back. Presentation only; routing is unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Only the final message.
    #[default]
    LastMessage,
    /// The whole accumulated conversation.
    FullTrace,
}

impl OutputMode {
    pub fn shape(&self, conversation: &Conversation) -> Vec<Message> {
        match self {
            OutputMode::LastMessage => conversation.last().cloned().into_iter().collect(),
            OutputMode::FullTrace => conversation.messages().to_vec(),
        }
    }
}

impl FromStr for OutputMode {
    type Err = AgentSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_message" => Ok(OutputMode::LastMessage),
            "full_trace" => Ok(OutputMode::FullTrace),
            other => Err(AgentSyncError::Config(format!("unknown output mode '{other}'"))),
        }
    }
}

/// The routing model's choice for one step, checked against the agent set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Done,
    DelegateTo(String),
}

impl RouteDecision {
    /// No hand-off call means done; exactly one names the next agent. Anything
    /// else is rejected rather than guessed at.
    pub fn from_message(message: &Message, agents: &[&str]) -> Result<Self, AgentSyncError> {
        let calls = message.tool_calls();
        match calls {
            [] => Ok(RouteDecision::Done),
            [call] => {
                let requested = call.name();
                requested
                    .strip_prefix(names::HANDOFF_PREFIX)
                    .filter(|agent| agents.contains(agent))
                    .map(|agent| RouteDecision::DelegateTo(agent.to_string()))
                    .ok_or_else(|| {
                        let agent = requested
                            .strip_prefix(names::HANDOFF_PREFIX)
                            .unwrap_or(requested);
                        AgentSyncError::UnknownAgent(agent.to_string())
                    })
            }
            many => Err(AgentSyncError::AmbiguousRoute(many.len())),
        }
    }
}

pub fn handoff_tool_name(agent: &str) -> String {
    format!("{}{}", names::HANDOFF_PREFIX, agent)
}

enum State {
    Routing,
    Delegating(String),
    Done,
}

pub struct Supervisor {
    name: String,
    agents: Vec<Agent>,
    prompt: Option<String>,
    llm: Arc<dyn LlmClient>,
    output_mode: OutputMode,
    max_steps: usize,
    step_timeout: Option<Duration>,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            name: names::SUPERVISOR.to_string(),
            agents: Vec::new(),
            prompt: None,
            llm,
            output_mode: OutputMode::default(),
            max_steps: limits::SUPERVISOR_MAX_STEPS,
            step_timeout: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Upper bound on routing steps, the final `Done` decision included.
    /// Reaching it ends the run once some agent has finished cleanly and is a
    /// `SupervisorStepLimitExceeded` error otherwise.
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_agent(mut self, agent: Agent) -> Result<Self, AgentSyncError> {
        self.add_agent(agent)?;
        Ok(self)
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), AgentSyncError> {
        if self.agent(agent.name()).is_some() {
            return Err(AgentSyncError::DuplicateAgent(agent.name().to_string()));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn prompt(&self) -> Cow<'_, str> {
        match self.prompt {
            Some(ref prompt) => Cow::Borrowed(prompt),
            None => Cow::Owned(prompts::default_supervisor_prompt(&self.agent_names())),
        }
    }

    pub fn handoff_tools(&self) -> Vec<ToolDefinition> {
        self.agents
            .iter()
            .map(|agent| ToolDefinition {
                name: handoff_tool_name(agent.name()),
                description: format!("Hand the task over to the agent '{}'.", agent.name()),
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            })
            .collect()
    }

    /// Freeze the supervisor into a runnable workflow.
    pub fn compile(self) -> Result<Workflow, AgentSyncError> {
        if self.agents.is_empty() {
            return Err(AgentSyncError::EmptyAgentSet);
        }
        Ok(Workflow::new(Arc::new(self)))
    }

    /// Runs to completion and shapes the result by the configured output mode.
    pub async fn invoke(
        &self,
        initial_messages: &[Message],
    ) -> Result<Vec<Message>, AgentSyncError> {
        let run = self.run(initial_messages).await?;
        Ok(self.output_mode.shape(&run.conversation))
    }

    pub async fn run(&self, initial_messages: &[Message]) -> Result<WorkflowRun, AgentSyncError> {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.run_with_events(initial_messages, &tx).await
    }

    pub async fn run_with_events(
        &self,
        initial_messages: &[Message],
        event_tx: &UnboundedSender<WorkflowEvent>,
    ) -> Result<WorkflowRun, AgentSyncError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("workflow", %run_id, supervisor = %self.name);

        let result = self.drive(initial_messages, event_tx).instrument(span).await;
        if let Err(ref e) = result {
            let _ = event_tx.send(WorkflowEvent::Error(e.to_string()));
        }
        result
    }

    async fn drive(
        &self,
        initial_messages: &[Message],
        event_tx: &UnboundedSender<WorkflowEvent>,
    ) -> Result<WorkflowRun, AgentSyncError> {
        let mut conversation = Conversation::from_messages(initial_messages);
        let mut routing_steps = 0;
        let mut delegations = Vec::new();
        let mut completed = false;
        let mut state = State::Routing;

        loop {
            state = match state {
                State::Routing => {
                    // out of routing steps: done if some agent finished cleanly, else fail
                    if routing_steps >= self.max_steps {
                        if !completed {
                            return Err(AgentSyncError::SupervisorStepLimitExceeded(
                                self.max_steps,
                            ));
                        }
                        tracing::warn!(
                            limit = self.max_steps,
                            "routing step limit reached, ending with completed work"
                        );
                        break;
                    }
                    routing_steps += 1;
                    let _ = event_tx.send(WorkflowEvent::Routing { step: routing_steps });

                    let (reply, decision) = self.route(&conversation).await?;
                    tracing::info!(step = routing_steps, ?decision, "routing decision");

                    match decision {
                        RouteDecision::Done => {
                            if !reply.content.trim().is_empty() {
                                conversation.push(reply);
                            }
                            State::Done
                        }
                        RouteDecision::DelegateTo(agent) => {
                            let call = reply.tool_calls()[0].clone();
                            conversation.push(reply);
                            let confirmation = format!("Successfully transferred to {agent}");
                            conversation.push(
                                Message::tool_result(&call.id, confirmation)
                                    .with_author(call.name()),
                            );
                            State::Delegating(agent)
                        }
                    }
                }
                State::Delegating(name) => {
                    let agent = self
                        .agent(&name)
                        .ok_or_else(|| AgentSyncError::UnknownAgent(name.clone()))?;
                    let _ = event_tx.send(WorkflowEvent::Delegated { agent: name.clone() });

                    let run = agent.run_with_events(&conversation, event_tx).await?;
                    tracing::info!(
                        agent = %name,
                        iterations = run.iterations,
                        failed = run.failed,
                        "delegation complete"
                    );

                    completed |= !run.failed;
                    conversation.extend(run.messages);
                    debug_assert!(conversation.tool_calls_paired());
                    delegations.push(name);
                    State::Routing
                }
                State::Done => break,
            };
        }

        let _ = event_tx.send(WorkflowEvent::Done { routing_steps });
        Ok(WorkflowRun {
            conversation,
            routing_steps,
            delegations,
        })
    }

    async fn route(
        &self,
        conversation: &Conversation,
    ) -> Result<(Message, RouteDecision), AgentSyncError> {
        let messages = conversation.with_system_prompt(&self.prompt());
        let tools = self.handoff_tools();

        let response = with_timeout(
            self.step_timeout,
            || format!("routing call for {}", self.name),
            self.llm.chat(&messages, &tools),
        )
        .await?;

        let reply = response.message.with_author(&self.name);
        let decision = RouteDecision::from_message(&reply, &self.agent_names())?;
        Ok((reply, decision))
    }
}
