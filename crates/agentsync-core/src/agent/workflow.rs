use super::{OutputMode, Supervisor, WorkflowEvent};
use crate::conversation::Conversation;
use crate::error::AgentSyncError;
use crate::llm::Message;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A compiled supervisor. Cheap to clone; concurrent invocations share the
/// agent set but never share a conversation.
#[derive(Clone)]
pub struct Workflow {
    supervisor: Arc<Supervisor>,
}

/// Everything a single invocation produced.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub conversation: Conversation,
    pub routing_steps: usize,
    /// Agent names in the order they were delegated to.
    pub delegations: Vec<String>,
}

impl WorkflowRun {
    pub fn output(&self, mode: OutputMode) -> Vec<Message> {
        mode.shape(&self.conversation)
    }
}

impl Workflow {
    pub(crate) fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn output_mode(&self) -> OutputMode {
        self.supervisor.output_mode()
    }

    pub async fn invoke(
        &self,
        initial_messages: &[Message],
    ) -> Result<Vec<Message>, AgentSyncError> {
        self.supervisor.invoke(initial_messages).await
    }

    pub async fn run(&self, initial_messages: &[Message]) -> Result<WorkflowRun, AgentSyncError> {
        self.supervisor.run(initial_messages).await
    }

    pub async fn run_with_events(
        &self,
        initial_messages: &[Message],
        event_tx: &UnboundedSender<WorkflowEvent>,
    ) -> Result<WorkflowRun, AgentSyncError> {
        self.supervisor.run_with_events(initial_messages, event_tx).await
    }
}
