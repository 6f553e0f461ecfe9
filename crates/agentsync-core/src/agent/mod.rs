mod core;
mod events;
pub mod supervisor;
mod workflow;

pub use self::core::{Agent, AgentRun, AgentTurn, ToolExecution};
pub use events::WorkflowEvent;
pub use supervisor::{OutputMode, RouteDecision, Supervisor};
pub use workflow::{Workflow, WorkflowRun};

use crate::error::AgentSyncError;
use std::future::Future;
use std::time::Duration;

/// Runs `fut` under an optional deadline; expiry becomes `StepTimeout`.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    what: impl FnOnce() -> String,
    fut: F,
) -> Result<T, AgentSyncError>
where
    F: Future<Output = Result<T, AgentSyncError>>,
{
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AgentSyncError::StepTimeout {
                what: what(),
                secs: limit.as_secs(),
            })?,
    }
}
