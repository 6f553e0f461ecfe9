mod calendar;
mod email;
mod schema;
mod traits;
mod visit;
mod web_search;

pub use calendar::{
    calendar_tools, CalendarEvent, CalendarProvider, CancelEventTool, EventDraft, EventRef,
    EventUpdate, GetEventsTool, GoogleCalendar, ModifyEventTool, ScheduleEventTool,
};
pub use email::{EmailSender, GmailSender, SendEmailTool};
pub use schema::validate_arguments;
pub use traits::*;
pub use visit::{html_to_markdown, VisitWebpageTool};
pub use web_search::{
    format_results, DuckDuckGoSearch, SearchHit, SearchProvider, SerpApiSearch, WebSearchTool,
};

use crate::error::AgentSyncError;
use serde_json::Value;

pub(crate) fn str_param<'a>(
    params: &'a Value,
    key: &str,
    tool: &str,
) -> Result<&'a str, AgentSyncError> {
    params.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
        AgentSyncError::invalid_args(tool, format!("missing required parameter: {key}"))
    })
}

pub(crate) fn opt_str_param(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
