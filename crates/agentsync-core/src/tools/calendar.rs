use crate::constants::{endpoints, limits};
use crate::error::AgentSyncError;
use crate::tools::traits::{Tool, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A new event. Times are `YYYY-MM-DDTHH:MM:SS`, interpreted as UTC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

/// Fields to change on an existing event; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub summary: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRef {
    pub event_id: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub description: String,
    pub location: String,
}

impl CalendarEvent {
    /// Normalizes a Calendar v3 event resource. All-day events only carry `date`.
    pub fn from_api(event: &Value) -> Self {
        let text = |key: &str| {
            event
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let when = |key: &str| {
            event
                .get(key)
                .and_then(|t| t.get("dateTime").or_else(|| t.get("date")))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let summary = text("summary");
        Self {
            id: text("id"),
            summary: if summary.is_empty() { "Untitled Event".to_string() } else { summary },
            start: when("start"),
            end: when("end"),
            description: text("description"),
            location: text("location"),
        }
    }
}

#[async_trait::async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(&self, draft: &EventDraft) -> Result<EventRef, AgentSyncError>;
    async fn list_events(&self, max_results: u64) -> Result<Vec<CalendarEvent>, AgentSyncError>;
    async fn delete_event(&self, event_id: &str) -> Result<(), AgentSyncError>;
    async fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<EventRef, AgentSyncError>;
}

/// Google Calendar v3 over REST, always on the `primary` calendar.
pub struct GoogleCalendar {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendar {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: endpoints::CALENDAR_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn events_url(&self) -> String {
        format!("{}/calendar/v3/calendars/primary/events", self.base_url)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AgentSyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(AgentSyncError::tool(
            "calendar",
            format!("Google Calendar API error ({status}): {text}"),
        ))
    }

    fn event_ref(event: &Value) -> EventRef {
        EventRef {
            event_id: event.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            link: event.get("htmlLink").and_then(|v| v.as_str()).map(str::to_string),
        }
    }
}

/// Request body for a new event.
pub(crate) fn event_body(draft: &EventDraft) -> Value {
    let mut body = serde_json::json!({
        "summary": draft.summary,
        "description": draft.description.clone().unwrap_or_default(),
        "start": { "dateTime": draft.start_time, "timeZone": "UTC" },
        "end": { "dateTime": draft.end_time, "timeZone": "UTC" },
    });
    if let Some(ref location) = draft.location {
        body["location"] = Value::String(location.clone());
    }
    if !draft.attendees.is_empty() {
        body["attendees"] = draft
            .attendees
            .iter()
            .map(|email| serde_json::json!({ "email": email }))
            .collect();
    }
    body
}

/// Applies the provided fields of `update` onto an existing event resource.
pub(crate) fn apply_update(event: &mut Value, update: &EventUpdate) {
    if let Some(ref summary) = update.summary {
        event["summary"] = Value::String(summary.clone());
    }
    if let Some(ref description) = update.description {
        event["description"] = Value::String(description.clone());
    }
    if let Some(ref location) = update.location {
        event["location"] = Value::String(location.clone());
    }
    if let Some(ref start) = update.start_time {
        event["start"]["dateTime"] = Value::String(start.clone());
    }
    if let Some(ref end) = update.end_time {
        event["end"]["dateTime"] = Value::String(end.clone());
    }
}

#[async_trait::async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn create_event(&self, draft: &EventDraft) -> Result<EventRef, AgentSyncError> {
        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&event_body(draft))
            .send()
            .await?;
        let event: Value = Self::check(response).await?.json().await?;
        tracing::info!(summary = %draft.summary, "calendar event created");
        Ok(Self::event_ref(&event))
    }

    async fn list_events(&self, max_results: u64) -> Result<Vec<CalendarEvent>, AgentSyncError> {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", now),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        let events: Vec<CalendarEvent> = body
            .get("items")
            .and_then(|i| i.as_array())
            .map(|items| items.iter().map(CalendarEvent::from_api).collect())
            .unwrap_or_default();
        tracing::info!(count = events.len(), "calendar events listed");
        Ok(events)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), AgentSyncError> {
        let response = self
            .client
            .delete(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!(event_id, "calendar event deleted");
        Ok(())
    }

    async fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<EventRef, AgentSyncError> {
        let response = self
            .client
            .get(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let mut event: Value = Self::check(response).await?.json().await?;
        apply_update(&mut event, update);

        let response = self
            .client
            .put(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .json(&event)
            .send()
            .await?;
        let updated: Value = Self::check(response).await?.json().await?;
        tracing::info!(event_id, "calendar event updated");
        Ok(Self::event_ref(&updated))
    }
}

fn failure(e: AgentSyncError) -> Value {
    tracing::warn!("calendar operation failed: {}", e);
    serde_json::json!({ "success": false, "error": e.to_string() })
}

fn event_ref_payload(event: EventRef) -> Value {
    serde_json::json!({ "success": true, "event_id": event.event_id, "link": event.link })
}

/// The four calendar tools sharing one provider.
pub fn calendar_tools(provider: Arc<dyn CalendarProvider>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ScheduleEventTool::new(provider.clone())),
        Box::new(GetEventsTool::new(provider.clone())),
        Box::new(CancelEventTool::new(provider.clone())),
        Box::new(ModifyEventTool::new(provider)),
    ]
}

pub struct ScheduleEventTool {
    provider: Arc<dyn CalendarProvider>,
}

impl ScheduleEventTool {
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for ScheduleEventTool {
    fn name(&self) -> &str {
        "schedule_event"
    }

    fn description(&self) -> &str {
        "Schedule a new event in Google Calendar"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {"type": "string", "description": "Event title"},
                "start_time": {"type": "string", "description": "Start time (YYYY-MM-DDTHH:MM:SS)"},
                "end_time": {"type": "string", "description": "End time (YYYY-MM-DDTHH:MM:SS)"},
                "description": {"type": "string", "description": "Event description"},
                "location": {"type": "string", "description": "Event location"},
                "attendees": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of email addresses"
                }
            },
            "required": ["summary", "start_time", "end_time"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let draft = EventDraft {
            summary: super::str_param(&params, "summary", self.name())?.to_string(),
            start_time: super::str_param(&params, "start_time", self.name())?.to_string(),
            end_time: super::str_param(&params, "end_time", self.name())?.to_string(),
            description: super::opt_str_param(&params, "description"),
            location: super::opt_str_param(&params, "location"),
            attendees: params
                .get("attendees")
                .and_then(|a| a.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
        };

        Ok(match self.provider.create_event(&draft).await {
            Ok(event) => event_ref_payload(event),
            Err(e) => failure(e),
        })
    }
}

pub struct GetEventsTool {
    provider: Arc<dyn CalendarProvider>,
}

impl GetEventsTool {
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for GetEventsTool {
    fn name(&self) -> &str {
        "get_events"
    }

    fn description(&self) -> &str {
        "List upcoming events in your Google Calendar"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of events to return"
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let max_results = params
            .get("max_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(limits::CALENDAR_MAX_RESULTS);

        Ok(match self.provider.list_events(max_results).await {
            Ok(events) => serde_json::json!({ "success": true, "events": events }),
            Err(e) => failure(e),
        })
    }
}

pub struct CancelEventTool {
    provider: Arc<dyn CalendarProvider>,
}

impl CancelEventTool {
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for CancelEventTool {
    fn name(&self) -> &str {
        "cancel_event"
    }

    fn description(&self) -> &str {
        "Cancel (delete) an event from your calendar"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string", "description": "ID of the event to delete"}
            },
            "required": ["event_id"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let event_id = super::str_param(&params, "event_id", self.name())?;

        Ok(match self.provider.delete_event(event_id).await {
            Ok(()) => serde_json::json!({ "success": true }),
            Err(e) => failure(e),
        })
    }
}

pub struct ModifyEventTool {
    provider: Arc<dyn CalendarProvider>,
}

impl ModifyEventTool {
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Tool for ModifyEventTool {
    fn name(&self) -> &str {
        "modify_event"
    }

    fn description(&self) -> &str {
        "Modify an existing calendar event"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string", "description": "ID of the event to update"},
                "summary": {"type": "string", "description": "New event title"},
                "start_time": {"type": "string", "description": "New start time"},
                "end_time": {"type": "string", "description": "New end time"},
                "description": {"type": "string", "description": "New description"},
                "location": {"type": "string", "description": "New location"}
            },
            "required": ["event_id"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let event_id = super::str_param(&params, "event_id", self.name())?;
        let update = EventUpdate {
            summary: super::opt_str_param(&params, "summary"),
            start_time: super::opt_str_param(&params, "start_time"),
            end_time: super::opt_str_param(&params, "end_time"),
            description: super::opt_str_param(&params, "description"),
            location: super::opt_str_param(&params, "location"),
        };

        Ok(match self.provider.update_event(event_id, &update).await {
            Ok(event) => event_ref_payload(event),
            Err(e) => failure(e),
        })
    }
}
