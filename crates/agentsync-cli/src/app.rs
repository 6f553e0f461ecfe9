use agentsync_core::config::mask;
use agentsync_core::constants::names;
use agentsync_core::prompts::{job_application_instruction, EMAIL_CREATOR_PROMPT, SUPERVISOR_PROMPT};
use agentsync_core::tools::{EmailSender, GmailSender, SendEmailTool};
use agentsync_core::{
    Agent, AgentSyncError, LlmClient, Message, OutputMode, Settings, Supervisor, ToolRegistry,
    ValidationMode, Workflow, WorkflowEvent,
};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::display::format_messages;

/// Options for `agentsync run`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub recipient: Option<String>,
    pub instruction: Option<String>,
    pub full_trace: bool,
    pub lenient: bool,
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, AgentSyncError> {
    match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

/// The `--recipient` flag wins; otherwise the configured Gmail address.
pub fn resolve_recipient(
    flag: Option<String>,
    settings: &Settings,
) -> Result<String, AgentSyncError> {
    flag.filter(|r| !r.trim().is_empty())
        .or_else(|| Some(settings.google.gmail_user_email.clone()).filter(|r| !r.is_empty()))
        .ok_or_else(|| {
            AgentSyncError::Config("no recipient: pass --recipient or set GMAIL_USER_EMAIL".into())
        })
}

/// The email workflow: one `Email_process` agent holding `send_email`,
/// routed by a supervisor.
pub fn build_workflow(
    settings: &Settings,
    llm: Arc<dyn LlmClient>,
    sender: Arc<dyn EmailSender>,
    output_mode: OutputMode,
) -> Result<Workflow, AgentSyncError> {
    let tools = ToolRegistry::new().with_tool(Box::new(SendEmailTool::new(sender)))?;

    let email_agent = Agent::new(names::EMAIL_AGENT, llm.clone())
        .with_prompt(EMAIL_CREATOR_PROMPT)
        .with_tools(tools)
        .with_max_iterations(settings.limits.agent_max_steps)
        .with_step_timeout(settings.step_timeout());

    Supervisor::new(llm)
        .with_prompt(SUPERVISOR_PROMPT)
        .with_output_mode(output_mode)
        .with_max_steps(settings.limits.supervisor_max_steps)
        .with_step_timeout(settings.step_timeout())
        .with_agent(email_agent)?
        .compile()
}

pub async fn run(settings: &Settings, options: RunOptions) -> Result<()> {
    let mode = if options.lenient {
        ValidationMode::Lenient
    } else {
        ValidationMode::Strict
    };
    for warning in settings.validate(mode)? {
        eprintln!("warning: {warning}");
    }

    let recipient = resolve_recipient(options.recipient, settings)?;
    let instruction = options
        .instruction
        .unwrap_or_else(|| job_application_instruction(&recipient));

    let llm = settings.build_llm_client()?;
    let sender = GmailSender::new(settings.google_access_token()?)
        .with_from(&settings.google.gmail_user_email);
    let output_mode = if options.full_trace {
        OutputMode::FullTrace
    } else {
        OutputMode::LastMessage
    };
    let workflow = build_workflow(settings, llm, Arc::new(sender), output_mode)?;
    tracing::info!(%recipient, model = %settings.llm.model, "starting email workflow");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let handle = tokio::spawn({
        let workflow = workflow.clone();
        let initial = vec![Message::user(instruction)];
        async move { workflow.run_with_events(&initial, &event_tx).await }
    });

    while let Some(event) = event_rx.recv().await {
        match event {
            WorkflowEvent::Delegated { agent } => eprintln!("[-> {agent}]"),
            WorkflowEvent::ToolStart { name, .. } => eprintln!("[tool: {name}]"),
            WorkflowEvent::ToolResult { name, success, .. } => {
                let icon = if success { "ok" } else { "err" };
                eprintln!("[{name}: {icon}]");
            }
            _ => {}
        }
    }

    let run = handle.await??;
    print!("{}", format_messages(&run.output(workflow.output_mode())));
    Ok(())
}

/// What `agentsync verify-config` prints. Secrets, and secret-looking fields of
/// the credential files, are masked.
pub fn verify_report(settings: &Settings, config_path: &Path) -> String {
    let secret = |value: Option<String>| mask(&value.unwrap_or_default());
    let mut lines = vec![
        format!("Config file: {}", config_path.display()),
        format!("Model: {}", settings.llm.model),
        format!("{}: {}", settings.llm.api_key_env, secret(settings.api_key())),
        format!("{}: {}", settings.google.api_key_env, secret(settings.google_api_key())),
        format!("GOOGLE_CREDENTIALS_FILE: {}", settings.google.credentials_file.display()),
        json_file(&settings.google.credentials_file),
        format!("CLIENT_SECRET_FILE: {}", settings.google.client_secret_file.display()),
        json_file(&settings.google.client_secret_file),
        format!("SHEET_ID: {}", settings.google.sheet_id),
        format!("GMAIL_USER_EMAIL: {}", settings.google.gmail_user_email),
        format!("{}: {}", settings.search.serpapi_key_env, secret(settings.serpapi_key())),
        format!("{}: {}", settings.search.hunter_api_key_env, secret(settings.hunter_api_key())),
        format!("CHECK_INTERVAL: {}", settings.limits.check_interval_secs),
    ];

    match settings.validate(ValidationMode::Lenient) {
        Ok(warnings) if warnings.is_empty() => lines.push("Configuration OK".into()),
        Ok(warnings) => lines.extend(warnings.into_iter().map(|w| format!("warning: {w}"))),
        Err(e) => lines.push(format!("error: {e}")),
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn json_file(path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return "  (not found)".into();
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(mut json) => {
            redact(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_default()
        }
        Err(e) => format!("  (invalid JSON: {e})"),
    }
}

const SECRET_KEYS: &[&str] = &[
    "token",
    "access_token",
    "refresh_token",
    "client_secret",
    "private_key",
    "private_key_id",
];

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match v {
                    Value::String(s) if SECRET_KEYS.contains(&key.as_str()) => *s = mask(s),
                    other => redact(other),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}
