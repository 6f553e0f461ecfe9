mod common;

use agentsync_core::tools::SendEmailTool;
use agentsync_core::{
    Agent, AgentSyncError, Message, OutputMode, Role, Supervisor, ToolRegistry, WorkflowEvent,
};
use common::{calls_tool, handoff, RecordingSender, RepeatLlm, ScriptedLlm};
use serde_json::json;
use std::sync::Arc;

const RECIPIENT: &str = "hr@example.com";
const BODY: &str = "Dear Hiring Manager,\n\nI would like to apply.\n\nBest regards";

fn email_agent(sender: Arc<RecordingSender>) -> (Agent, Arc<ScriptedLlm>) {
    let llm = Arc::new(ScriptedLlm::new(vec![
        calls_tool(
            "c1",
            "send_email",
            json!({"recipient": RECIPIENT, "subject": "Application", "content": BODY}),
        ),
        Message::assistant("The application email was sent."),
    ]));
    let tools = ToolRegistry::new()
        .with_tool(Box::new(SendEmailTool::new(sender)))
        .unwrap();
    let agent = Agent::new("Email_process", llm.clone()).with_tools(tools);
    (agent, llm)
}

fn email_supervisor(
    sender: Arc<RecordingSender>,
) -> (Supervisor, Arc<ScriptedLlm>, Arc<ScriptedLlm>) {
    let routing = Arc::new(ScriptedLlm::new(vec![
        handoff("h1", "Email_process"),
        Message::assistant("Your application has been emailed."),
    ]));
    let (agent, agent_llm) = email_agent(sender);
    let supervisor = Supervisor::new(routing.clone()).with_agent(agent).unwrap();
    (supervisor, routing, agent_llm)
}

fn request() -> Vec<Message> {
    vec![Message::user(format!("Send a job application to {RECIPIENT}"))]
}

#[tokio::test]
async fn single_agent_email_flow() {
    let sender = Arc::new(RecordingSender::new(true));
    let (supervisor, routing, agent_llm) = email_supervisor(sender.clone());
    let workflow = supervisor.compile().unwrap();

    let run = workflow.run(&request()).await.unwrap();

    assert_eq!(run.delegations, vec!["Email_process"]);
    assert_eq!(run.routing_steps, 2);
    assert_eq!(routing.call_count(), 2);
    assert_eq!(agent_llm.call_count(), 2);

    let messages = run.conversation.messages();
    assert_eq!(messages.len(), 7);
    assert_eq!(messages[1].author(), Some("supervisor"));
    assert_eq!(messages[2].content, "Successfully transferred to Email_process");
    assert_eq!(messages[2].author(), Some("transfer_to_Email_process"));
    assert_eq!(
        messages[4].content,
        format!("{BODY}\n\n📩 Final email sent to {RECIPIENT} successfully.")
    );
    assert_eq!(messages[6].content, "Your application has been emailed.");
    assert!(run.conversation.tool_calls_paired());

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, RECIPIENT);
    assert_eq!(sent[0].1, "Application");
}

#[tokio::test]
async fn failed_send_is_reported_in_the_trace() {
    let sender = Arc::new(RecordingSender::new(false));
    let (supervisor, _, _) = email_supervisor(sender);

    let run = supervisor.run(&request()).await.unwrap();
    assert_eq!(
        run.conversation.messages()[4].content,
        format!("❌ Failed to send final email to {RECIPIENT}.")
    );
}

#[tokio::test]
async fn output_mode_only_shapes_the_result() {
    let (supervisor, _, _) = email_supervisor(Arc::new(RecordingSender::new(true)));
    let run = supervisor.run(&request()).await.unwrap();

    let full = run.output(OutputMode::FullTrace);
    let last = run.output(OutputMode::LastMessage);
    assert_eq!(last.len(), 1);
    assert_eq!(full.len(), 7);
    assert_eq!(&last[0], full.last().unwrap());
}

#[tokio::test]
async fn invoke_uses_the_configured_output_mode() {
    let (supervisor, _, _) = email_supervisor(Arc::new(RecordingSender::new(true)));
    let workflow = supervisor.with_output_mode(OutputMode::FullTrace).compile().unwrap();
    assert_eq!(workflow.output_mode(), OutputMode::FullTrace);

    let out = workflow.invoke(&request()).await.unwrap();
    assert_eq!(out.len(), 7);
    assert_eq!(out[0].role, Role::User);

    let (supervisor, _, _) = email_supervisor(Arc::new(RecordingSender::new(true)));
    let out = supervisor.compile().unwrap().invoke(&request()).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].content, "Your application has been emailed.");
}

#[tokio::test]
async fn caller_messages_are_never_mutated() {
    let (supervisor, _, _) = email_supervisor(Arc::new(RecordingSender::new(true)));
    let initial = request();
    let before = initial.clone();

    supervisor.run(&initial).await.unwrap();
    assert_eq!(initial, before);
}

#[tokio::test]
async fn routing_model_sees_handoff_tools_and_agent_sees_history() {
    let routing = Arc::new(ScriptedLlm::new(vec![
        handoff("h1", "Researcher"),
        Message::assistant("done"),
    ]));
    let researcher_llm = Arc::new(ScriptedLlm::new(vec![Message::assistant("found it")]));
    let writer_llm = Arc::new(ScriptedLlm::new(vec![]));

    let supervisor = Supervisor::new(routing.clone())
        .with_agent(Agent::new("Researcher", researcher_llm.clone()))
        .unwrap()
        .with_agent(Agent::new("Writer", writer_llm.clone()))
        .unwrap();

    let run = supervisor.run(&request()).await.unwrap();

    assert_eq!(routing.tools_seen(0), vec!["transfer_to_Researcher", "transfer_to_Writer"]);
    assert_eq!(writer_llm.call_count(), 0);

    // system prompt, user request, hand-off request, hand-off result
    let seen = researcher_llm.messages_seen(0);
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[3].content, "Successfully transferred to Researcher");

    // the second routing step sees the researcher's answer
    let seen = routing.messages_seen(1);
    assert_eq!(seen.last().unwrap().content, "found it");
    assert_eq!(run.delegations, vec!["Researcher"]);
}

#[tokio::test]
async fn agents_run_in_the_order_they_are_routed() {
    let routing = Arc::new(ScriptedLlm::new(vec![
        handoff("h1", "A"),
        handoff("h2", "B"),
        handoff("h3", "A"),
        Message::assistant("all done"),
    ]));
    let supervisor = Supervisor::new(routing)
        .with_agent(Agent::new("A", Arc::new(RepeatLlm::new(Message::assistant("from A")))))
        .unwrap()
        .with_agent(Agent::new("B", Arc::new(RepeatLlm::new(Message::assistant("from B")))))
        .unwrap();

    let run = supervisor.run(&request()).await.unwrap();
    assert_eq!(run.delegations, vec!["A", "B", "A"]);
    assert_eq!(run.routing_steps, 4);
    assert!(run.conversation.tool_calls_paired());
}

#[tokio::test]
async fn routing_limit_ends_the_run_once_an_agent_has_finished() {
    for limit in 1..=4 {
        let routing = Arc::new(RepeatLlm::new(handoff("h", "A")));
        let agent_llm = Arc::new(RepeatLlm::new(Message::assistant("again")));
        let supervisor = Supervisor::new(routing.clone())
            .with_max_steps(limit)
            .with_agent(Agent::new("A", agent_llm))
            .unwrap();

        let run = supervisor.run(&request()).await.unwrap();
        assert_eq!(run.routing_steps, limit);
        assert_eq!(run.delegations.len(), limit);
        assert_eq!(routing.call_count(), limit);
    }
}

#[tokio::test]
async fn routing_limit_is_an_error_when_no_agent_finished() {
    for limit in 1..=3 {
        let routing = Arc::new(RepeatLlm::new(handoff("h", "A")));
        let agent_llm = Arc::new(RepeatLlm::new(calls_tool("c", "missing", json!({}))));
        let supervisor = Supervisor::new(routing.clone())
            .with_max_steps(limit)
            .with_agent(Agent::new("A", agent_llm))
            .unwrap();

        let err = supervisor.run(&request()).await.unwrap_err();
        assert!(matches!(err, AgentSyncError::SupervisorStepLimitExceeded(n) if n == limit));
        assert_eq!(routing.call_count(), limit);
    }
}

#[tokio::test]
async fn empty_done_reply_adds_nothing() {
    let routing = Arc::new(ScriptedLlm::new(vec![Message::assistant("")]));
    let supervisor = Supervisor::new(routing)
        .with_agent(Agent::new("A", Arc::new(RepeatLlm::new(Message::assistant("x")))))
        .unwrap();

    let run = supervisor.run(&request()).await.unwrap();
    assert_eq!(run.conversation.messages(), request().as_slice());
    assert!(run.delegations.is_empty());
}

#[tokio::test]
async fn unknown_route_is_an_error() {
    let routing = Arc::new(ScriptedLlm::new(vec![handoff("h1", "Ghost")]));
    let supervisor = Supervisor::new(routing)
        .with_agent(Agent::new("A", Arc::new(RepeatLlm::new(Message::assistant("x")))))
        .unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let err = supervisor.run_with_events(&request(), &tx).await.unwrap_err();
    assert!(matches!(err, AgentSyncError::UnknownAgent(ref a) if a == "Ghost"));

    let mut saw_error = false;
    while let Ok(event) = rx.try_recv() {
        saw_error |= matches!(event, WorkflowEvent::Error(_));
    }
    assert!(saw_error);
}

#[tokio::test]
async fn two_handoffs_in_one_step_are_ambiguous() {
    let routing = Arc::new(ScriptedLlm::new(vec![Message::assistant_with_tools(
        "",
        vec![
            common::call("h1", "transfer_to_A", json!({})),
            common::call("h2", "transfer_to_B", json!({})),
        ],
    )]));
    let supervisor = Supervisor::new(routing)
        .with_agent(Agent::new("A", Arc::new(RepeatLlm::new(Message::assistant("x")))))
        .unwrap()
        .with_agent(Agent::new("B", Arc::new(RepeatLlm::new(Message::assistant("y")))))
        .unwrap();

    let err = supervisor.run(&request()).await.unwrap_err();
    assert!(matches!(err, AgentSyncError::AmbiguousRoute(2)));
}

#[test]
fn compile_requires_an_agent() {
    let supervisor = Supervisor::new(Arc::new(RepeatLlm::new(Message::assistant(""))));
    assert!(matches!(supervisor.compile(), Err(AgentSyncError::EmptyAgentSet)));
}

#[test]
fn agent_names_are_unique() {
    let llm = Arc::new(RepeatLlm::new(Message::assistant("")));
    let mut supervisor = Supervisor::new(llm.clone());
    supervisor.add_agent(Agent::new("A", llm.clone())).unwrap();

    let err = supervisor.add_agent(Agent::new("A", llm)).unwrap_err();
    assert!(matches!(err, AgentSyncError::DuplicateAgent(ref a) if a == "A"));
    assert_eq!(supervisor.agent_names(), vec!["A"]);
}

#[tokio::test]
async fn events_follow_the_run() {
    let (supervisor, _, _) = email_supervisor(Arc::new(RecordingSender::new(true)));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    supervisor.run_with_events(&request(), &tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(events.first(), Some(&WorkflowEvent::Routing { step: 1 }));
    assert!(events.contains(&WorkflowEvent::Delegated { agent: "Email_process".into() }));
    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::ToolResult { name, success: true, .. } if name == "send_email"
    )));
    assert_eq!(events.last(), Some(&WorkflowEvent::Done { routing_steps: 2 }));
}
