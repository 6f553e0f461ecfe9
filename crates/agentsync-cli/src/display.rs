use agentsync_core::{Message, Role};

fn title(role: Role) -> &'static str {
    match role {
        Role::User => "Human Message",
        Role::Assistant => "Ai Message",
        Role::Tool => "Tool Message",
        Role::System => "System Message",
    }
}

/// One message as a bannered block, e.g.
///
/// ```text
/// ==== Ai Message ====
/// Name: Email_process
///
/// The application email was sent.
/// ```
pub fn format_message(message: &Message) -> String {
    let mut out = format!("==== {} ====\n", title(message.role));
    if let Some(name) = message.author() {
        out.push_str(&format!("Name: {name}\n"));
    }
    out.push('\n');
    out.push_str(&message.content);

    if message.has_tool_calls() {
        if !message.content.is_empty() {
            out.push('\n');
        }
        out.push_str("Tool Calls:");
        for call in message.tool_calls() {
            out.push_str(&format!(
                "\n  {} ({})\n  Args: {}",
                call.name(),
                call.id,
                call.function.arguments
            ));
        }
    }
    out.push('\n');
    out
}

pub fn format_messages(messages: &[Message]) -> String {
    messages.iter().map(format_message).collect::<Vec<_>>().join("\n")
}
