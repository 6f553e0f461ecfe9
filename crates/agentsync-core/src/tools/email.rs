use crate::constants::endpoints;
use crate::error::AgentSyncError;
use crate::tools::traits::{Tool, ToolResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;

/// Outbound mail capability. `Ok(false)` means the provider refused the message.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
    ) -> Result<bool, AgentSyncError>;
}

/// Sends through the Gmail REST API with an OAuth bearer token.
pub struct GmailSender {
    client: reqwest::Client,
    access_token: String,
    from: Option<String>,
    base_url: String,
}

impl GmailSender {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            from: None,
            base_url: endpoints::GMAIL_BASE_URL.to_string(),
        }
    }

    pub fn with_from(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.from = (!address.is_empty()).then_some(address);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// RFC 2822 message, base64url encoded as the `raw` field expects.
    fn encode_raw(&self, recipient: &str, subject: &str, content: &str) -> String {
        let mut raw = String::new();
        if let Some(ref from) = self.from {
            raw.push_str(&format!("From: {from}\r\n"));
        }
        raw.push_str(&format!("To: {recipient}\r\n"));
        raw.push_str(&format!("Subject: {}\r\n", encode_header(subject)));
        raw.push_str("MIME-Version: 1.0\r\n");
        raw.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n");
        raw.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
        raw.push_str(content);
        URL_SAFE.encode(raw)
    }
}

/// Non-ASCII header values need RFC 2047 encoded-word form.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

#[async_trait::async_trait]
impl EmailSender for GmailSender {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
    ) -> Result<bool, AgentSyncError> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.base_url);
        let body = serde_json::json!({ "raw": self.encode_raw(recipient, subject, content) });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(recipient, "email sent");
            Ok(true)
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(recipient, %status, "Gmail rejected message: {}", text);
            Ok(false)
        }
    }
}

/// `send_email`: sends the drafted mail and reports the outcome in plain text.
pub struct SendEmailTool {
    sender: Arc<dyn EmailSender>,
}

impl SendEmailTool {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    pub fn sent_message(recipient: &str, content: &str) -> String {
        format!("{content}\n\n📩 Final email sent to {recipient} successfully.")
    }

    pub fn failed_message(recipient: &str) -> String {
        format!("❌ Failed to send final email to {recipient}.")
    }
}

#[async_trait::async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Sends the mail to a specific recipient. The content is the email generated by the agent. \
         The output is the email content followed by whether sending succeeded or failed."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recipient": {
                    "type": "string",
                    "description": "The recipient's email address"
                },
                "subject": {
                    "type": "string",
                    "description": "The subject of the email"
                },
                "content": {
                    "type": "string",
                    "description": "The body of the email generated by the model"
                }
            },
            "required": ["recipient", "subject", "content"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let recipient = super::str_param(&params, "recipient", self.name())?;
        let subject = super::str_param(&params, "subject", self.name())?;
        let content = super::str_param(&params, "content", self.name())?;

        // header fields go into the raw message verbatim
        for (field, value) in [("recipient", recipient), ("subject", subject)] {
            if value.contains(['\r', '\n']) {
                return Err(AgentSyncError::invalid_args(
                    self.name(),
                    format!("{field} must be a single line"),
                ));
            }
        }

        let text = match self.sender.send(recipient, subject, content).await {
            Ok(true) => Self::sent_message(recipient, content),
            Ok(false) => Self::failed_message(recipient),
            Err(e) => {
                tracing::warn!(recipient, "email send failed: {}", e);
                Self::failed_message(recipient)
            }
        };

        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_round_trips_headers() {
        let sender = GmailSender::new("token").with_from("me@example.com");
        let raw = sender.encode_raw("a@b.com", "Hello", "Body text");
        let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
        assert!(decoded.starts_with("From: me@example.com\r\nTo: a@b.com\r\nSubject: Hello\r\n"));
        assert!(decoded.ends_with("\r\n\r\nBody text"));
    }

    #[test]
    fn empty_from_is_omitted() {
        let sender = GmailSender::new("token").with_from("");
        let raw = sender.encode_raw("a@b.com", "s", "c");
        let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
        assert!(decoded.starts_with("To: a@b.com"));
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        assert_eq!(encode_header("Hello"), "Hello");
        assert!(encode_header("Bewerbung für").starts_with("=?UTF-8?B?"));
    }
}
