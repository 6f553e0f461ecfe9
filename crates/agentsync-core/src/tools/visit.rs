use crate::constants::{limits, names};
use crate::error::AgentSyncError;
use crate::tools::traits::{Tool, ToolResult};
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

struct Cleanup {
    trailing_space: Regex,
    blank_lines: Regex,
}

fn cleanup() -> &'static Cleanup {
    static CLEANUP: OnceLock<Cleanup> = OnceLock::new();
    CLEANUP.get_or_init(|| Cleanup {
        trailing_space: Regex::new(r"[ \t]+\n").expect("static pattern"),
        blank_lines: Regex::new(r"\n{3,}").expect("static pattern"),
    })
}

/// Reduces an HTML page to readable markdown. Headings, links, emphasis,
/// inline code and list items survive; everything else becomes plain text
/// with entities decoded. Runs of three or more newlines collapse to one
/// blank line.
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    render_children(document.root_element(), &mut out);

    let c = cleanup();
    let text = c.trailing_space.replace_all(&out, "\n");
    let text = c.blank_lines.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Visible text of an HTML fragment with entities decoded and whitespace
/// collapsed.
pub(crate) fn html_text(fragment: &str) -> String {
    let fragment = Html::parse_fragment(fragment);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_children(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    match name {
        "script" | "style" | "head" | "noscript" | "template" | "svg" | "iframe" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            let mut title = String::new();
            render_children(el, &mut title);
            block_break(out);
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(title.trim());
            block_break(out);
        }
        "a" => match el.value().attr("href") {
            Some(href) => {
                let mut label = String::new();
                render_children(el, &mut label);
                wrap_inline(out, &label, "[", &format!("]({href})"));
            }
            None => render_children(el, out),
        },
        "strong" | "b" => wrap_children(el, out, "**"),
        "em" | "i" => wrap_children(el, out, "*"),
        "code" => wrap_children(el, out, "`"),
        "br" => out.push('\n'),
        "li" => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("- ");
            let mut item = String::new();
            render_children(el, &mut item);
            out.push_str(item.trim());
            out.push('\n');
        }
        "td" | "th" => {
            render_children(el, out);
            out.push(' ');
        }
        "p" | "div" | "ul" | "ol" | "table" | "tr" | "section" | "article" | "header"
        | "footer" | "blockquote" | "main" | "nav" | "aside" | "pre" | "form" | "figure"
        | "hr" => {
            block_break(out);
            render_children(el, out);
            block_break(out);
        }
        _ => render_children(el, out),
    }
}

fn wrap_children(el: ElementRef<'_>, out: &mut String, marker: &str) {
    let mut inner = String::new();
    render_children(el, &mut inner);
    wrap_inline(out, &inner, marker, marker);
}

/// Wraps trimmed inline text in markers, keeping the surrounding spacing.
fn wrap_inline(out: &mut String, inner: &str, open: &str, close: &str) {
    let trimmed = inner.trim();
    if inner.starts_with(char::is_whitespace) && !at_word_break(out) {
        out.push(' ');
    }
    if !trimmed.is_empty() {
        out.push_str(open);
        out.push_str(trimmed);
        out.push_str(close);
    }
    if trimmed.len() < inner.len() && inner.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn push_text(out: &mut String, text: &str) {
    if text.starts_with(char::is_whitespace) && !at_word_break(out) {
        out.push(' ');
    }
    let mut words = text.split_whitespace();
    if let Some(first) = words.next() {
        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
        if text.ends_with(char::is_whitespace) {
            out.push(' ');
        }
    }
}

/// An empty buffer is not a break: its text may land mid-line once spliced.
fn at_word_break(out: &str) -> bool {
    out.ends_with([' ', '\n'])
}

fn block_break(out: &mut String) {
    if out.is_empty() {
        return;
    }
    while !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// `visit_webpage`: fetches a URL and returns its content as markdown.
/// Fetch failures are reported as text so the model can react to them.
pub struct VisitWebpageTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl VisitWebpageTool {
    pub fn new() -> Result<Self, AgentSyncError> {
        Self::with_timeout(Duration::from_secs(limits::VISIT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AgentSyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(names::USER_AGENT)
            .build()
            .map_err(|e| {
                AgentSyncError::tool("visit_webpage", format!("HTTP client error: {e}"))
            })?;
        Ok(Self {
            client,
            max_chars: limits::VISIT_MAX_CHARS,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client.get(url).send().await?.error_for_status()?.text().await
    }
}

#[async_trait::async_trait]
impl Tool for VisitWebpageTool {
    fn name(&self) -> &str {
        "visit_webpage"
    }

    fn description(&self) -> &str {
        "Visits a webpage and reads its content as a markdown string."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the webpage to visit."
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let url = super::str_param(&params, "url", self.name())?;

        let text = match self.fetch(url).await {
            Ok(html) => truncate_chars(&html_to_markdown(&html), self.max_chars),
            Err(e) if e.is_timeout() => {
                "The request timed out. Please try again later or check the URL.".to_string()
            }
            Err(e) => format!("Error fetching the webpage: {e}"),
        };

        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_common_markup() {
        let html = r#"<html><head><title>x</title></head><body>
            <h2>Open Roles</h2>
            <p>We are <strong>hiring</strong> &amp; growing.</p>
            <ul><li>Rust engineer</li><li><a href="https://jobs.example/2">Apply</a></li></ul>
            <script>var tracking = 1;</script>
        </body></html>"#;
        let md = html_to_markdown(html);
        assert!(md.starts_with("## Open Roles"));
        assert!(md.contains("We are **hiring** & growing."));
        assert!(md.contains("- Rust engineer"));
        assert!(md.contains("- [Apply](https://jobs.example/2)"));
        assert!(!md.contains("tracking"));
        assert!(!md.contains("<"));
    }

    #[test]
    fn collapses_blank_runs() {
        let md = html_to_markdown("<p>one</p>\n\n\n\n<div>  </div>\n\n\n<p>two</p>");
        assert!(!md.contains("\n\n\n"));
        assert_eq!(md, "one\n\ntwo");
    }

    #[test]
    fn decodes_entities_and_single_quoted_links() {
        let html = concat!(
            "<p>It&#8217;s <a href='https://jobs.example/1'>Apply</a>",
            " &mdash; <b>now</b></p>"
        );
        assert_eq!(
            html_to_markdown(html),
            "It\u{2019}s [Apply](https://jobs.example/1) \u{2014} **now**"
        );
    }

    #[test]
    fn keeps_spacing_around_inline_markup() {
        let md = html_to_markdown("<p>Use <code>cargo</code>,<em> then </em>ship<br>done</p>");
        assert_eq!(md, "Use `cargo`, *then* ship\ndone");
    }

    #[test]
    fn fragment_text_is_decoded() {
        let text = html_text("Tom &amp; Jerry&#x27;s <b>Show</b>\n  now");
        assert_eq!(text, "Tom & Jerry's Show now");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let text = "é".repeat(20);
        assert_eq!(truncate_chars(&text, 5).chars().count(), 5);
        assert_eq!(truncate_chars("short", 10_000), "short");
    }
}
