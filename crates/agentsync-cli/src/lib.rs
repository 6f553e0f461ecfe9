// Library interface for agentsync-cli so integration tests can reach the
// workflow wiring and the output formatting. main.rs declares the same files.

#[path = "app.rs"]
pub mod app;

#[path = "display.rs"]
pub mod display;

pub use app::{build_workflow, resolve_recipient, verify_report, RunOptions};
pub use display::{format_message, format_messages};
