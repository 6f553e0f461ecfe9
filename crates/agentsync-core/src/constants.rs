/// AgentSync centralized constants.
/// Limits, endpoints and well-known names live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
    pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
    pub const CALENDAR_BASE_URL: &str = "https://www.googleapis.com";
    pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";
    pub const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";
}

// ─── Limits ───────────────────────────────────────────────────────────────────

pub mod limits {
    pub const AGENT_MAX_STEPS: usize = 15;
    pub const SUPERVISOR_MAX_STEPS: usize = 10;
    pub const STEP_TIMEOUT_SECS: u64 = 120;
    pub const CHECK_INTERVAL_SECS: u64 = 60;

    /// Visited pages are cut to this many characters.
    pub const VISIT_MAX_CHARS: usize = 10_000;
    pub const VISIT_TIMEOUT_SECS: u64 = 20;
    pub const SEARCH_TIMEOUT_SECS: u64 = 15;

    pub const SERPAPI_MAX_RESULTS: usize = 5;
    pub const DUCKDUCKGO_MAX_RESULTS: usize = 10;
    pub const CALENDAR_MAX_RESULTS: u64 = 10;

    /// Tool result summaries in events are cut to this length.
    pub const SUMMARY_CHARS: usize = 200;
}

// ─── Names ────────────────────────────────────────────────────────────────────

pub mod names {
    pub const SUPERVISOR: &str = "supervisor";
    pub const EMAIL_AGENT: &str = "Email_process";
    /// Hand-off tools exposed to the routing model are `transfer_to_<agent>`.
    pub const HANDOFF_PREFIX: &str = "transfer_to_";
    pub const USER_AGENT: &str = "AgentSync/0.1";
}

// ─── Config ───────────────────────────────────────────────────────────────────

pub mod config {
    pub const CONFIG_DIR: &str = "agentsync";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const CRED_DIR: &str = "cred_files";
    pub const GOOGLE_CREDENTIALS_FILE: &str = "google_service_cred.json";
    pub const CLIENT_SECRET_FILE: &str = "client_secret.json";
}
