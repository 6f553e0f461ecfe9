use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{config as paths, endpoints, limits, models};
use crate::error::AgentSyncError;
use crate::llm::{LlmClient, OpenAIClient};

/// Process-wide settings. Loaded once at startup, validated, then only read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub google: GoogleSettings,
    pub search: SearchSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub api_key_env: String,
    pub credentials_file: PathBuf,
    /// OAuth authorized-user file holding the access token for Gmail and Calendar.
    pub client_secret_file: PathBuf,
    pub sheet_id: String,
    pub gmail_user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub serpapi_key_env: String,
    pub hunter_api_key_env: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub agent_max_steps: usize,
    pub supervisor_max_steps: usize,
    /// 0 disables the per-step timeout.
    pub step_timeout_secs: u64,
    pub check_interval_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: models::DEFAULT_OPENAI_MODEL.to_string(),
            api_key_env: models::DEFAULT_API_KEY_ENV.to_string(),
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
        }
    }
}

impl Default for GoogleSettings {
    fn default() -> Self {
        let cred_dir = PathBuf::from(paths::CRED_DIR);
        Self {
            api_key_env: "GOOGLE_API_KEY".to_string(),
            credentials_file: cred_dir.join(paths::GOOGLE_CREDENTIALS_FILE),
            client_secret_file: cred_dir.join(paths::CLIENT_SECRET_FILE),
            sheet_id: String::new(),
            gmail_user_email: String::new(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            serpapi_key_env: "SERPAPI_KEY".to_string(),
            hunter_api_key_env: "HUNTER_API_KEY".to_string(),
            max_results: limits::SERPAPI_MAX_RESULTS,
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            agent_max_steps: limits::AGENT_MAX_STEPS,
            supervisor_max_steps: limits::SUPERVISOR_MAX_STEPS,
            step_timeout_secs: limits::STEP_TIMEOUT_SECS,
            check_interval_secs: limits::CHECK_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Any missing required value is an error.
    Strict,
    /// Missing values are logged and returned as warnings.
    Lenient,
}

/// One gap found by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub key: &'static str,
    pub message: String,
    pub required: bool,
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Loads `.env`, the default config file if present, then environment overrides.
    pub fn load() -> Result<Self, AgentSyncError> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("no .env file found, using process environment");
        }
        let config_path = Self::config_path();
        let mut settings = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            Self::default()
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Like [`Settings::load`] but the file at `path` must exist.
    pub fn load_from(path: &Path) -> Result<Self, AgentSyncError> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("no .env file found, using process environment");
        }
        let mut settings = Self::read_file(path)?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self, AgentSyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentSyncError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AgentSyncError> {
        toml::from_str(content).map_err(|e| AgentSyncError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), AgentSyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AgentSyncError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables that override file values.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AgentSyncError> {
        if let Some(v) = lookup("SHEET_ID") {
            self.google.sheet_id = v;
        }
        if let Some(v) = lookup("GMAIL_USER_EMAIL") {
            self.google.gmail_user_email = v;
        }
        if let Some(v) = lookup("GOOGLE_CREDENTIALS_FILE") {
            self.google.credentials_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLIENT_SECRET_FILE") {
            self.google.client_secret_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("CHECK_INTERVAL") {
            self.limits.check_interval_secs = v.trim().parse().map_err(|_| {
                AgentSyncError::Config(format!(
                    "CHECK_INTERVAL must be a whole number of seconds, got '{v}'"
                ))
            })?;
        }
        Ok(())
    }

    fn secret(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// The model API key, read from the variable named in `llm.api_key_env`.
    pub fn api_key(&self) -> Option<String> {
        Self::secret(&self.llm.api_key_env)
    }

    pub fn google_api_key(&self) -> Option<String> {
        Self::secret(&self.google.api_key_env)
    }

    pub fn serpapi_key(&self) -> Option<String> {
        Self::secret(&self.search.serpapi_key_env)
    }

    pub fn hunter_api_key(&self) -> Option<String> {
        Self::secret(&self.search.hunter_api_key_env)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        let secs = self.limits.step_timeout_secs;
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    /// Everything missing, given a way to read environment variables.
    pub fn issues_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigIssue> {
        let present = |name: &str| lookup(name).map_or(false, |v| !v.is_empty());
        let mut issues = Vec::new();

        if !present(&self.llm.api_key_env) {
            issues.push(ConfigIssue {
                key: "llm.api_key_env",
                message: format!("{} is not set", self.llm.api_key_env),
                required: true,
            });
        }
        if !self.google.client_secret_file.exists() {
            issues.push(ConfigIssue {
                key: "google.client_secret_file",
                message: format!(
                    "Client secret file not found at {}",
                    self.google.client_secret_file.display()
                ),
                required: true,
            });
        }
        if !present(&self.google.api_key_env) {
            issues.push(ConfigIssue {
                key: "google.api_key_env",
                message: format!("{} is not set", self.google.api_key_env),
                required: false,
            });
        }
        if !self.google.credentials_file.exists() {
            issues.push(ConfigIssue {
                key: "google.credentials_file",
                message: format!(
                    "Google credentials file not found at {}",
                    self.google.credentials_file.display()
                ),
                required: false,
            });
        }
        issues
    }

    pub fn validate(&self, mode: ValidationMode) -> Result<Vec<String>, AgentSyncError> {
        self.validate_with(mode, |key| std::env::var(key).ok())
    }

    /// Strict mode fails on the first required gap. Every other gap is logged
    /// and returned.
    pub fn validate_with(
        &self,
        mode: ValidationMode,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<String>, AgentSyncError> {
        let mut warnings = Vec::new();
        for issue in self.issues_with(lookup) {
            if issue.required && mode == ValidationMode::Strict {
                return Err(AgentSyncError::Config(issue.message));
            }
            tracing::warn!(key = issue.key, "{}", issue.message);
            warnings.push(issue.message);
        }
        Ok(warnings)
    }

    /// Access token from the OAuth authorized-user file (`token` or `access_token`).
    pub fn google_access_token(&self) -> Result<String, AgentSyncError> {
        let path = &self.google.client_secret_file;
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentSyncError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            AgentSyncError::Config(format!("{} is not valid JSON: {e}", path.display()))
        })?;
        json.get("token")
            .or_else(|| json.get("access_token"))
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AgentSyncError::Config(format!("{} holds no access token", path.display()))
            })
    }

    /// Build the model handle from the current settings.
    pub fn build_llm_client(&self) -> Result<Arc<dyn LlmClient>, AgentSyncError> {
        let api_key = self.api_key().ok_or_else(|| {
            AgentSyncError::Config(format!("{} is not set", self.llm.api_key_env))
        })?;
        Ok(Arc::new(
            OpenAIClient::new(api_key)
                .with_model(&self.llm.model)
                .with_base_url(&self.llm.base_url),
        ))
    }
}

/// Shows only the first four characters of a secret.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_hides_secrets() {
        assert_eq!(mask(""), "<unset>");
        assert_eq!(mask("sk-abcdef"), "sk-a****");
    }

    #[test]
    fn timeout_zero_disables() {
        let mut settings = Settings::default();
        assert_eq!(settings.step_timeout(), Some(Duration::from_secs(120)));
        settings.limits.step_timeout_secs = 0;
        assert_eq!(settings.step_timeout(), None);
    }
}
