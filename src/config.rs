use crate::error::{RelayError, Result};
use crate::logs::LogFilter;
use serde::{Deserialize, Serialize};

/// Env var naming a YAML config file to load at startup.
pub const CONFIG_PATH_ENV: &str = "ALARM_RELAY_CONFIG";
pub const LOG_GROUP_PARAM_ENV: &str = "LOG_GROUP_PARAM";
pub const WEBHOOK_PARAM_ENV: &str = "SLACK_WEBHOOK_PARAM";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Names of the parameters holding the relay's two runtime targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Parameters {
    #[serde(default = "default_log_group_param")]
    pub log_group: String,
    #[serde(default = "default_webhook_param")]
    pub webhook_url: String,
    #[serde(default = "default_decrypt")]
    pub decrypt: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            log_group: default_log_group_param(),
            webhook_url: default_webhook_param(),
            decrypt: default_decrypt(),
        }
    }
}

/// Error-line predicate. Exactly one of `text` or `pattern` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    pub text: Option<String>,
    pub pattern: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            text: Some(default_filter_text()),
            pattern: None,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        match (&self.text, &self.pattern) {
            (None, None) => Err(RelayError::InvalidConfig(
                "filter must set either 'text' or 'pattern'".to_string(),
            )),
            (Some(_), Some(_)) => Err(RelayError::InvalidConfig(
                "filter cannot set both 'text' and 'pattern'".to_string(),
            )),
            (Some(text), None) if text.is_empty() => Err(RelayError::InvalidConfig(
                "filter 'text' cannot be empty".to_string(),
            )),
            // Text is pushed down as a quoted filter term.
            (Some(text), None) if text.contains('"') => Err(RelayError::InvalidConfig(
                "filter 'text' cannot contain '\"'; use 'pattern' instead".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn build(&self) -> Result<LogFilter> {
        self.validate()?;
        match &self.pattern {
            Some(pattern) => LogFilter::pattern(pattern),
            None => Ok(LogFilter::text(self.text.clone().unwrap_or_default())),
        }
    }
}

fn default_log_group_param() -> String {
    "log-group".to_string()
}

fn default_webhook_param() -> String {
    "slack-webhook-url".to_string()
}

fn default_decrypt() -> bool {
    true
}

fn default_filter_text() -> String {
    "ERROR".to_string()
}

impl RelayConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = serde_yaml::from_str(&content)?;
        config.filter.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else the file named by `ALARM_RELAY_CONFIG`,
    /// else the defaults; parameter-name env overrides are applied last.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => {
                tracing::debug!("Loading relay configuration from {}", path);
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.merge_with_env(
            std::env::var(LOG_GROUP_PARAM_ENV).ok(),
            std::env::var(WEBHOOK_PARAM_ENV).ok(),
        );
        Ok(config)
    }

    pub fn merge_with_env(&mut self, log_group: Option<String>, webhook_url: Option<String>) {
        if let Some(name) = log_group.filter(|n| !n.is_empty()) {
            self.parameters.log_group = name;
        }
        if let Some(name) = webhook_url.filter(|n| !n.is_empty()) {
            self.parameters.webhook_url = name;
        }
    }
}
