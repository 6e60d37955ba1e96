use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::logs::{LogEntry, LogQueryClient, LogStore};
use crate::params::{ConfigResolver, ParameterStore, RelayTargets};
use crate::slack::{format_message, Notifier};
use crate::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NO_ERRORS_BODY: &str = "No errors found";
pub const DELIVERED_BODY: &str = "Sent to Slack";

/// Triggering event. Only `time` is read; other alarm fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlarmEvent {
    #[serde(default)]
    pub time: Option<String>,
}

impl AlarmEvent {
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
        }
    }
}

/// Successful end states of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoMatches,
    Delivered { entries: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub status_code: u16,
    pub body: String,
}

impl Outcome {
    pub fn into_response(self) -> RelayResponse {
        let body = match self {
            Outcome::NoMatches => NO_ERRORS_BODY,
            Outcome::Delivered { .. } => DELIVERED_BODY,
        };
        RelayResponse {
            status_code: 200,
            body: body.to_string(),
        }
    }
}

/// Alarm-to-notification pipeline with its backends injected.
///
/// Holds no per-invocation state, so one instance serves every invocation
/// of a warm runtime.
pub struct Pipeline {
    config: RelayConfig,
    resolver: ConfigResolver,
    query: LogQueryClient,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        config: RelayConfig,
        parameters: Arc<dyn ParameterStore>,
        logs: Arc<dyn LogStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let filter = config.filter.build()?;
        let resolver = ConfigResolver::new(parameters, config.parameters.decrypt);
        Ok(Self {
            config,
            resolver,
            query: LogQueryClient::new(logs, filter),
            notifier,
        })
    }

    pub async fn run(&self, event: &AlarmEvent) -> Result<Outcome> {
        let result = self.run_inner(event).await;
        if let Err(e) = &result {
            tracing::error!(kind = e.kind(), "Something went wrong: {}", e);
        }
        result
    }

    async fn run_inner(&self, event: &AlarmEvent) -> Result<Outcome> {
        let time = match event.time.as_deref() {
            Some(time) if !time.is_empty() => time,
            _ => return Err(RelayError::MissingTime),
        };

        let RelayTargets {
            log_group,
            webhook_url,
        } = match self.resolver.resolve_targets(&self.config.parameters).await {
            Ok(targets) => targets,
            Err(e) => return Err(e),
        };

        let window = match TimeWindow::for_alarm(time) {
            Ok(window) => window,
            Err(e) => return Err(e),
        };
        tracing::debug!("Alarm at {} -> querying {} from {}", time, log_group, window.start_millis);

        match self.query.query_errors(&log_group, window.start_millis).await {
            Ok(entries) if entries.is_empty() => {
                tracing::info!("No errors found - all good!");
                Ok(Outcome::NoMatches)
            }
            Ok(entries) => self.deliver(&webhook_url, &entries).await,
            Err(e) => Err(e),
        }
    }

    async fn deliver(&self, webhook_url: &str, entries: &[LogEntry]) -> Result<Outcome> {
        let message = format_message(entries);
        if self.notifier.send(webhook_url, &message).await {
            tracing::info!("Successfully sent {} error log(s) via {}", entries.len(), self.notifier.name());
            Ok(Outcome::Delivered {
                entries: entries.len(),
            })
        } else {
            Err(RelayError::DeliveryFailed {
                entries: entries.len(),
            })
        }
    }

    /// Runs the pipeline and maps success onto the HTTP-style response.
    pub async fn handle(&self, event: &AlarmEvent) -> Result<RelayResponse> {
        self.run(event).await.map(Outcome::into_response)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}
