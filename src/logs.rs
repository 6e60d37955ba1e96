use crate::error::{RelayError, Result};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::operation::filter_log_events::FilterLogEventsOutput;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// One matched record from the log store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// Predicate selecting the entries worth reporting.
#[derive(Debug, Clone)]
pub enum LogFilter {
    /// Literal substring match, also pushed down to the store as a term.
    Text(String),
    /// Regular expression, applied locally only.
    Pattern(Regex),
}

impl Default for LogFilter {
    fn default() -> Self {
        LogFilter::Text("ERROR".to_string())
    }
}

impl LogFilter {
    pub fn text(text: impl Into<String>) -> Self {
        LogFilter::Text(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(LogFilter::Pattern)
            .map_err(|e| RelayError::InvalidConfig(format!("invalid filter pattern: {}", e)))
    }

    /// Filter pattern handed to the store, if this predicate can be pushed down.
    pub fn store_pattern(&self) -> Option<String> {
        match self {
            LogFilter::Text(text) => Some(format!("\"{}\"", text)),
            LogFilter::Pattern(_) => None,
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        match self {
            LogFilter::Text(text) => message.contains(text.as_str()),
            LogFilter::Pattern(regex) => regex.is_match(message),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LogFilter::Text(text) => format!("text '{}'", text),
            LogFilter::Pattern(regex) => format!("pattern '{}'", regex.as_str()),
        }
    }
}

/// Backend holding the application's log events, e.g. CloudWatch Logs.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Events from `source_id` at or after `start_millis`, in store order.
    async fn filter_events(
        &self,
        source_id: &str,
        start_millis: i64,
        pattern: Option<&str>,
    ) -> anyhow::Result<Vec<LogEntry>>;
}

pub struct CloudWatchLogStore {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatchlogs::Client::new(config),
        }
    }
}

#[async_trait]
impl LogStore for CloudWatchLogStore {
    async fn filter_events(
        &self,
        source_id: &str,
        start_millis: i64,
        pattern: Option<&str>,
    ) -> anyhow::Result<Vec<LogEntry>> {
        let client = &self.client;
        let (entries, pages) = collect_pages(|token| {
            let request = client
                .filter_log_events()
                .log_group_name(source_id)
                .start_time(start_millis)
                .set_filter_pattern(pattern.map(String::from))
                .set_next_token(token);
            async move { request.send().await.context("FilterLogEvents request failed") }
        })
        .await?;

        tracing::debug!("Fetched {} event(s) from {} in {} page(s)", entries.len(), source_id, pages);
        Ok(entries)
    }
}

/// Drains a paginated `FilterLogEvents` result, following `nextToken` until
/// it is missing or empty. Returns the entries in page order and the number
/// of pages fetched.
pub(crate) async fn collect_pages<F, Fut>(mut fetch: F) -> anyhow::Result<(Vec<LogEntry>, usize)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<FilterLogEventsOutput>>,
{
    let mut entries = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let output = fetch(next_token.take()).await?;
        pages += 1;

        for event in output.events() {
            match (event.timestamp(), event.message()) {
                (Some(timestamp), Some(message)) => entries.push(LogEntry {
                    timestamp,
                    message: message.to_string(),
                }),
                _ => tracing::debug!("Skipping log event without timestamp or message"),
            }
        }

        match output.next_token() {
            Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
            _ => break,
        }
    }

    Ok((entries, pages))
}

/// Looks up error entries for a time window through a [`LogStore`].
pub struct LogQueryClient {
    store: Arc<dyn LogStore>,
    filter: LogFilter,
}

impl LogQueryClient {
    pub fn new(store: Arc<dyn LogStore>, filter: LogFilter) -> Self {
        Self { store, filter }
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub async fn query_errors(&self, source_id: &str, start_millis: i64) -> Result<Vec<LogEntry>> {
        let pattern = self.filter.store_pattern();
        let events = match self
            .store
            .filter_events(source_id, start_millis, pattern.as_deref())
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Error getting logs from {}: {:#}", source_id, e);
                return Err(RelayError::QueryFailed {
                    source_id: source_id.to_string(),
                    reason: format!("{:#}", e),
                });
            }
        };

        let matched: Vec<LogEntry> = events
            .into_iter()
            .filter(|entry| self.filter.matches(&entry.message))
            .collect();

        tracing::debug!(
            "Found {} entries matching {} in {} since {}",
            matched.len(),
            self.filter.describe(),
            source_id,
            start_millis
        );
        Ok(matched)
    }
}
