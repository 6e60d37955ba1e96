#[cfg(test)]
mod tests {
    use crate::error::RelayError;
    use crate::logs::{collect_pages, LogEntry, LogFilter, LogQueryClient, LogStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use aws_sdk_cloudwatchlogs::operation::filter_log_events::FilterLogEventsOutput;
    use aws_sdk_cloudwatchlogs::types::FilteredLogEvent;
    use std::collections::VecDeque;
    use std::sync::Arc;

    // Mock store that records the last query it received
    struct MockLogStore {
        events: Vec<LogEntry>,
        last_query: tokio::sync::Mutex<Option<(String, i64, Option<String>)>>,
    }

    impl MockLogStore {
        fn new(messages: &[&str]) -> Self {
            Self {
                events: messages
                    .iter()
                    .enumerate()
                    .map(|(i, m)| LogEntry {
                        timestamp: 1_000 + i as i64,
                        message: m.to_string(),
                    })
                    .collect(),
                last_query: tokio::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LogStore for MockLogStore {
        async fn filter_events(
            &self,
            source_id: &str,
            start_millis: i64,
            pattern: Option<&str>,
        ) -> Result<Vec<LogEntry>> {
            *self.last_query.lock().await =
                Some((source_id.to_string(), start_millis, pattern.map(String::from)));
            Ok(self.events.clone())
        }
    }

    struct FailingLogStore;

    #[async_trait]
    impl LogStore for FailingLogStore {
        async fn filter_events(&self, _: &str, _: i64, _: Option<&str>) -> Result<Vec<LogEntry>> {
            Err(anyhow::anyhow!("ResourceNotFoundException: log group does not exist"))
        }
    }

    #[test]
    fn test_text_filter_matches_anywhere() {
        let filter = LogFilter::default();
        assert!(filter.matches("ERROR: disk full"));
        assert!(filter.matches("retrying after NO_ERRORS_FOUND flag"));
        assert!(!filter.matches("error: lowercase is not the marker"));
        assert!(!filter.matches("INFO: all good"));
    }

    #[test]
    fn test_text_filter_store_pattern_is_quoted() {
        assert_eq!(LogFilter::default().store_pattern().as_deref(), Some("\"ERROR\""));
        assert_eq!(
            LogFilter::text("disk full").store_pattern().as_deref(),
            Some("\"disk full\"")
        );
    }

    #[test]
    fn test_pattern_filter() {
        let filter = LogFilter::pattern(r"^(ERROR|FATAL):").unwrap();
        assert!(filter.matches("FATAL: out of memory"));
        assert!(!filter.matches("INFO: ERROR: nested"));
        assert!(filter.store_pattern().is_none());
    }

    #[test]
    fn test_pattern_filter_invalid() {
        let result = LogFilter::pattern("[invalid regex(");
        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_query_errors_passes_window_and_pattern() {
        let store = Arc::new(MockLogStore::new(&["ERROR: disk full"]));
        let client = LogQueryClient::new(store.clone(), LogFilter::default());

        let entries = client.query_errors("app-logs", 1_704_110_280_000).await.unwrap();
        assert_eq!(entries.len(), 1);

        let query = store.last_query.lock().await.clone().unwrap();
        assert_eq!(query.0, "app-logs");
        assert_eq!(query.1, 1_704_110_280_000);
        assert_eq!(query.2.as_deref(), Some("\"ERROR\""));
    }

    #[tokio::test]
    async fn test_query_errors_keeps_store_order_and_filters() {
        let store = Arc::new(MockLogStore::new(&[
            "ERROR: second",
            "INFO: ignored",
            "ERROR: first",
        ]));
        let client = LogQueryClient::new(store, LogFilter::default());

        let entries = client.query_errors("app-logs", 0).await.unwrap();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["ERROR: second", "ERROR: first"]);
        assert_eq!(entries[0].timestamp, 1_000);
        assert_eq!(entries[1].timestamp, 1_002);
    }

    #[tokio::test]
    async fn test_query_errors_pattern_filter_is_local() {
        let store = Arc::new(MockLogStore::new(&["WARN: slow", "FATAL: gone"]));
        let filter = LogFilter::pattern("FATAL").unwrap();
        let client = LogQueryClient::new(store.clone(), filter);

        let entries = client.query_errors("app-logs", 0).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "FATAL: gone");
        assert!(store.last_query.lock().await.clone().unwrap().2.is_none());
    }

    #[tokio::test]
    async fn test_query_errors_empty() {
        let client = LogQueryClient::new(Arc::new(MockLogStore::new(&[])), LogFilter::default());
        assert!(client.query_errors("app-logs", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_errors_backend_failure() {
        let client = LogQueryClient::new(Arc::new(FailingLogStore), LogFilter::default());

        match client.query_errors("missing-group", 0).await {
            Err(RelayError::QueryFailed { source_id, reason }) => {
                assert_eq!(source_id, "missing-group");
                assert!(reason.contains("ResourceNotFoundException"));
            }
            other => panic!("expected QueryFailed, got {:?}", other),
        }
    }

    fn event(timestamp: Option<i64>, message: Option<&str>) -> FilteredLogEvent {
        FilteredLogEvent::builder()
            .set_timestamp(timestamp)
            .set_message(message.map(String::from))
            .build()
    }

    fn page(events: Vec<FilteredLogEvent>, next_token: Option<&str>) -> FilterLogEventsOutput {
        FilterLogEventsOutput::builder()
            .set_events(Some(events))
            .set_next_token(next_token.map(String::from))
            .build()
    }

    #[tokio::test]
    async fn test_collect_pages_follows_tokens_in_order() {
        let mut pages = VecDeque::from(vec![
            page(
                vec![
                    event(Some(1), Some("ERROR: first")),
                    event(Some(2), None),
                    event(None, Some("ERROR: no timestamp")),
                ],
                Some("page-2"),
            ),
            page(vec![event(Some(3), Some("ERROR: second"))], Some("page-3")),
            page(vec![event(Some(4), Some("ERROR: third"))], None),
        ]);
        let mut tokens = Vec::new();

        let (entries, count) = collect_pages(|token| {
            tokens.push(token);
            let next = pages.pop_front();
            async move { next.ok_or_else(|| anyhow::anyhow!("fetched past the last page")) }
        })
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            tokens,
            vec![None, Some("page-2".to_string()), Some("page-3".to_string())]
        );
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["ERROR: first", "ERROR: second", "ERROR: third"]);
        assert_eq!(entries[2].timestamp, 4);
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_empty_token() {
        let mut pages = VecDeque::from(vec![page(vec![event(Some(1), Some("ERROR: only"))], Some(""))]);

        let (entries, count) = collect_pages(|_| {
            let next = pages.pop_front();
            async move { next.ok_or_else(|| anyhow::anyhow!("fetched past the last page")) }
        })
        .await
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_pages_empty_result() {
        let (entries, count) = collect_pages(|_| async { Ok(page(vec![], None)) })
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_later_page_failure() {
        let mut pages = VecDeque::from(vec![page(vec![event(Some(1), Some("ERROR: a"))], Some("next"))]);

        let result = collect_pages(|_| {
            let next = pages.pop_front();
            async move { next.ok_or_else(|| anyhow::anyhow!("ThrottlingException")) }
        })
        .await;

        assert!(result.unwrap_err().to_string().contains("ThrottlingException"));
    }
}
