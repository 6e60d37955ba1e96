use super::{Notifier, SlackMessage};
use async_trait::async_trait;

pub struct SlackNotifier {
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, endpoint: &str, payload: &SlackMessage) -> reqwest::Result<()> {
        self.client
            .post(endpoint)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Default for SlackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, endpoint: &str, payload: &SlackMessage) -> bool {
        match self.post(endpoint, payload).await {
            Ok(()) => {
                tracing::info!("Sent Slack notification with {} block(s)", payload.blocks.len());
                true
            }
            Err(e) => {
                tracing::error!("Failed to send to Slack: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "slack"
    }
}
