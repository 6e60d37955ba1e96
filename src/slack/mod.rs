mod message;
mod notifier;

use async_trait::async_trait;

pub use message::{format_message, Block, BlockType, SlackMessage, TextObject, TextType, HEADER_TEXT};
pub use notifier::SlackNotifier;

/// Delivers a formatted notification to a chat endpoint.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post `payload` to `endpoint` once. Returns `true` only when the
    /// endpoint accepted it; failure details are logged, not returned.
    async fn send(&self, endpoint: &str, payload: &SlackMessage) -> bool;

    /// Get a human-readable name for this notifier
    fn name(&self) -> &str;
}
