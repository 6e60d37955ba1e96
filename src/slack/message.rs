use crate::logs::LogEntry;
use serde::{Deserialize, Serialize};

pub const HEADER_TEXT: &str = "🚨 Error Logs Detected";

/// Slack Block Kit payload posted to the incoming webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub text: TextObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Header,
    Section,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: TextType,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    PlainText,
    Mrkdwn,
}

impl Block {
    pub fn header(text: &str) -> Self {
        Self {
            block_type: BlockType::Header,
            text: TextObject {
                text_type: TextType::PlainText,
                text: text.to_string(),
            },
        }
    }

    // Message text goes out verbatim; mrkdwn in it is not escaped.
    pub fn entry(entry: &LogEntry) -> Self {
        Self {
            block_type: BlockType::Section,
            text: TextObject {
                text_type: TextType::Mrkdwn,
                text: format!("*Timestamp:* {}\n*Message:* {}", entry.timestamp, entry.message),
            },
        }
    }
}

/// Builds the notification: one header block, then one section per entry in
/// input order.
pub fn format_message(entries: &[LogEntry]) -> SlackMessage {
    let mut blocks = Vec::with_capacity(entries.len() + 1);
    blocks.push(Block::header(HEADER_TEXT));
    blocks.extend(entries.iter().map(Block::entry));
    SlackMessage { blocks }
}
