//! Request building: page images + prompts → one Messages API turn.
//!
//! The wire shape is the Anthropic Messages format:
//!
//! ```text
//! { "role": "user",
//!   "content": [ {image p1}, {image p2}, …, {text directive} ] }
//! ```
//!
//! Nothing here reads the clock or generates ids, so identical inputs always
//! serialise to identical JSON.

use crate::config::{ExtractionConfig, ExtractionMode};
use crate::pipeline::encode::{PageImage, PNG_MEDIA_TYPE};
use crate::prompts::{system_prompt, USER_DIRECTIVE};
use serde::{Deserialize, Serialize};

/// Conversation role. Only `user` turns are ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Where an image block's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Always `"base64"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

/// One element of a message's `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

impl ContentBlock {
    pub fn png(data: impl Into<String>) -> Self {
        ContentBlock::Image {
            source: ImageSource {
                kind: "base64".to_string(),
                media_type: PNG_MEDIA_TYPE.to_string(),
                data: data.into(),
            },
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

/// System instruction plus the single user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub system: String,
    pub messages: Vec<Message>,
}

impl ExtractionRequest {
    /// Number of image blocks in the user turn.
    pub fn image_count(&self) -> usize {
        self.messages
            .iter()
            .flat_map(|m| &m.content)
            .filter(|b| matches!(b, ContentBlock::Image { .. }))
            .count()
    }
}

/// Body posted to `/v1/messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesBody<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> MessagesBody<'a> {
    pub fn new(request: &'a ExtractionRequest, config: &'a ExtractionConfig) -> Self {
        Self {
            model: &config.model,
            system: &request.system,
            messages: &request.messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Assemble the request: one image block per page (in order), then the
/// directive text block.
pub fn build_request(system: impl Into<String>, images: &[PageImage]) -> ExtractionRequest {
    let mut content: Vec<ContentBlock> = images
        .iter()
        .map(|img| ContentBlock::png(img.data.clone()))
        .collect();
    content.push(ContentBlock::text(USER_DIRECTIVE));

    ExtractionRequest {
        system: system.into(),
        messages: vec![Message {
            role: Role::User,
            content,
        }],
    }
}

/// The system instruction for `mode`, unless the config overrides it.
pub fn resolve_system_prompt(mode: ExtractionMode, config: &ExtractionConfig) -> String {
    config
        .system_prompt
        .clone()
        .unwrap_or_else(|| system_prompt(mode))
}
