//! Block Kit layout blocks used by the approval message
//!
//! Only the subset this service renders: `section`, `actions` with buttons,
//! and `context`.

use serde::{Deserialize, Serialize};

/// Maximum length of a section block's text
pub const SECTION_TEXT_LIMIT: usize = 3000;

/// Composition text object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Mrkdwn { text } | Self::PlainText { text } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Interactive element inside an `actions` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        text: TextObject,
        action_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

impl Element {
    pub fn button(
        label: impl Into<String>,
        action_id: impl Into<String>,
        value: impl Into<String>,
        style: Option<ButtonStyle>,
    ) -> Self {
        Self::Button {
            text: TextObject::plain(label),
            action_id: action_id.into(),
            value: Some(value.into()),
            style,
        }
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::Button { action_id, .. } => action_id,
        }
    }
}

/// Layout block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        text: TextObject,
    },
    Actions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<Element>,
    },
    Context {
        elements: Vec<TextObject>,
    },
}

impl Block {
    /// Section with mrkdwn text; callers keep `text` within [`SECTION_TEXT_LIMIT`]
    pub fn section(text: impl Into<String>) -> Self {
        Self::Section {
            text: TextObject::mrkdwn(text),
        }
    }

    pub fn actions(block_id: impl Into<String>, elements: Vec<Element>) -> Self {
        Self::Actions {
            block_id: Some(block_id.into()),
            elements,
        }
    }

    /// Single-line context block with mrkdwn text
    pub fn context(text: impl Into<String>) -> Self {
        Self::Context {
            elements: vec![TextObject::mrkdwn(text)],
        }
    }
}

/// Split text into chunks of at most `limit` characters, preferring line breaks.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            // Hard-split an oversized line on char boundaries
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
