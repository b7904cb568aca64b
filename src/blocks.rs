//! Slack Block Kit wire types emitted by the assembler.

use serde::{Deserialize, Serialize};

pub const PLAIN_TEXT: &str = "plain_text";
pub const MRKDWN: &str = "mrkdwn";

/// Text object of a header block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: PLAIN_TEXT.to_string(),
            text: text.into(),
        }
    }
}

/// One column of a section block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub field_type: String,
    pub text: String,
}

impl Field {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            field_type: MRKDWN.to_string(),
            text: text.into(),
        }
    }
}

/// One line of a context block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    pub text: String,
}

impl Element {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            element_type: MRKDWN.to_string(),
            text: text.into(),
        }
    }
}

/// One visually distinct unit of a chat message. Serializes to the Slack
/// block JSON with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBlock {
    Header { text: Text },
    Divider,
    Section { fields: Vec<Field> },
    Context { elements: Vec<Element> },
    Image { image_url: String, alt_text: String },
}

impl MessageBlock {
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: Text::plain(text),
        }
    }

    pub fn section(fields: Vec<Field>) -> Self {
        Self::Section { fields }
    }

    pub fn context(elements: Vec<Element>) -> Self {
        Self::Context { elements }
    }

    pub fn image(image_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image {
            image_url: image_url.into(),
            alt_text: alt_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_serializes_as_plain_text() {
        let block = MessageBlock::header("DiskFull");

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "header",
                "text": {"type": "plain_text", "text": "DiskFull"}
            })
        );
    }

    #[test]
    fn divider_is_a_bare_discriminator() {
        assert_eq!(
            serde_json::to_value(MessageBlock::Divider).unwrap(),
            json!({"type": "divider"})
        );
    }

    #[test]
    fn section_carries_mrkdwn_fields() {
        let block = MessageBlock::section(vec![Field::mrkdwn("*Env: PROD*")]);

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "section",
                "fields": [{"type": "mrkdwn", "text": "*Env: PROD*"}]
            })
        );
    }

    #[test]
    fn image_uses_snake_case_keys() {
        let block = MessageBlock::image("https://img.example.com/x.jpg", "inspiration");

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "image",
                "image_url": "https://img.example.com/x.jpg",
                "alt_text": "inspiration"
            })
        );
    }

    #[test]
    fn block_sequence_roundtrips() {
        let blocks = vec![
            MessageBlock::header("A"),
            MessageBlock::Divider,
            MessageBlock::context(vec![Element::mrkdwn("*Summary:* ok")]),
        ];

        let encoded = serde_json::to_string(&blocks).unwrap();
        let decoded: Vec<MessageBlock> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, blocks);
    }
}
