use serde::{Deserialize, Serialize};

use crate::domain::slot::SlotName;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content_type: ContentType,
    pub content: String,
}

impl Message {
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

/// Outcome of checking the slots of one turn.
///
/// The validator only produces `is_valid == true` with both optional fields absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violated_slot: Option<SlotName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        build_validation_result(true, None, None)
    }

    pub fn invalid(violated_slot: SlotName, message_content: &str) -> Self {
        build_validation_result(false, Some(violated_slot), Some(message_content))
    }
}

pub fn build_validation_result(
    is_valid: bool,
    violated_slot: Option<SlotName>,
    message_content: Option<&str>,
) -> ValidationResult {
    ValidationResult { is_valid, violated_slot, message: message_content.map(Message::plain_text) }
}
