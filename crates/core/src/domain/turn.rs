use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::slot::Slots;
use crate::session::SessionKey;

/// Opaque attributes the platform carries from one turn to the next.
pub type SessionAttributes = Map<String, Value>;

pub const SESSION_ID_ATTRIBUTE: &str = "sessionId";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentIntent {
    pub name: String,
    #[serde(default)]
    pub slots: Slots,
}

/// One platform invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub current_intent: CurrentIntent,
    pub invocation_source: InvocationSource,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub session_attributes: SessionAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
}

impl Turn {
    pub fn new(intent_name: impl Into<String>, slots: Slots, source: InvocationSource) -> Self {
        Self {
            current_intent: CurrentIntent { name: intent_name.into(), slots },
            invocation_source: source,
            session_attributes: SessionAttributes::new(),
            user_id: None,
            input_transcript: None,
        }
    }

    pub fn with_session_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.session_attributes.insert(key.into(), value);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn intent_name(&self) -> &str {
        &self.current_intent.name
    }

    pub fn slots(&self) -> &Slots {
        &self.current_intent.slots
    }

    /// Key that scopes accumulated constraints: the `sessionId` attribute when the
    /// platform carries one, then the user id, then a shared anonymous key.
    pub fn session_key(&self) -> SessionKey {
        let from_attributes = self
            .session_attributes
            .get(SESSION_ID_ATTRIBUTE)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty());

        match (from_attributes, self.user_id.as_deref()) {
            (Some(session_id), _) => SessionKey::new(session_id),
            (None, Some(user_id)) if !user_id.trim().is_empty() => SessionKey::new(user_id),
            _ => SessionKey::anonymous(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<SessionAttributes, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SessionAttributes>::deserialize(deserializer)?.unwrap_or_default())
}
