use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotName {
    RecipeType,
    Servings,
    Restrictions,
    RecipeTime,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecipeType => "RecipeType",
            Self::Servings => "Servings",
            Self::Restrictions => "Restrictions",
            Self::RecipeTime => "RecipeTime",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot values keyed by slot name, exactly as the platform sent them.
///
/// Serialization echoes the original JSON values. The text view used by the dialog is
/// derived alongside: numbers and booleans read as their textual form, surrounding
/// whitespace is trimmed, and a slot that is missing, `null`, or blank reads as unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slots {
    raw: BTreeMap<String, Value>,
    text: BTreeMap<String, String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: SlotName, value: impl Into<String>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    pub fn set(&mut self, name: SlotName, value: Option<String>) {
        self.insert(name.as_str().to_string(), value.map(Value::String).unwrap_or(Value::Null));
    }

    fn insert(&mut self, key: String, value: Value) {
        match text_view(&value) {
            Some(text) => self.text.insert(key.clone(), text),
            None => self.text.remove(&key),
        };
        self.raw.insert(key, value);
    }

    pub fn value(&self, name: SlotName) -> Option<&str> {
        self.raw(name.as_str())
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.text.get(key).map(String::as_str)
    }

    pub fn has_any_value(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.raw.keys().map(move |key| (key.as_str(), self.raw(key)))
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn text_view(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

impl Serialize for Slots {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slots {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
        let mut slots = Self::default();
        for (key, value) in raw.unwrap_or_default() {
            slots.insert(key, value);
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{SlotName, Slots};

    #[test]
    fn blank_and_null_values_are_unset() {
        let slots: Slots = serde_json::from_value(json!({
            "RecipeType": "lasagna",
            "Servings": null,
            "Restrictions": "   ",
        }))
        .expect("slots should deserialize");

        assert_eq!(slots.value(SlotName::RecipeType), Some("lasagna"));
        assert_eq!(slots.value(SlotName::Servings), None);
        assert_eq!(slots.value(SlotName::Restrictions), None);
        assert_eq!(slots.value(SlotName::RecipeTime), None);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn numeric_values_read_as_text_and_serialize_unchanged() {
        let input = json!({ "Servings": 6, "RecipeType": " chili " });
        let slots: Slots = serde_json::from_value(input.clone()).expect("slots should deserialize");

        assert_eq!(slots.value(SlotName::Servings), Some("6"));
        assert_eq!(slots.value(SlotName::RecipeType), Some("chili"));
        assert_eq!(serde_json::to_value(&slots).expect("slots serialize"), input);
    }

    #[test]
    fn null_slot_map_is_empty() {
        let slots: Slots = serde_json::from_value(json!(null)).expect("null slots");
        assert!(slots.is_empty());
        assert!(!slots.has_any_value());
    }

    #[test]
    fn serializes_back_with_nulls_preserved() {
        let mut slots = Slots::new().with(SlotName::RecipeType, "soup");
        slots.set(SlotName::Servings, None);

        let value = serde_json::to_value(&slots).expect("slots serialize");
        assert_eq!(value, json!({ "RecipeType": "soup", "Servings": null }));
    }
}
