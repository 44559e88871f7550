use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Constraints the user has stated so far in one conversation.
///
/// Both lists keep insertion order and repeats; the answer text lists them verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub allergies: Vec<String>,
    pub restrictions: Vec<String>,
}

impl ConversationContext {
    pub fn record_allergy(&mut self, label: impl Into<String>) {
        self.allergies.push(label.into());
    }

    pub fn record_restriction(&mut self, ingredient: impl Into<String>) {
        self.restrictions.push(ingredient.into());
    }

    pub fn clear(&mut self) {
        self.allergies.clear();
        self.restrictions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.allergies.is_empty() && self.restrictions.is_empty()
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self, key: &SessionKey) -> ConversationContext;
    fn save(&self, key: &SessionKey, context: ConversationContext);
    fn remove(&self, key: &SessionKey);
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, ConversationContext>>>,
}

impl InMemorySessionStore {
    pub fn session_count(&self) -> usize {
        match self.sessions.lock() {
            Ok(sessions) => sessions.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &SessionKey) -> ConversationContext {
        match self.sessions.lock() {
            Ok(sessions) => sessions.get(key).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned().unwrap_or_default(),
        }
    }

    fn save(&self, key: &SessionKey, context: ConversationContext) {
        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        if context.is_empty() {
            sessions.remove(key);
        } else {
            sessions.insert(key.clone(), context);
        }
    }

    fn remove(&self, key: &SessionKey) {
        match self.sessions.lock() {
            Ok(mut sessions) => sessions.remove(key),
            Err(poisoned) => poisoned.into_inner().remove(key),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationContext, InMemorySessionStore, SessionKey, SessionStore};

    #[test]
    fn sessions_are_isolated_by_key() {
        let store = InMemorySessionStore::default();
        let alice = SessionKey::new("alice");
        let bob = SessionKey::new("bob");

        let mut context = store.load(&alice);
        context.record_allergy("Gluten-Free");
        store.save(&alice, context);

        assert_eq!(store.load(&alice).allergies, vec!["Gluten-Free".to_string()]);
        assert!(store.load(&bob).is_empty());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn saving_an_empty_context_drops_the_session() {
        let store = InMemorySessionStore::default();
        let key = SessionKey::new("conv-1");

        let mut context = ConversationContext::default();
        context.record_restriction("cheese");
        store.save(&key, context.clone());
        assert_eq!(store.session_count(), 1);

        context.clear();
        store.save(&key, context);
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn remove_forgets_accumulated_constraints() {
        let store = InMemorySessionStore::default();
        let key = SessionKey::new("conv-2");

        let mut context = ConversationContext::default();
        context.record_restriction("tuna");
        context.record_restriction("tuna");
        store.save(&key, context);
        assert_eq!(store.load(&key).restrictions.len(), 2);

        store.remove(&key);
        assert!(store.load(&key).is_empty());
    }
}
