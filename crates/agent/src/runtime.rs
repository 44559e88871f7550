use recipebot_core::config::DEFAULT_INTENT_NAME;
use recipebot_core::dialog::actions::{
    close, delegate, elicit_slot, DialogResponse, FulfillmentState,
};
use recipebot_core::dialog::validation::Message;
use recipebot_core::domain::slot::SlotName;
use recipebot_core::domain::turn::{InvocationSource, Turn};
use recipebot_core::errors::{ApplicationError, DomainError};
use recipebot_core::session::{ConversationContext, SessionStore};
use tracing::{debug, info, warn};

use crate::response::compose_response;
use crate::search::{build_search_options, RecipeSearch};
use crate::validator::SlotValidator;

/// Routes platform turns for the recipe intent.
///
/// The runtime owns no conversation state. Callers pass the session's
/// `ConversationContext` in, or use [`AgentRuntime::handle_session`] to load and save it
/// through a [`SessionStore`].
pub struct AgentRuntime<S> {
    validator: SlotValidator,
    intent_name: String,
    search: S,
}

impl<S: RecipeSearch> AgentRuntime<S> {
    pub fn new(validator: SlotValidator, intent_name: impl Into<String>, search: S) -> Self {
        Self { validator, intent_name: intent_name.into(), search }
    }

    pub fn with_search(search: S) -> Self {
        Self::new(SlotValidator::default(), DEFAULT_INTENT_NAME, search)
    }

    pub fn intent_name(&self) -> &str {
        &self.intent_name
    }

    pub fn validator(&self) -> &SlotValidator {
        &self.validator
    }

    /// Dialog code hook: ask for the next slot or hand control back to the platform.
    pub fn find_recipe(&self, turn: &Turn, context: &mut ConversationContext) -> DialogResponse {
        let slots = turn.slots();
        if !slots.has_any_value() && !context.is_empty() {
            debug!(
                event_name = "agent.dialog.context_reset",
                intent = turn.intent_name(),
                "turn carries no slot values, starting a fresh conversation"
            );
            context.clear();
        }

        let result = self.validator.validate_slots(slots, context);
        let attributes = turn.session_attributes.clone();

        match result.violated_slot {
            Some(violated_slot) if !result.is_valid => {
                debug!(
                    event_name = "agent.dialog.elicit_slot",
                    intent = turn.intent_name(),
                    slot = violated_slot.as_str(),
                    allergies = context.allergies.len(),
                    restrictions = context.restrictions.len(),
                    "eliciting slot"
                );
                elicit_slot(
                    attributes,
                    turn.intent_name(),
                    slots.clone(),
                    violated_slot,
                    result.message,
                )
            }
            _ => {
                debug!(
                    event_name = "agent.dialog.delegate",
                    intent = turn.intent_name(),
                    "all slots settled, delegating"
                );
                delegate(attributes, slots.clone())
            }
        }
    }

    /// Fulfillment code hook: search once and answer with the scaled ingredient list.
    ///
    /// The context is cleared whether or not the search succeeds.
    pub async fn fulfill_recipe(
        &self,
        turn: &Turn,
        context: &mut ConversationContext,
    ) -> Result<DialogResponse, ApplicationError> {
        let Some(term) = turn.slots().value(SlotName::RecipeType) else {
            context.clear();
            return Err(DomainError::InvariantViolation(
                "fulfillment requires the RecipeType slot".to_string(),
            )
            .into());
        };

        let options = build_search_options(turn.slots(), context, self.validator.allergies());
        let searched = self.search.search(term, &options).await;
        let outcome = searched.map(|details| compose_response(&details, context));
        context.clear();

        match outcome {
            Ok(content) => {
                info!(
                    event_name = "agent.fulfillment.completed",
                    intent = turn.intent_name(),
                    search_term = term,
                    "recipe fulfilled"
                );
                Ok(close(
                    turn.session_attributes.clone(),
                    FulfillmentState::Fulfilled,
                    Message::plain_text(content),
                ))
            }
            Err(error) => {
                warn!(
                    event_name = "agent.fulfillment.search_failed",
                    intent = turn.intent_name(),
                    search_term = term,
                    error = %error,
                    "recipe search failed"
                );
                Err(error.into())
            }
        }
    }

    pub async fn handle(
        &self,
        turn: &Turn,
        context: &mut ConversationContext,
    ) -> Result<DialogResponse, ApplicationError> {
        if turn.intent_name() != self.intent_name {
            return Err(DomainError::UnsupportedIntent { intent: turn.intent_name().to_string() }
                .into());
        }

        match turn.invocation_source {
            InvocationSource::DialogCodeHook => Ok(self.find_recipe(turn, context)),
            InvocationSource::FulfillmentCodeHook => self.fulfill_recipe(turn, context).await,
        }
    }

    /// Handles one turn against a stored session. The store is only touched to load the
    /// snapshot before handling and to write it back afterwards.
    pub async fn handle_session<T>(
        &self,
        turn: &Turn,
        store: &T,
    ) -> Result<DialogResponse, ApplicationError>
    where
        T: SessionStore + ?Sized,
    {
        let key = turn.session_key();
        let mut context = store.load(&key);
        debug!(
            event_name = "agent.session.loaded",
            session_id = key.as_str(),
            intent = turn.intent_name(),
            allergies = context.allergies.len(),
            restrictions = context.restrictions.len(),
            "session context loaded"
        );
        let result = self.handle(turn, &mut context).await;
        store.save(&key, context);
        result
    }
}
