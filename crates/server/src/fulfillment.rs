use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use recipebot_core::dialog::actions::{close, DialogResponse, FulfillmentState};
use recipebot_core::dialog::validation::Message;
use recipebot_core::domain::turn::Turn;
use recipebot_core::errors::InterfaceError;
use recipebot_core::session::SessionStore;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bootstrap::SharedRuntime;

#[derive(Clone)]
pub struct DialogHookState {
    runtime: SharedRuntime,
    sessions: Arc<dyn SessionStore>,
}

impl DialogHookState {
    pub fn new(runtime: SharedRuntime, sessions: Arc<dyn SessionStore>) -> Self {
        Self { runtime, sessions }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HookError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: DialogHookState) -> Router {
    Router::new().route("/fulfillment", post(fulfillment)).with_state(state)
}

/// Handles one platform turn. Failures after slot filling still answer with a dialog
/// action so the platform can close the conversation.
pub async fn fulfillment(
    State(state): State<DialogHookState>,
    Json(turn): Json<Turn>,
) -> HookReply {
    let correlation_id = Uuid::new_v4().to_string();
    let session_key = turn.session_key();

    info!(
        event_name = "fulfillment.turn.received",
        correlation_id = %correlation_id,
        session_id = session_key.as_str(),
        intent = turn.intent_name(),
        invocation_source = ?turn.invocation_source,
        "platform turn received"
    );

    match state.runtime.handle_session(&turn, state.sessions.as_ref()).await {
        Ok(response) => {
            info!(
                event_name = "fulfillment.turn.answered",
                correlation_id = %correlation_id,
                session_id = session_key.as_str(),
                dialog_action = response.dialog_action.kind(),
                "platform turn answered"
            );
            Ok(Json(response))
        }
        Err(application_error) => {
            let interface_error = application_error.into_interface(correlation_id);
            reply_for_error(&turn, interface_error)
        }
    }
}

pub type HookReply = Result<Json<DialogResponse>, (StatusCode, Json<HookError>)>;

fn reply_for_error(turn: &Turn, interface_error: InterfaceError) -> HookReply {
    let body = HookError {
        error: interface_error.user_message().to_string(),
        correlation_id: interface_error.correlation_id().to_string(),
    };

    match &interface_error {
        InterfaceError::BadRequest { message, correlation_id } => {
            warn!(
                event_name = "fulfillment.turn.rejected",
                correlation_id = %correlation_id,
                intent = turn.intent_name(),
                error = %message,
                "platform turn rejected"
            );
            Err((StatusCode::BAD_REQUEST, Json(body)))
        }
        InterfaceError::ServiceUnavailable { message, correlation_id }
        | InterfaceError::Internal { message, correlation_id } => {
            error!(
                event_name = "fulfillment.turn.failed",
                correlation_id = %correlation_id,
                intent = turn.intent_name(),
                error = %message,
                "fulfillment failed, closing conversation"
            );
            Ok(Json(close(
                turn.session_attributes.clone(),
                FulfillmentState::Failed,
                Message::plain_text(body.error),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{body::Body, extract::State, http::Request, http::StatusCode, Json};
    use recipebot_agent::runtime::AgentRuntime;
    use recipebot_agent::search::{RecipeSearch, SearchError};
    use recipebot_core::dialog::actions::{DialogAction, FulfillmentState};
    use recipebot_core::domain::recipe::{RecipeDetails, SearchOptions};
    use recipebot_core::domain::slot::{SlotName, Slots};
    use recipebot_core::domain::turn::{InvocationSource, Turn};
    use recipebot_core::session::{InMemorySessionStore, SessionKey, SessionStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{fulfillment, router, DialogHookState};

    struct FixedSearch {
        result: Result<RecipeDetails, SearchError>,
    }

    #[async_trait]
    impl RecipeSearch for FixedSearch {
        async fn search(
            &self,
            _term: &str,
            _options: &SearchOptions,
        ) -> Result<RecipeDetails, SearchError> {
            self.result.clone()
        }
    }

    fn state_with(
        result: Result<RecipeDetails, SearchError>,
    ) -> (DialogHookState, Arc<InMemorySessionStore>) {
        let search: Arc<dyn RecipeSearch> =
            Arc::new(FixedSearch { result });
        let sessions = Arc::new(InMemorySessionStore::default());
        let state =
            DialogHookState::new(Arc::new(AgentRuntime::with_search(search)), sessions.clone());
        (state, sessions)
    }

    fn recipe() -> RecipeDetails {
        RecipeDetails {
            name: "Veggie Lasagna".to_string(),
            recipe_url: "https://www.yummly.com/recipe/Veggie-Lasagna-42".to_string(),
            scaled_ingredients: vec!["noodles".to_string(), "spinach".to_string()],
        }
    }

    fn turn(restriction: &str, source: InvocationSource) -> Turn {
        let slots = Slots::new()
            .with(SlotName::RecipeType, "lasagna")
            .with(SlotName::Servings, "4")
            .with(SlotName::Restrictions, restriction);
        Turn::new("FindRecipe", slots, source).with_user_id("user-7")
    }

    #[tokio::test]
    async fn dialog_turn_elicits_and_records_restriction() {
        let (state, sessions) = state_with(Ok(recipe()));

        let Json(response) =
            fulfillment(State(state), Json(turn("dairy", InvocationSource::DialogCodeHook)))
                .await
                .expect("dialog turn");

        assert!(matches!(
            response.dialog_action,
            DialogAction::ElicitSlot { slot_to_elicit: SlotName::Restrictions, .. }
        ));
        assert_eq!(
            sessions.load(&SessionKey::new("user-7")).allergies,
            vec!["Dairy-Free".to_string()]
        );
    }

    #[tokio::test]
    async fn fulfillment_turn_closes_with_recipe_and_clears_session() {
        let (state, sessions) = state_with(Ok(recipe()));
        fulfillment(State(state.clone()), Json(turn("dairy", InvocationSource::DialogCodeHook)))
            .await
            .expect("dialog turn");

        let Json(response) =
            fulfillment(State(state), Json(turn("no", InvocationSource::FulfillmentCodeHook)))
                .await
                .expect("fulfillment turn");

        match response.dialog_action {
            DialogAction::Close { fulfillment_state, message } => {
                assert_eq!(fulfillment_state, FulfillmentState::Fulfilled);
                assert!(message.content.starts_with("Here is a recipe called Veggie Lasagna."));
                assert!(message.content.ends_with("\nThis recipe should be Dairy-Free."));
            }
            other => panic!("expected Close, got {other:?}"),
        }
        assert_eq!(sessions.session_count(), 0);
    }

    #[tokio::test]
    async fn search_failure_closes_as_failed_with_safe_message() {
        let (state, sessions) =
            state_with(Err(SearchError::Request("connection reset by peer".to_string())));

        let Json(response) =
            fulfillment(State(state), Json(turn("no", InvocationSource::FulfillmentCodeHook)))
                .await
                .expect("failure still answers");

        match response.dialog_action {
            DialogAction::Close { fulfillment_state, message } => {
                assert_eq!(fulfillment_state, FulfillmentState::Failed);
                assert!(!message.content.contains("connection reset"));
                assert!(message.content.contains("recipe service"));
            }
            other => panic!("expected Close, got {other:?}"),
        }
        assert_eq!(sessions.session_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_intent_is_bad_request() {
        let (state, _) = state_with(Ok(recipe()));
        let turn = Turn::new("BookTable", Slots::new(), InvocationSource::DialogCodeHook);

        let (status, Json(body)) =
            fulfillment(State(state), Json(turn)).await.expect_err("unsupported intent");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Sorry, I can't help with that request.");
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn router_accepts_platform_json() {
        let (state, _) = state_with(Ok(recipe()));
        let payload = json!({
            "currentIntent": {
                "name": "FindRecipe",
                "slots": { "RecipeType": null, "Servings": null, "Restrictions": null }
            },
            "invocationSource": "DialogCodeHook",
            "sessionAttributes": null,
            "userId": "user-9",
            "inputTranscript": "find me a recipe"
        });

        let response = router(state)
            .oneshot(
                Request::post("/fulfillment")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body,
            json!({
                "sessionAttributes": {},
                "dialogAction": {
                    "type": "ElicitSlot",
                    "intentName": "FindRecipe",
                    "slots": { "RecipeType": null, "Servings": null, "Restrictions": null },
                    "slotToElicit": "RecipeType",
                    "message": {
                        "contentType": "PlainText",
                        "content": "What kind of meal do you want to make?"
                    }
                }
            })
        );
    }
}
