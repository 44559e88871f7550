use std::sync::Arc;

use async_trait::async_trait;
use recipebot_core::domain::allergy::AllergyTable;
use recipebot_core::domain::recipe::{RecipeDetails, SearchOptions};
use recipebot_core::domain::slot::{SlotName, Slots};
use recipebot_core::duration::parse_duration_seconds;
use recipebot_core::errors::ApplicationError;
use recipebot_core::session::ConversationContext;
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("recipe search request failed: {0}")]
    Request(String),
    #[error("no recipe matched `{term}`")]
    NoResults { term: String },
    #[error("recipe search response could not be decoded: {0}")]
    Decode(String),
    #[error("recipe search is not configured: {0}")]
    NotConfigured(String),
}

impl From<SearchError> for ApplicationError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::NotConfigured(_) => Self::Configuration(error.to_string()),
            other => Self::Integration(other.to_string()),
        }
    }
}

/// Finds one recipe for a search term and returns it with ingredients scaled.
#[async_trait]
pub trait RecipeSearch: Send + Sync {
    async fn search(&self, term: &str, options: &SearchOptions)
        -> Result<RecipeDetails, SearchError>;
}

#[async_trait]
impl<T> RecipeSearch for Arc<T>
where
    T: RecipeSearch + ?Sized,
{
    async fn search(
        &self,
        term: &str,
        options: &SearchOptions,
    ) -> Result<RecipeDetails, SearchError> {
        (**self).search(term, options).await
    }
}

/// Backend for offline use; every search is reported as unconfigured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRecipeSearch;

#[async_trait]
impl RecipeSearch for NoopRecipeSearch {
    async fn search(
        &self,
        _term: &str,
        _options: &SearchOptions,
    ) -> Result<RecipeDetails, SearchError> {
        Err(SearchError::NotConfigured("no recipe search backend is attached".to_string()))
    }
}

/// Turns the accumulated constraints and the optional `RecipeTime` slot into search filters.
pub fn build_search_options(
    slots: &Slots,
    context: &ConversationContext,
    allergies: &AllergyTable,
) -> SearchOptions {
    let time = slots.value(SlotName::RecipeTime).and_then(|token| {
        match parse_duration_seconds(token) {
            Ok(seconds) => Some(seconds),
            Err(error) => {
                warn!(
                    event_name = "agent.search.recipe_time_dropped",
                    recipe_time = token,
                    error = %error,
                    "ignoring malformed recipe time"
                );
                None
            }
        }
    });

    SearchOptions {
        allergy: context
            .allergies
            .iter()
            .map(|label| allergies.search_value_for_label(label).to_string())
            .collect(),
        time,
        excluded_ingredient: context.restrictions.clone(),
    }
}
