//! HTTP client for the Yummly recipe search API.
//!
//! Requests carry the app id/key headers and the optional allergy, time, and excluded
//! ingredient filters; only the first match of a response is used.

use std::time::Duration;

use async_trait::async_trait;
use recipebot_agent::search::{RecipeSearch, SearchError};
use recipebot_core::config::SearchConfig;
use recipebot_core::domain::recipe::{RecipeDetails, SearchOptions};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

pub const APP_ID_HEADER: &str = "X-Yummly-App-ID";
pub const APP_KEY_HEADER: &str = "X-Yummly-App-Key";
pub const RECIPE_PAGE_BASE: &str = "https://www.yummly.com/recipe";

#[derive(Clone)]
pub struct YummlyClient {
    client: Client,
    base_url: String,
    app_id: Option<SecretString>,
    app_key: Option<SecretString>,
    max_results: u32,
}

impl YummlyClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
            max_results: config.max_results,
        })
    }

    fn credentials(&self) -> Result<(&str, &str), SearchError> {
        match (&self.app_id, &self.app_key) {
            (Some(id), Some(key)) => Ok((id.expose_secret(), key.expose_secret())),
            _ => Err(SearchError::NotConfigured(
                "search.app_id and search.app_key must both be set".to_string(),
            )),
        }
    }
}

/// Query parameters for one search. List filters repeat their key once per value.
pub fn build_query(
    term: &str,
    options: &SearchOptions,
    max_results: u32,
) -> Vec<(&'static str, String)> {
    let mut query = vec![("q", term.to_string()), ("maxResult", max_results.to_string())];
    query.extend(options.allergy.iter().map(|value| ("allowedAllergy[]", value.clone())));
    if let Some(seconds) = &options.time {
        query.push(("maxTotalTimeInSeconds", seconds.clone()));
    }
    query.extend(
        options.excluded_ingredient.iter().map(|value| ("excludedIngredient[]", value.clone())),
    );
    query
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub matches: Vec<RecipeMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMatch {
    pub id: String,
    pub recipe_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

pub fn first_match(term: &str, response: SearchResponse) -> Result<RecipeDetails, SearchError> {
    let recipe = response
        .matches
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::NoResults { term: term.to_string() })?;

    Ok(RecipeDetails {
        recipe_url: format!("{RECIPE_PAGE_BASE}/{}", recipe.id),
        name: recipe.recipe_name,
        scaled_ingredients: recipe.ingredients,
    })
}

#[async_trait]
impl RecipeSearch for YummlyClient {
    async fn search(
        &self,
        term: &str,
        options: &SearchOptions,
    ) -> Result<RecipeDetails, SearchError> {
        let (app_id, app_key) = self.credentials()?;
        let query = build_query(term, options, self.max_results);
        debug!(
            event_name = "search.request.sent",
            search_term = term,
            filters = query.len() - 2,
            "querying recipe search"
        );

        let response = self
            .client
            .get(&self.base_url)
            .header(APP_ID_HEADER, app_id)
            .header(APP_KEY_HEADER, app_key)
            .query(&query)
            .send()
            .await
            .map_err(|error| SearchError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Request(format!("recipe search returned {status}")));
        }

        let body: SearchResponse =
            response.json().await.map_err(|error| SearchError::Decode(error.to_string()))?;
        first_match(term, body)
    }
}
