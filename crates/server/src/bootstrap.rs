use std::sync::Arc;

use recipebot_agent::{runtime::AgentRuntime, search::RecipeSearch, validator::SlotValidator};
use recipebot_core::config::{AppConfig, ConfigError, LoadOptions};
use recipebot_core::session::InMemorySessionStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::search::YummlyClient;

pub type SharedRuntime = Arc<AgentRuntime<Arc<dyn RecipeSearch>>>;

pub struct Application {
    pub config: AppConfig,
    pub runtime: SharedRuntime,
    pub sessions: Arc<InMemorySessionStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("recipe search client could not be built: {0}")]
    SearchClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        intent = %config.dialog.intent_name,
        allergies = config.dialog.allergies.len(),
        "starting application bootstrap"
    );

    let client = YummlyClient::from_config(&config.search).map_err(BootstrapError::SearchClient)?;
    if !config.search.has_credentials() {
        warn!(
            event_name = "system.bootstrap.search_unconfigured",
            correlation_id = "bootstrap",
            "search credentials are missing; fulfillment turns will fail until they are set"
        );
    }

    let search: Arc<dyn RecipeSearch> = Arc::new(client);
    let validator =
        SlotValidator::new(config.dialog.allergy_table(), config.dialog.done_sentinel.clone());
    let runtime = Arc::new(AgentRuntime::new(validator, config.dialog.intent_name.clone(), search));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        search_base_url = %config.search.base_url,
        "application bootstrap complete"
    );

    Ok(Application { config, runtime, sessions: Arc::new(InMemorySessionStore::default()) })
}
