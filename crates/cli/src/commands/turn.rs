use std::fs;
use std::path::Path;

use anyhow::Context;
use recipebot_agent::runtime::AgentRuntime;
use recipebot_agent::search::NoopRecipeSearch;
use recipebot_agent::validator::SlotValidator;
use recipebot_core::config::{AppConfig, LoadOptions};
use recipebot_core::domain::turn::{InvocationSource, Turn};
use recipebot_core::errors::{ApplicationError, DomainError};
use recipebot_core::session::ConversationContext;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_INPUT};

/// Runs a single dialog code hook turn with a fresh conversation context.
pub fn run(path: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "turn",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let turn = match read_turn(path) {
        Ok(turn) => turn,
        Err(error) => {
            return CommandResult::failure(
                "turn",
                "input_validation",
                format!("{error:#}"),
                EXIT_INPUT,
            );
        }
    };

    if turn.invocation_source != InvocationSource::DialogCodeHook {
        return CommandResult::failure(
            "turn",
            "input_validation",
            "only DialogCodeHook turns can be run offline",
            EXIT_INPUT,
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "turn",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_INPUT,
            );
        }
    };

    let agent = AgentRuntime::new(
        SlotValidator::new(config.dialog.allergy_table(), config.dialog.done_sentinel.clone()),
        config.dialog.intent_name.clone(),
        NoopRecipeSearch,
    );
    let mut context = ConversationContext::default();

    match runtime.block_on(agent.handle(&turn, &mut context)) {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(encoded) => CommandResult::success("turn", encoded),
            Err(error) => CommandResult::failure(
                "turn",
                "serialization",
                error.to_string(),
                EXIT_INPUT,
            ),
        },
        Err(ApplicationError::Domain(DomainError::UnsupportedIntent { intent })) => {
            CommandResult::failure(
                "turn",
                "unsupported_intent",
                format!("intent `{intent}` is not handled (expected `{}`)", agent.intent_name()),
                EXIT_INPUT,
            )
        }
        Err(error) => CommandResult::failure("turn", "dialog", error.to_string(), EXIT_INPUT),
    }
}

fn read_turn(path: &Path) -> anyhow::Result<Turn> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read turn file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("turn file `{}` is not a valid platform turn", path.display()))
}
