use std::env;
use std::fs;
use std::path::Path;

use recipebot_core::config::{detect_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: EXIT_CONFIG,
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let config_file_path = detect_config_path();
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path.as_deref(),
    };

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.line("search.base_url", &config.search.base_url, &[
        "RECIPEBOT_SEARCH_BASE_URL",
    ]));
    lines.push(sources.line("search.app_id", &redact(config.search.app_id.as_ref()), &[
        "RECIPEBOT_SEARCH_APP_ID",
        "AWS_YUMMLY_APP_ID",
    ]));
    lines.push(sources.line("search.app_key", &redact(config.search.app_key.as_ref()), &[
        "RECIPEBOT_SEARCH_APP_KEY",
        "AWS_YUMMLY_APP_KEY",
    ]));
    lines.push(sources.line(
        "search.timeout_secs",
        &config.search.timeout_secs.to_string(),
        &["RECIPEBOT_SEARCH_TIMEOUT_SECS"],
    ));
    lines.push(sources.line(
        "search.max_results",
        &config.search.max_results.to_string(),
        &["RECIPEBOT_SEARCH_MAX_RESULTS"],
    ));

    lines.push(sources.line("server.bind_address", &config.server.bind_address, &[
        "RECIPEBOT_SERVER_BIND_ADDRESS",
    ]));
    lines.push(sources.line("server.port", &config.server.port.to_string(), &[
        "RECIPEBOT_SERVER_PORT",
    ]));
    lines.push(sources.line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        &["RECIPEBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    ));

    lines.push(sources.line("logging.level", &config.logging.level, &[
        "RECIPEBOT_LOGGING_LEVEL",
        "RECIPEBOT_LOG_LEVEL",
    ]));
    lines.push(sources.line("logging.format", &format!("{:?}", config.logging.format), &[
        "RECIPEBOT_LOGGING_FORMAT",
        "RECIPEBOT_LOG_FORMAT",
    ]));

    lines.push(sources.line("dialog.intent_name", &config.dialog.intent_name, &[
        "RECIPEBOT_DIALOG_INTENT_NAME",
    ]));
    lines.push(sources.line("dialog.done_sentinel", &config.dialog.done_sentinel, &[]));
    let keywords: Vec<&str> =
        config.dialog.allergies.iter().map(|entry| entry.keyword.as_str()).collect();
    lines.push(sources.line("dialog.allergies", &format!("[{}]", keywords.join(", ")), &[]));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

struct Sources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

impl Sources<'_> {
    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact(secret: Option<&SecretString>) -> String {
    match secret.map(|secret| secret.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
