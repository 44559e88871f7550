use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::allergy::{default_allergies, AllergyEntry, AllergyTable};

pub const DEFAULT_INTENT_NAME: &str = "FindRecipe";
pub const DEFAULT_DONE_SENTINEL: &str = "no";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub dialog: DialogConfig,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub base_url: String,
    pub app_id: Option<SecretString>,
    pub app_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub max_results: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub intent_name: String,
    pub done_sentinel: String,
    pub allergies: Vec<AllergyEntry>,
}

impl DialogConfig {
    pub fn allergy_table(&self) -> AllergyTable {
        AllergyTable::new(self.allergies.clone())
    }
}

impl SearchConfig {
    pub fn has_credentials(&self) -> bool {
        let present = |value: &Option<SecretString>| {
            value.as_ref().map(|secret| !secret.expose_secret().trim().is_empty()).unwrap_or(false)
        };
        present(&self.app_id) && present(&self.app_key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub search_base_url: Option<String>,
    pub search_app_id: Option<String>,
    pub search_app_key: Option<String>,
    pub server_bind_address: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                base_url: "http://api.yummly.com/v1/api/recipes".to_string(),
                app_id: None,
                app_key: None,
                timeout_secs: 10,
                max_results: 1,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            dialog: DialogConfig {
                intent_name: DEFAULT_INTENT_NAME.to_string(),
                done_sentinel: DEFAULT_DONE_SENTINEL.to_string(),
                allergies: default_allergies(),
            },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("recipebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(search) = patch.search {
            if let Some(base_url) = search.base_url {
                self.search.base_url = base_url;
            }
            if let Some(app_id) = search.app_id {
                self.search.app_id = Some(secret_value(app_id));
            }
            if let Some(app_key) = search.app_key {
                self.search.app_key = Some(secret_value(app_key));
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
            if let Some(max_results) = search.max_results {
                self.search.max_results = max_results;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(dialog) = patch.dialog {
            if let Some(intent_name) = dialog.intent_name {
                self.dialog.intent_name = intent_name;
            }
            if let Some(done_sentinel) = dialog.done_sentinel {
                self.dialog.done_sentinel = done_sentinel;
            }
            if let Some(allergies) = dialog.allergies {
                self.dialog.allergies = allergies;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RECIPEBOT_SEARCH_BASE_URL") {
            self.search.base_url = value;
        }
        let app_id = read_env("RECIPEBOT_SEARCH_APP_ID").or_else(|| read_env("AWS_YUMMLY_APP_ID"));
        if let Some(value) = app_id {
            self.search.app_id = Some(secret_value(value));
        }
        let app_key =
            read_env("RECIPEBOT_SEARCH_APP_KEY").or_else(|| read_env("AWS_YUMMLY_APP_KEY"));
        if let Some(value) = app_key {
            self.search.app_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("RECIPEBOT_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("RECIPEBOT_SEARCH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("RECIPEBOT_SEARCH_MAX_RESULTS") {
            self.search.max_results = parse_u32("RECIPEBOT_SEARCH_MAX_RESULTS", &value)?;
        }

        if let Some(value) = read_env("RECIPEBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RECIPEBOT_SERVER_PORT") {
            self.server.port = parse_u16("RECIPEBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("RECIPEBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("RECIPEBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("RECIPEBOT_LOGGING_LEVEL").or_else(|| read_env("RECIPEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RECIPEBOT_LOGGING_FORMAT").or_else(|| read_env("RECIPEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("RECIPEBOT_DIALOG_INTENT_NAME") {
            self.dialog.intent_name = value;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.search_base_url {
            self.search.base_url = base_url;
        }
        if let Some(app_id) = overrides.search_app_id {
            self.search.app_id = Some(secret_value(app_id));
        }
        if let Some(app_key) = overrides.search_app_key {
            self.search.app_key = Some(secret_value(app_key));
        }
        if let Some(bind_address) = overrides.server_bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_search(&self.search)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_dialog(&self.dialog)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("recipebot.toml"), PathBuf::from("config/recipebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Path of the config file `load` would read, if any.
pub fn detect_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    let base_url = search.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "search.base_url must start with http:// or https://".to_string(),
        ));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if search.max_results == 0 {
        return Err(ConfigError::Validation(
            "search.max_results must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_dialog(dialog: &DialogConfig) -> Result<(), ConfigError> {
    if dialog.intent_name.trim().is_empty() {
        return Err(ConfigError::Validation("dialog.intent_name must not be empty".to_string()));
    }
    if dialog.done_sentinel.trim().is_empty() {
        return Err(ConfigError::Validation("dialog.done_sentinel must not be empty".to_string()));
    }

    let mut seen = BTreeSet::new();
    for entry in &dialog.allergies {
        if entry.keyword.trim().is_empty() || entry.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "dialog.allergies entries need a non-empty keyword and label".to_string(),
            ));
        }
        if !seen.insert(entry.keyword.as_str()) {
            return Err(ConfigError::Validation(format!(
                "dialog.allergies keyword `{}` is listed more than once",
                entry.keyword
            )));
        }
        if entry.keyword == dialog.done_sentinel {
            return Err(ConfigError::Validation(format!(
                "dialog.allergies keyword `{}` collides with dialog.done_sentinel",
                entry.keyword
            )));
        }
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    search: Option<SearchPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    dialog: Option<DialogPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    base_url: Option<String>,
    app_id: Option<String>,
    app_key: Option<String>,
    timeout_secs: Option<u64>,
    max_results: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    intent_name: Option<String>,
    done_sentinel: Option<String>,
    allergies: Option<Vec<AllergyEntry>>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_KEYS: [&str; 6] = [
        "RECIPEBOT_SEARCH_APP_ID",
        "RECIPEBOT_SEARCH_APP_KEY",
        "AWS_YUMMLY_APP_ID",
        "AWS_YUMMLY_APP_KEY",
        "RECIPEBOT_LOG_LEVEL",
        "RECIPEBOT_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_without_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.search.has_credentials(), "no credentials should be configured")?;
        ensure(config.dialog.intent_name == "FindRecipe", "default intent should be FindRecipe")?;
        ensure(config.dialog.done_sentinel == "no", "default sentinel should be `no`")?;
        ensure(
            config.dialog.allergy_table().lookup("gluten").is_some(),
            "default allergy table should know gluten",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation_and_allergy_table() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);
        env::set_var("TEST_RECIPEBOT_APP_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("recipebot.toml");
            fs::write(
                &path,
                r#"
[search]
app_id = "app-from-file"
app_key = "${TEST_RECIPEBOT_APP_KEY}"

[[dialog.allergies]]
keyword = "gluten"
label = "Gluten-Free"
search_value = "393^Gluten-Free"

[[dialog.allergies]]
keyword = "nightshade"
label = "Nightshade-Free"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.search.has_credentials(), "credentials should be loaded")?;
            ensure(
                config.search.app_key.as_ref().map(|key| key.expose_secret() == "key-from-env")
                    == Some(true),
                "app key should be interpolated from environment",
            )?;
            let table = config.dialog.allergy_table();
            ensure(table.len() == 2, "file allergy table should replace defaults")?;
            ensure(table.lookup("nightshade").is_some(), "custom keyword should be present")?;
            ensure(table.lookup("egg").is_none(), "default keywords should be replaced")
        })();

        clear_vars(&["TEST_RECIPEBOT_APP_KEY"]);
        result
    }

    #[test]
    fn legacy_credential_env_vars_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);
        env::set_var("AWS_YUMMLY_APP_ID", "legacy-id");
        env::set_var("AWS_YUMMLY_APP_KEY", "legacy-key");
        env::set_var("RECIPEBOT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.search.has_credentials(), "legacy credentials should be read")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json log format should be read from the alias",
            )
        })();

        clear_vars(&ENV_KEYS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);
        env::set_var("RECIPEBOT_SEARCH_APP_ID", "id-from-env");
        env::set_var("RECIPEBOT_LOG_LEVEL", "warn");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("recipebot.toml");
            fs::write(
                &path,
                r#"
[search]
app_id = "id-from-file"
app_key = "key-from-file"

[server]
port = 9090

[logging]
level = "error"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 9090, "file port should win over default")?;
            ensure(config.logging.level == "debug", "override should win over env and file")?;
            ensure(
                config.search.app_id.as_ref().map(|id| id.expose_secret() == "id-from-env")
                    == Some(true),
                "env app id should win over file",
            )?;
            ensure(
                config.search.app_key.as_ref().map(|key| key.expose_secret() == "key-from-file")
                    == Some(true),
                "file app key should be kept when env is unset",
            )
        })();

        clear_vars(&ENV_KEYS);
        result
    }

    #[test]
    fn duplicate_allergy_keywords_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("recipebot.toml");
        fs::write(
            &path,
            r#"
[[dialog.allergies]]
keyword = "egg"
label = "Egg-Free"

[[dialog.allergies]]
keyword = "egg"
label = "Egg-Free"
"#,
        )
        .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..Default::default() }) {
                Ok(_) => return Err("expected duplicate keyword to fail validation".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("`egg`")),
            "validation failure should name the duplicate keyword",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_KEYS);

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                search_app_id: Some("id-secret-value".to_string()),
                search_app_key: Some("key-secret-value".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;
        let debug = format!("{config:?}");

        ensure(!debug.contains("id-secret-value"), "debug output should not contain app id")?;
        ensure(!debug.contains("key-secret-value"), "debug output should not contain app key")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }
}
