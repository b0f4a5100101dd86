use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use prosperity_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One reported setting: dotted key, env override name, rendered value.
struct Setting {
    key: &'static str,
    env_key: &'static str,
    value: String,
}

impl Setting {
    fn new(key: &'static str, env_key: &'static str, value: impl Into<String>) -> Self {
        Self { key, env_key, value: value.into() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source = field_source(
            setting.key,
            setting.env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(setting.key, &setting.value, source));
    }

    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let unset = || "<unset>".to_string();
    vec![
        Setting::new("database.url", "PROSPERITY_DATABASE_URL", config.database.url.clone()),
        Setting::new(
            "database.max_connections",
            "PROSPERITY_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        Setting::new(
            "database.timeout_secs",
            "PROSPERITY_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        Setting::new(
            "discord.primary_bot_id",
            "PROSPERITY_DISCORD_PRIMARY_BOT_ID",
            config.discord.primary_bot_id.clone(),
        ),
        Setting::new(
            "discord.application_id",
            "PROSPERITY_DISCORD_APPLICATION_ID",
            config.discord.application_id(),
        ),
        Setting::new(
            "discord.public_key",
            "PROSPERITY_DISCORD_PUBLIC_KEY",
            config.discord.public_key.clone(),
        ),
        Setting::new(
            "discord.bot_token",
            "PROSPERITY_DISCORD_BOT_TOKEN",
            redact_token(config.discord.bot_token.expose_secret()),
        ),
        Setting::new(
            "discord.api_base_url",
            "PROSPERITY_DISCORD_API_BASE_URL",
            config.discord.api_base_url.clone(),
        ),
        Setting::new(
            "discord.dev_guild_id",
            "PROSPERITY_DISCORD_DEV_GUILD_ID",
            config.discord.dev_guild_id.clone().unwrap_or_else(unset),
        ),
        Setting::new(
            "discord.register_commands",
            "PROSPERITY_DISCORD_REGISTER_COMMANDS",
            config.discord.register_commands.to_string(),
        ),
        Setting::new(
            "server.bind_address",
            "PROSPERITY_SERVER_BIND_ADDRESS",
            config.server.bind_address.clone(),
        ),
        Setting::new("server.port", "PROSPERITY_SERVER_PORT", config.server.port.to_string()),
        Setting::new(
            "server.public_base_url",
            "PROSPERITY_SERVER_PUBLIC_BASE_URL",
            config.server.public_base_url.clone().unwrap_or_else(unset),
        ),
        Setting::new(
            "server.graceful_shutdown_secs",
            "PROSPERITY_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs.to_string(),
        ),
        Setting::new("logging.level", "PROSPERITY_LOGGING_LEVEL", config.logging.level.clone()),
        Setting::new(
            "logging.format",
            "PROSPERITY_LOGGING_FORMAT",
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("prosperity.toml"), PathBuf::from("config/prosperity.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Bot tokens are `<base64 bot id>.<timestamp>.<hmac>`; only the id segment is shown.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('.') {
        return format!("{prefix}.***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn token_keeps_only_the_id_segment() {
        assert_eq!(redact_token("MTAw.GaXb12.secret-part"), "MTAw.***");
        assert_eq!(redact_token("opaque"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn dotted_paths_are_found_in_toml() {
        let doc: toml::Value = "[discord]\npublic_key = \"ab\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "discord.public_key"));
        assert!(!contains_path(&doc, "discord.bot_token"));
    }
}
