use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Credentials and API settings for the primary bot.
#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub primary_bot_id: String,
    pub application_id: Option<String>,
    pub public_key: String,
    pub bot_token: SecretString,
    pub api_base_url: String,
    pub dev_guild_id: Option<String>,
    pub register_commands: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub public_base_url: Option<String>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub primary_bot_id: Option<String>,
    pub public_key: Option<String>,
    pub bot_token: Option<String>,
    pub port: Option<u16>,
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
            database: DatabaseConfig {
                url: "sqlite://prosperity.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            discord: DiscordConfig {
                primary_bot_id: String::new(),
                application_id: None,
                public_key: String::new(),
                bot_token: String::new().into(),
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                dev_guild_id: None,
                register_commands: false,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: None,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl DiscordConfig {
    /// Application id used for command publication; the bot id doubles as it by default.
    pub fn application_id(&self) -> &str {
        self.application_id.as_deref().unwrap_or(&self.primary_bot_id)
    }
}

impl ServerConfig {
    /// Public URL a tenant owner pastes into the developer portal as the interactions endpoint.
    pub fn interactions_url(&self, tenant_id: &str) -> String {
        let base = self
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.bind_address, self.port));
        format!("{}/interactions/{tenant_id}", base.trim_end_matches('/'))
    }
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("prosperity.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(discord) = patch.discord {
            if let Some(primary_bot_id) = discord.primary_bot_id {
                self.discord.primary_bot_id = primary_bot_id;
            }
            if let Some(application_id) = discord.application_id {
                self.discord.application_id = Some(application_id);
            }
            if let Some(public_key) = discord.public_key {
                self.discord.public_key = public_key;
            }
            if let Some(bot_token) = discord.bot_token {
                self.discord.bot_token = bot_token.into();
            }
            if let Some(api_base_url) = discord.api_base_url {
                self.discord.api_base_url = api_base_url;
            }
            if let Some(dev_guild_id) = discord.dev_guild_id {
                self.discord.dev_guild_id = Some(dev_guild_id);
            }
            if let Some(register_commands) = discord.register_commands {
                self.discord.register_commands = register_commands;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_base_url) = server.public_base_url {
                self.server.public_base_url = Some(public_base_url);
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
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PROSPERITY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PROSPERITY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("PROSPERITY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PROSPERITY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("PROSPERITY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PROSPERITY_DISCORD_PRIMARY_BOT_ID") {
            self.discord.primary_bot_id = value;
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_APPLICATION_ID") {
            self.discord.application_id = Some(value);
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_PUBLIC_KEY") {
            self.discord.public_key = value;
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = value.into();
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_API_BASE_URL") {
            self.discord.api_base_url = value;
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_DEV_GUILD_ID") {
            self.discord.dev_guild_id = Some(value);
        }
        if let Some(value) = read_env("PROSPERITY_DISCORD_REGISTER_COMMANDS") {
            self.discord.register_commands =
                parse_bool("PROSPERITY_DISCORD_REGISTER_COMMANDS", &value)?;
        }

        if let Some(value) = read_env("PROSPERITY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        let port = read_env("PROSPERITY_SERVER_PORT").or_else(|| read_env("PORT"));
        if let Some(value) = port {
            self.server.port = parse_u16("PROSPERITY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PROSPERITY_SERVER_PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(value);
        }
        if let Some(value) = read_env("PROSPERITY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PROSPERITY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("PROSPERITY_LOGGING_LEVEL").or_else(|| read_env("PROSPERITY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PROSPERITY_LOGGING_FORMAT").or_else(|| read_env("PROSPERITY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(primary_bot_id) = overrides.primary_bot_id {
            self.discord.primary_bot_id = primary_bot_id;
        }
        if let Some(public_key) = overrides.public_key {
            self.discord.public_key = public_key;
        }
        if let Some(bot_token) = overrides.bot_token {
            self.discord.bot_token = bot_token.into();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_discord(&self.discord)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("prosperity.toml"), PathBuf::from("config/prosperity.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn is_snowflake(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.primary_bot_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "discord.primary_bot_id is required. Find it on the developer portal under General Information > Application ID".to_string(),
        ));
    }
    if !is_snowflake(&discord.primary_bot_id) {
        return Err(ConfigError::Validation(
            "discord.primary_bot_id must be a numeric snowflake id".to_string(),
        ));
    }
    if let Some(application_id) = &discord.application_id {
        if !is_snowflake(application_id) {
            return Err(ConfigError::Validation(
                "discord.application_id must be a numeric snowflake id".to_string(),
            ));
        }
    }

    let public_key = discord.public_key.trim();
    if public_key.is_empty() {
        return Err(ConfigError::Validation(
            "discord.public_key is required. Find it on the developer portal under General Information > Public Key".to_string(),
        ));
    }
    if public_key.len() != 64 || !public_key.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(ConfigError::Validation(
            "discord.public_key must be 64 hex characters (an ed25519 public key)".to_string(),
        ));
    }

    if discord.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "discord.bot_token is required. Find it on the developer portal under Bot > Token"
                .to_string(),
        ));
    }

    if !discord.api_base_url.starts_with("http://") && !discord.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "discord.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if let Some(guild_id) = &discord.dev_guild_id {
        if !is_snowflake(guild_id) {
            return Err(ConfigError::Validation(
                "discord.dev_guild_id must be a numeric snowflake id".to_string(),
            ));
        }
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

    if let Some(base_url) = &server.public_base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "server.public_base_url must start with http:// or https://".to_string(),
            ));
        }
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

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    discord: Option<DiscordPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    primary_bot_id: Option<String>,
    application_id: Option<String>,
    public_key: Option<String>,
    bot_token: Option<String>,
    api_base_url: Option<String>,
    dev_guild_id: Option<String>,
    register_commands: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_base_url: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
