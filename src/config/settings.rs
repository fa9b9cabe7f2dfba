use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub group: GroupSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Credentials and endpoints for both Telegram APIs.
///
/// The bot fields are used by the direct delivery mode, the client API
/// fields (`api_id`, `api_hash`, `session`) by the group mode.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// Timeout for a single Bot API call in seconds (0 disables it)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    /// Session name; the session is stored in `<session>.session`
    pub session: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Send one message to a fixed chat through the Bot API
    #[default]
    Direct,
    /// Create a group per submission through the client API
    Group,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Direct => "direct",
            DeliveryMode::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub mode: DeliveryMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSettings {
    /// Group title; `{{name}}`, `{{email}}` and `{{question}}` are substituted
    #[serde(default = "default_title_template")]
    pub title_template: String,
    /// Messages posted before the submission itself
    #[serde(default = "default_welcome_messages")]
    pub welcome_messages: Vec<String>,
    /// Usernames (`@name`) or phone numbers (`+15550100`) to invite
    #[serde(default)]
    pub invite: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    64 * 1024
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_title_template() -> String {
    "Support: {{name}}".to_string()
}

fn default_welcome_messages() -> Vec<String> {
    vec!["Welcome, {{name}}! This group was created for your question.".to_string()]
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("delivery.mode", "direct")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Nested keys: SERVER__PORT, TELEGRAM__REQUEST_TIMEOUT_SECS, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("group.invite")
                    .with_list_parse_key("group.welcome_messages"),
            );

        // Flat names: TELEGRAM_TOKEN, TELEGRAM_CHAT_ID, DELIVERY_MODE, GROUP_INVITE, ...
        for (var, key) in ENV_KEYS {
            builder = builder.set_override_option(*key, env_value(var))?;
        }
        for (var, key) in ENV_LIST_KEYS {
            builder = builder.set_override_option(*key, env_list(var))?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the credentials required by the selected delivery mode are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            return Err(ConfigError::Message(format!(
                "Missing required configuration for {} delivery: {}",
                self.delivery.mode.as_str(),
                missing.join(", ")
            )));
        }

        if self.delivery.mode == DeliveryMode::Group && !cfg!(feature = "mtproto") {
            return Err(ConfigError::Message(
                "Group delivery requires a build with the `mtproto` feature".to_string(),
            ));
        }

        Ok(())
    }

    fn missing_credentials(&self) -> Vec<&'static str> {
        let telegram = &self.telegram;
        let required: Vec<(&'static str, bool)> = match self.delivery.mode {
            DeliveryMode::Direct => vec![
                ("TELEGRAM_TOKEN", is_blank(&telegram.token)),
                ("TELEGRAM_CHAT_ID", is_blank(&telegram.chat_id)),
            ],
            DeliveryMode::Group => vec![
                ("TELEGRAM_API_ID", telegram.api_id.is_none()),
                ("TELEGRAM_API_HASH", is_blank(&telegram.api_hash)),
                ("TELEGRAM_SESSION", is_blank(&telegram.session)),
            ],
        };

        required
            .into_iter()
            .filter_map(|(key, missing)| missing.then_some(key))
            .collect()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

const ENV_KEYS: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_BODY_LIMIT_BYTES", "server.body_limit_bytes"),
    ("TELEGRAM_TOKEN", "telegram.token"),
    ("TELEGRAM_CHAT_ID", "telegram.chat_id"),
    ("TELEGRAM_API_BASE", "telegram.api_base"),
    ("TELEGRAM_PARSE_MODE", "telegram.parse_mode"),
    ("TELEGRAM_API_ID", "telegram.api_id"),
    ("TELEGRAM_API_HASH", "telegram.api_hash"),
    ("TELEGRAM_SESSION", "telegram.session"),
    ("DELIVERY_MODE", "delivery.mode"),
    ("GROUP_TITLE_TEMPLATE", "group.title_template"),
];

const ENV_LIST_KEYS: &[(&str, &str)] = &[
    ("GROUP_INVITE", "group.invite"),
    ("GROUP_WELCOME_MESSAGES", "group.welcome_messages"),
];

fn env_value(var: &str) -> Option<String> {
    env::var(var).ok()
}

fn env_list(var: &str) -> Option<Vec<String>> {
    env::var(var).ok().map(|raw| split_list(&raw))
}

/// Split a comma separated value, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

// Credentials stay out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("parse_mode", &self.parse_mode)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_id", &self.api_id)
            .field("api_hash", &self.api_hash.as_ref().map(|_| "<redacted>"))
            .field("session", &self.session)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            chat_id: None,
            api_base: default_api_base(),
            parse_mode: default_parse_mode(),
            request_timeout_secs: default_request_timeout(),
            api_id: None,
            api_hash: None,
            session: None,
        }
    }
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            title_template: default_title_template(),
            welcome_messages: default_welcome_messages(),
            invite: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_settings() -> Settings {
        Settings {
            server: ServerConfig::default(),
            telegram: TelegramConfig {
                token: Some("123:abc".to_string()),
                chat_id: Some("-100200".to_string()),
                ..TelegramConfig::default()
            },
            delivery: DeliveryConfig::default(),
            group: GroupSettings::default(),
        }
    }

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert_eq!(server.body_limit_bytes, 65536);

        let telegram = TelegramConfig::default();
        assert_eq!(telegram.api_base, "https://api.telegram.org");
        assert_eq!(telegram.parse_mode, "Markdown");
        assert_eq!(DeliveryMode::default(), DeliveryMode::Direct);
    }

    #[test]
    fn test_direct_mode_with_credentials_is_valid() {
        assert!(direct_settings().validate().is_ok());
    }

    #[test]
    fn test_direct_mode_reports_missing_credentials() {
        let mut settings = direct_settings();
        settings.telegram.token = None;
        settings.telegram.chat_id = Some("   ".to_string());

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("TELEGRAM_TOKEN, TELEGRAM_CHAT_ID"), "{err}");
    }

    #[test]
    fn test_group_mode_requires_client_credentials() {
        let mut settings = direct_settings();
        settings.delivery.mode = DeliveryMode::Group;

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("group delivery"), "{err}");
        assert!(err.contains("TELEGRAM_API_ID"));
        assert!(err.contains("TELEGRAM_API_HASH"));
        assert!(err.contains("TELEGRAM_SESSION"));
    }

    #[test]
    fn test_group_mode_does_not_need_bot_credentials() {
        let mut settings = direct_settings();
        settings.delivery.mode = DeliveryMode::Group;
        settings.telegram.token = None;
        settings.telegram.chat_id = None;
        settings.telegram.api_id = Some(12345);
        settings.telegram.api_hash = Some("hash".to_string());
        settings.telegram.session = Some("relay".to_string());

        let result = settings.validate();
        if cfg!(feature = "mtproto") {
            assert!(result.is_ok());
        } else {
            assert!(result.unwrap_err().to_string().contains("mtproto"));
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = direct_settings();
        settings.telegram.api_hash = Some("very-secret-hash".to_string());

        let debug = format!("{:?}", settings.telegram);
        assert!(!debug.contains("123:abc"));
        assert!(!debug.contains("very-secret-hash"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_delivery_mode_deserializes_lowercase() {
        let mode: DeliveryMode = serde_json::from_str("\"group\"").unwrap();
        assert_eq!(mode, DeliveryMode::Group);
        assert_eq!(mode.as_str(), "group");
    }

    #[test]
    fn test_split_list_drops_blank_entries() {
        assert_eq!(
            split_list("@alice, +15550100 ,,  "),
            vec!["@alice".to_string(), "+15550100".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    // Single test so the process-wide environment is not mutated concurrently.
    #[test]
    fn test_new_loads_flat_env_names() {
        let vars = [
            ("TELEGRAM_TOKEN", Some("123:abc")),
            ("TELEGRAM_CHAT_ID", Some("-100200")),
            ("SERVER_PORT", Some("9090")),
            ("GROUP_INVITE", Some("@alice, +15550100")),
            ("DELIVERY_MODE", None),
            ("SERVER_HOST", None),
        ];
        for (var, value) in vars {
            match value {
                Some(value) => env::set_var(var, value),
                None => env::remove_var(var),
            }
        }

        let settings = Settings::new().unwrap();
        assert_eq!(settings.telegram.token.as_deref(), Some("123:abc"));
        assert_eq!(settings.telegram.chat_id.as_deref(), Some("-100200"));
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server_addr(), "0.0.0.0:9090");
        assert_eq!(settings.group.invite, vec!["@alice", "+15550100"]);
        assert_eq!(settings.delivery.mode, DeliveryMode::Direct);

        env::remove_var("TELEGRAM_CHAT_ID");
        let err = Settings::new().unwrap_err().to_string();
        assert!(
            err.contains("Missing required configuration for direct delivery: TELEGRAM_CHAT_ID"),
            "{err}"
        );

        for (var, _) in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(direct_settings().server_addr(), "0.0.0.0:8080");
    }
}
