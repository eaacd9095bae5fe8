//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    /// Redis backend; `None` runs the hub with in-process pub/sub and presence
    pub redis: Option<RedisConfig>,
    pub hub: HubSettings,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Listen address
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Protocol engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Namespace prepended to every broker channel
    #[serde(default = "default_pubsub_prefix")]
    pub pubsub_prefix: String,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,
    /// Depth of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Per-message handler deadline; 0 disables it
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_ms: u64,
    #[serde(default = "default_presence_ttl")]
    pub presence_ttl_secs: u64,
}

impl HubSettings {
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    #[must_use]
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    #[must_use]
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }

    #[must_use]
    pub fn presence_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_ttl_secs)
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            pubsub_prefix: default_pubsub_prefix(),
            cleanup_interval_secs: default_cleanup_interval(),
            inactivity_timeout_secs: default_inactivity_timeout(),
            outbound_buffer: default_outbound_buffer(),
            handler_timeout_ms: default_handler_timeout(),
            presence_ttl_secs: default_presence_ttl(),
        }
    }
}

/// Transport sizing
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    #[serde(default = "default_buffer_size")]
    pub write_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            write_buffer_size: default_buffer_size(),
        }
    }
}

/// Origin checking for the upgrade route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Empty allows every origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Check an `Origin` header value against the allow-list
    #[must_use]
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        origin.is_some_and(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
    }
}

// Default value functions
fn default_app_name() -> String {
    "collab-hub".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_pubsub_prefix() -> String {
    "sharedb:".to_string()
}

fn default_cleanup_interval() -> u64 {
    30
}

fn default_inactivity_timeout() -> u64 {
    300 // 5 minutes
}

fn default_outbound_buffer() -> usize {
    100
}

fn default_handler_timeout() -> u64 {
    30_000
}

fn default_presence_ttl() -> u64 {
    300
}

fn default_max_message_size() -> usize {
    1 << 20
}

fn default_buffer_size() -> usize {
    1024
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        Ok(Self {
            app: AppSettings {
                name: vars.string("APP_NAME").unwrap_or_else(default_app_name),
                env: match vars.string("APP_ENV") {
                    Some(s) => match s.to_lowercase().as_str() {
                        "production" => Environment::Production,
                        "staging" => Environment::Staging,
                        "development" => Environment::Development,
                        _ => return Err(ConfigError::InvalidValue("APP_ENV", s)),
                    },
                    None => default_env(),
                },
            },
            gateway: ServerConfig {
                host: vars.string("GATEWAY_HOST").unwrap_or_else(default_host),
                port: vars.parse("GATEWAY_PORT")?.unwrap_or_else(default_port),
            },
            redis: match vars.string("REDIS_URL") {
                Some(url) => Some(RedisConfig {
                    url,
                    max_connections: vars
                        .parse("REDIS_MAX_CONNECTIONS")?
                        .unwrap_or_else(default_redis_max_connections),
                }),
                None => None,
            },
            hub: HubSettings {
                pubsub_prefix: vars
                    .string("PUBSUB_PREFIX")
                    .unwrap_or_else(default_pubsub_prefix),
                cleanup_interval_secs: vars
                    .parse("CLEANUP_INTERVAL_SECS")?
                    .unwrap_or_else(default_cleanup_interval),
                inactivity_timeout_secs: vars
                    .parse("INACTIVITY_TIMEOUT_SECS")?
                    .unwrap_or_else(default_inactivity_timeout),
                outbound_buffer: vars
                    .parse("OUTBOUND_BUFFER")?
                    .unwrap_or_else(default_outbound_buffer),
                handler_timeout_ms: vars
                    .parse("HANDLER_TIMEOUT_MS")?
                    .unwrap_or_else(default_handler_timeout),
                presence_ttl_secs: vars
                    .parse("PRESENCE_TTL_SECS")?
                    .unwrap_or_else(default_presence_ttl),
            },
            websocket: WebSocketConfig {
                max_message_size: vars
                    .parse("WS_MAX_MESSAGE_SIZE")?
                    .unwrap_or_else(default_max_message_size),
                write_buffer_size: vars
                    .parse("WS_WRITE_BUFFER_SIZE")?
                    .unwrap_or_else(default_buffer_size),
            },
            cors: CorsConfig {
                allowed_origins: vars
                    .string("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

/// Typed access to a variable lookup
struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &'static str) -> Option<String> {
        (self.0)(key).filter(|s| !s.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.string(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(None),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
