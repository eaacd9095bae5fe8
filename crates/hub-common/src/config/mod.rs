//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, Environment, HubSettings, RedisConfig,
    ServerConfig, WebSocketConfig,
};
