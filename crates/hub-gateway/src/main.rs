//! Hub server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p hub-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use hub_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration before tracing so the log format follows APP_ENV
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(AppError::from(e).exit_code());
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, code = e.error_code(), "Hub server failed");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.gateway.address(),
        redis = config.redis.is_some(),
        "Configuration loaded"
    );

    hub_gateway::run(config).await?;

    info!("Hub server stopped");
    Ok(())
}
