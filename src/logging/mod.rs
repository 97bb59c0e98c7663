// Structured logging, trimmed to what a synchronous crypto core and its
// demo binary need: one configuration struct and one initializer. The
// core's own operations emit tracing events directly (circuit length,
// hop index, tag-set size) -- never key material or shared secrets.
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{
    fmt::time::UtcTime,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub enable_colors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Text,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            enable_colors: true,
        }
    }
}

/// Logging manager
pub struct LoggingManager {
    config: LoggingConfig,
}

impl LoggingManager {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Initialize logging system
    pub fn initialize(&self) -> Result<(), String> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        match self.config.format {
            LogFormat::Json => {
                let subscriber = Registry::default()
                    .with(filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_timer(UtcTime::rfc_3339())
                    );

                subscriber.try_init().map_err(|e| e.to_string())?;
            }
            LogFormat::Text => {
                let subscriber = Registry::default()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer()
                        .with_ansi(self.config.enable_colors)
                        .with_timer(UtcTime::rfc_3339()));
                subscriber.try_init().map_err(|e| e.to_string())?;
            }
        }

        info!("logging initialized at level {}", self.config.level);
        Ok(())
    }
}
