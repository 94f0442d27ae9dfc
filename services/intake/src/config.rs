//! Configuration for the intake service.
//!
//! Loads configuration from environment variables with sensible defaults
//! for local development.

use std::env;

/// Intake service configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Kafka broker addresses (comma-separated).
    pub kafka_brokers: String,
    /// Topic carrying `CreateOrder` commands.
    pub commands_topic: String,
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl IntakeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            commands_topic: env::var("COMMANDS_TOPIC")
                .unwrap_or_else(|_| "ordenes.commands".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
        }
    }
}
