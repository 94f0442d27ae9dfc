//! Command Intake server.
//!
//! # Usage
//!
//! ```bash
//! KAFKA_BROKERS=localhost:9092 \
//! COMMANDS_TOPIC=ordenes.commands \
//! PORT=8080 \
//!   cargo run --bin medisupply-intake
//! ```

use medisupply_intake::{IntakeConfig, IntakeService, intake_router};
use medisupply_pubsub::KafkaPublisher;
use medisupply_web::{health_router, init_tracing, serve};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("medisupply_intake=info,tower_http=info");

    let config = IntakeConfig::from_env();
    info!(
        brokers = %config.kafka_brokers,
        topic = %config.commands_topic,
        "Starting Command Intake"
    );

    let publisher = KafkaPublisher::builder()
        .brokers(&config.kafka_brokers)
        .acks("all")
        .build()?;
    let service = IntakeService::new(Arc::new(publisher), config.commands_topic.clone());

    let app = intake_router(service).merge(health_router("intake"));
    serve(app, &config.host, config.port).await?;

    Ok(())
}
