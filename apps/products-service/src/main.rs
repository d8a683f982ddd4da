//! Products service - NATS command handlers over PostgreSQL

use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{
    check_health_detailed, close, connect_from_config_with_retry, run_migrations,
};
use domain_products::{PgProductRepository, ProductHandler, ProductService};
use eyre::WrapErr;
use messaging::{CommandServer, MessageBroker, NatsBroker};
use migration::Migrator;
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod shutdown;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        nats_url = %config.nats.url,
        queue_group = %config.nats.queue_group,
        "Starting products service"
    );

    let db = connect_from_config_with_retry(config.postgres.clone(), None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    if config.run_migrations {
        run_migrations::<Migrator>(&db, "products-service").await?;
    }

    let health = check_health_detailed(&db).await;
    if health.healthy {
        info!(latency_ms = health.latency.as_millis() as u64, "PostgreSQL is healthy");
    } else {
        warn!(message = ?health.message, "PostgreSQL health check failed");
    }

    let broker = Arc::new(
        NatsBroker::connect(&config.nats)
            .await
            .wrap_err("Failed to connect to NATS")?,
    );

    let service = ProductService::new(PgProductRepository::new(db.clone()));
    let handler = Arc::new(ProductHandler::new(service));
    let server = CommandServer::new(broker.clone(), handler, &config.nats);

    let shutdown_rx = shutdown::spawn_shutdown_watch();
    server.run(shutdown_rx).await?;

    if let Err(e) = broker.flush().await {
        warn!(error = %e, "Failed to flush NATS connection");
    }
    close(db).await?;

    info!("Products service shutdown complete");
    Ok(())
}
