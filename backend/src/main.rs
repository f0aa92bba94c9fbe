//! Rentals entry-point: loads settings, wires the orchestrators and serves
//! the REST API while the room-status reconciler runs alongside.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use rentals::inbound::http::health::HealthState;
use rentals::settings::RentalSettings;

use server::{ServerConfig, build_deployment, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RentalSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let deployment = build_deployment(&settings)?;
    let config = ServerConfig::from_settings(&settings);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = deployment.reconciler.clone();
    let reconciler_task = actix_web::rt::spawn(async move { reconciler.run(shutdown_rx).await });

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), deployment.http_state, config)?;
    info!(bind_addr = %config.bind_addr(), "rentals server listening");
    let served = server.await;

    health_state.mark_unhealthy();
    if shutdown_tx.send(true).is_err() {
        warn!("reconciler stopped before shutdown was signalled");
    }
    if let Err(e) = reconciler_task.await {
        warn!(error = %e, "reconciler task ended abnormally");
    }
    served
}
