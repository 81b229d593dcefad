//! # artac-client
//!
//! Headless driver for the communication session. Brings the session up,
//! keeps the health loop running and logs every session event as JSON until
//! interrupted.

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use artac_client::{init_tracing, open_cache, ClientConfig, CommunicationSession, HttpRemote};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Tracing and configuration
    // -----------------------------------------------------------------------
    init_tracing();
    info!("Starting ARTAC client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 2. Subsystems
    // -----------------------------------------------------------------------
    let cache = match open_cache(&config) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, "Message cache unavailable, continuing without it");
            None
        }
    };

    let remote = HttpRemote::new(&config.api_url, config.startup_timeout)?;
    let session = CommunicationSession::new(config, remote, cache);
    let mut events = session.subscribe();

    // -----------------------------------------------------------------------
    // 3. Startup
    // -----------------------------------------------------------------------
    let mode = session.initialize().await;
    info!(?mode, "Session initialized");
    session.start_health_checks();

    // -----------------------------------------------------------------------
    // 4. Event loop
    // -----------------------------------------------------------------------
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => info!(event = %serde_json::to_string(&event)?, "session event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event receiver lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    session.shutdown().await;
    Ok(())
}
