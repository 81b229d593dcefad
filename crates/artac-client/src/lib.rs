//! # artac-client
//!
//! Client-side communication session for the ARTAC dashboard.
//!
//! - **session**: optimistic sends, startup with bounded timeout, health
//!   reconciliation between online and offline data
//! - **merge**: de-duplication of remote and locally cached messages
//! - **ceo**: routing to the CEO agent and its canned offline replies
//! - **remote**: the backend contract and its HTTP implementation
//! - **fallback**: the fixed dataset shown while offline

pub mod ceo;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod health;
pub mod merge;
pub mod remote;
pub mod session;
pub mod state;

use tracing_subscriber::EnvFilter;

use artac_store::Database;

pub use config::ClientConfig;
pub use error::{ClientError, RemoteError, Result};
pub use events::SessionEvent;
pub use remote::{HttpRemote, RemoteService};
pub use session::{CommunicationSession, PendingSend};
pub use state::{SessionMode, SessionState};

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("artac_client=debug,artac_store=info,warn")),
        )
        .with_target(true)
        .init();
}

/// Open the message cache at the configured path, or the per-user default.
pub fn open_cache(config: &ClientConfig) -> Result<Database> {
    let db = match &config.cache_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    Ok(db)
}
