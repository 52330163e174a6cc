use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use salvo::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::counter::VisitorCounter;
use crate::db::DatabaseManager;
use crate::quotes::QuoteClient;

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;

use self::error::ApiError;
use self::routes::create_router;

/// Shared per-process state, injected into every request's depot.
#[derive(Clone)]
pub struct AppState {
    pub counter: VisitorCounter,
    pub quotes: Option<Arc<QuoteClient>>,
    pub database: &'static str,
    pub metrics_enabled: bool,
    pub started_at: Instant,
    pub started_at_utc: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        counter: VisitorCounter,
        quotes: Option<Arc<QuoteClient>>,
        database: &'static str,
        metrics_enabled: bool,
    ) -> Self {
        Self {
            counter,
            quotes,
            database,
            metrics_enabled,
            started_at: Instant::now(),
            started_at_utc: Utc::now(),
        }
    }
}

pub fn app_state(depot: &Depot) -> Result<&AppState, ApiError> {
    depot
        .obtain::<AppState>()
        .map_err(|_| ApiError::MissingState)
}

pub struct WebServer {
    config: Arc<Config>,
    state: AppState,
}

impl WebServer {
    pub fn new(config: Arc<Config>, db_manager: &DatabaseManager) -> Result<Self> {
        let quotes = if config.quotes.enabled {
            Some(Arc::new(QuoteClient::new(&config.quotes)?))
        } else {
            None
        };

        let state = AppState::new(
            VisitorCounter::new(db_manager.counter_store()),
            quotes,
            db_manager.db_type().as_str(),
            config.metrics.enabled,
        );

        Ok(Self { config, state })
    }

    pub async fn start(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        let server = Server::new(acceptor);

        let handle = server.handle();
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("shutdown signal received, draining requests");
            handle.stop_graceful(Some(grace));
        });

        server.serve(create_router(self.state)).await;

        Ok(())
    }
}
