//! Web server for Corkboard.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::session::SessionKeys;
use crate::config::Config;
use crate::db::Database;
use crate::{BoardError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    session_keys: Arc<SessionKeys>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server over an opened database.
    pub fn new(config: &Config, db: &Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| BoardError::Config(format!("invalid server address: {}", e)))?;

        let app_state = Arc::new(AppState::new(db, &config.auth));
        let session_keys = Arc::new(SessionKeys::new(
            &config.auth.session_secret,
            config.auth.session_days,
        ));

        Ok(Self {
            addr,
            app_state,
            session_keys,
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// The full router, health check included. Exposed for tests.
    pub fn router(&self) -> axum::Router {
        create_router(
            self.app_state.clone(),
            self.session_keys.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("web server listening on {}", self.addr);

        axum::serve(listener, router)
            .await
            .map_err(|e| BoardError::Config(format!("server error: {}", e)))?;
        Ok(())
    }
}
