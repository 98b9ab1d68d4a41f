//! Wellspace HTTP server
//!
//! A hyper HTTP/1 accept loop in front of the `wellspace-lib` services.
//! Built as a library so tests can run it on an ephemeral port.

pub mod config;
mod error;
mod handlers;
mod http;
pub mod paths;
mod router;

use std::convert::Infallible;
use std::sync::Arc;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wellspace_lib::auth::PasswordHasher;
use wellspace_lib::auth::TokenSigner;
use wellspace_lib::service::AuthService;
use wellspace_lib::service::SessionService;
use wellspace_lib::store::SessionStore;
use wellspace_lib::store::SqliteStore;
use wellspace_lib::store::UserStore;

pub use config::ConfigError;
pub use config::Database;
pub use config::ServerConfig;
pub use error::ServerError;

/// Everything a request handler needs.
pub struct AppState {
    pub(crate) auth: AuthService,
    pub(crate) sessions: SessionService,
    pub(crate) config: ServerConfig,
}

impl AppState {
    /// Wires services over the given stores.
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ServerError> {
        let signer = TokenSigner::new(&config.token_secret)?.with_ttl(config.token_ttl);
        Ok(Self {
            auth: AuthService::new(users, signer),
            sessions: SessionService::new(sessions),
            config,
        })
    }

    /// Opens the configured SQLite database and wires services over it.
    pub async fn open(config: ServerConfig) -> Result<Self, ServerError> {
        let store = match &config.database {
            Database::Memory => SqliteStore::open_in_memory().await?,
            Database::File(path) => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                SqliteStore::open(path).await?
            }
        };
        log::info!("Using database {:?}", config.database);

        let store = Arc::new(store);
        Self::new(config, Arc::clone(&store) as Arc<dyn UserStore>, store)
    }

    /// Replaces the password hasher, e.g. with cheaper parameters in tests.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.auth = self.auth.with_hasher(hasher);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Serves connections from `listener` until `shutdown` is cancelled.
///
/// Open connections finish their current request before closing.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    log::info!("Listening on http://{}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    log::warn!("Accept failed: {err}");
                    continue;
                }
            },
        };

        let io = TokioIo::new(stream);
        let state = Arc::clone(&state);
        let shutdown = shutdown.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(router::handle(&state, req).await) }
            });

            let conn = http1::Builder::new().serve_connection(io, service);
            let mut conn = std::pin::pin!(conn);
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        log::debug!("Connection from {peer} closed: {err}");
                    }
                }
                _ = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    let _ = conn.await;
                }
            }
        });
    }

    log::info!("Server stopped");
    Ok(())
}
