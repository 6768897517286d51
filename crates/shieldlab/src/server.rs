//! `ShieldlabServer` builder and server loop.
//!
//! Ties the layers together: config → session store → protocol service →
//! axum router → TCP listener, plus the background sweeper that evicts
//! idle sessions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use shieldlab_session::{Clock, SessionConfig, SessionStore, SystemClock};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};
use crate::service::CsrfProtocol;
use crate::{ServerConfig, ShieldlabError};

/// Builder for configuring and starting a Shieldlab server.
///
/// # Example
///
/// ```rust,ignore
/// use shieldlab::prelude::*;
///
/// let server = ShieldlabServer::builder()
///     .config(ServerConfig::load()?)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ShieldlabServerBuilder {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl ShieldlabServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the origin allowed to call the API with credentials.
    pub fn allowed_origin(mut self, origin: &str) -> Self {
        self.config.allowed_origin = origin.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the clock sessions expire against.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Assembles the router and protocol service without binding a socket.
    ///
    /// # Errors
    /// [`ShieldlabError::InvalidOrigin`] if the allowed origin isn't a
    /// valid header value.
    pub fn app(self) -> Result<ShieldlabApp, ShieldlabError> {
        let origin = HeaderValue::from_str(&self.config.allowed_origin)
            .map_err(|_| ShieldlabError::InvalidOrigin(self.config.allowed_origin.clone()))?;

        let store = SessionStore::with_clock(self.config.session.clone(), self.clock);
        let protocol = Arc::new(CsrfProtocol::new(store));
        let state = AppState {
            protocol: Arc::clone(&protocol),
            cookies: Arc::new(self.config.cookie.clone()),
        };

        // Credentialed CORS can't use wildcards: the origin, methods, and
        // headers are all listed explicitly.
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);

        let router = Router::new()
            .route("/api/login", post(handler::login))
            .route("/api/csrf-token", get(handler::csrf_token))
            .route("/api/change-email", post(handler::change_email))
            .route("/api/change-email-no-token", post(handler::change_email_no_token))
            .route("/api/health", get(handler::health))
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        Ok(ShieldlabApp {
            router,
            protocol,
            config: self.config,
        })
    }

    /// Builds the app and binds the listener.
    pub async fn build(self) -> Result<ShieldlabServer, ShieldlabError> {
        let app = self.app()?;
        let listener = TcpListener::bind(&app.config.bind_addr).await?;
        tracing::info!(addr = %app.config.bind_addr, "listener bound");
        Ok(ShieldlabServer { listener, app })
    }
}

impl Default for ShieldlabServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The assembled application, not yet bound to a socket.
pub struct ShieldlabApp {
    router: Router,
    protocol: Arc<CsrfProtocol>,
    config: ServerConfig,
}

impl ShieldlabApp {
    /// The HTTP router. Cheap to clone.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The protocol service behind the router.
    pub fn protocol(&self) -> Arc<CsrfProtocol> {
        Arc::clone(&self.protocol)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// A bound Shieldlab server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct ShieldlabServer {
    listener: TcpListener,
    app: ShieldlabApp,
}

impl ShieldlabServer {
    /// Creates a new builder.
    pub fn builder() -> ShieldlabServerBuilder {
        ShieldlabServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn app(&self) -> &ShieldlabApp {
        &self.app
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), ShieldlabError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `shutdown` completes, then drains in-flight
    /// requests and stops the sweeper.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ShieldlabError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sweeper = spawn_sweeper(self.app.protocol(), &self.app.config.session);
        tracing::info!(addr = ?self.listener.local_addr().ok(), "Shieldlab server running");

        let result = axum::serve(self.listener, self.app.router)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("Shieldlab server stopped");
        Ok(result?)
    }
}

/// Starts the periodic idle-session sweep.
///
/// Returns `None` (no task) when expiry or sweeping is disabled.
pub(crate) fn spawn_sweeper(
    protocol: Arc<CsrfProtocol>,
    config: &SessionConfig,
) -> Option<JoinHandle<()>> {
    if config.idle_timeout().is_none() || config.sweep_interval_secs == 0 {
        tracing::debug!("session sweeper disabled");
        return None;
    }
    let period = Duration::from_secs(config.sweep_interval_secs);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; there's nothing to sweep yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = protocol.expire_stale().await;
            tracing::debug!(removed, "session sweep finished");
        }
    }))
}

#[cfg(test)]
mod tests {
    use shieldlab_session::ManualClock;

    use super::*;

    fn protocol_with(clock: Arc<ManualClock>, config: &SessionConfig) -> Arc<CsrfProtocol> {
        Arc::new(CsrfProtocol::new(SessionStore::with_clock(config.clone(), clock)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_sweeper_evicts_idle_sessions_each_interval() {
        let config = SessionConfig {
            idle_timeout_secs: 60,
            sweep_interval_secs: 30,
        };
        let clock = Arc::new(ManualClock::new());
        let protocol = protocol_with(clock.clone(), &config);
        protocol.issue_or_fetch_token(None).await;
        let sweeper = spawn_sweeper(Arc::clone(&protocol), &config).expect("enabled");

        // Session goes idle in store time; the sweeper runs on Tokio time.
        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(protocol.session_count().await, 0);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_spawn_sweeper_disabled_without_idle_timeout() {
        let config = SessionConfig {
            idle_timeout_secs: 0,
            sweep_interval_secs: 30,
        };
        let protocol = protocol_with(Arc::new(ManualClock::new()), &config);

        assert!(spawn_sweeper(protocol, &config).is_none());
    }

    #[tokio::test]
    async fn test_app_rejects_invalid_origin() {
        let result = ShieldlabServerBuilder::new()
            .allowed_origin("http://bad\norigin")
            .app();

        assert!(matches!(result, Err(ShieldlabError::InvalidOrigin(_))));
    }

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let server = ShieldlabServer::builder()
            .bind("127.0.0.1:0")
            .build()
            .await
            .expect("bind should succeed");

        let addr = server.local_addr().expect("bound");
        assert_ne!(addr.port(), 0);
    }
}
