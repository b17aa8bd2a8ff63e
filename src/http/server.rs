//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: the proxy route plus the console (when enabled)
//! - Wire up middleware (request id, tracing)
//! - Hold the current [`ForwardProxy`] and swap it on config reload
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::console::{self, ConsoleState};
use crate::http::request::request_span;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::proxy::{ForwardProxy, ProxyBuildError};
use crate::resilience::Deadlines;

pub const PROXY_PATH: &str = "/proxy";

/// How often expired console sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Proxy(#[from] ProxyBuildError),
    #[error("failed to build backend API client: {0}")]
    Backend(#[source] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ArcSwap<ForwardProxy>>,
}

/// HTTP server for the relay and the console.
pub struct HttpServer {
    state: AppState,
    console: Option<ConsoleState>,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let proxy = ForwardProxy::from_config(&config)?;
        if proxy.policy().is_open() {
            tracing::warn!("proxy.allowed_hosts is empty, relaying to any host");
        }

        let console = if config.console.enabled {
            let deadlines = Deadlines::from(&config.timeouts);
            Some(ConsoleState::new(&config.console, &deadlines).map_err(ServerError::Backend)?)
        } else {
            None
        };

        Ok(Self {
            state: AppState {
                proxy: Arc::new(ArcSwap::from_pointee(proxy)),
            },
            console,
            config,
        })
    }

    /// The full application router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route(PROXY_PATH, get(proxy_handler))
            .with_state(self.state.clone());

        if let Some(console_state) = &self.console {
            router = router.merge(console::router(
                console_state.clone(),
                self.config.console.max_form_bytes,
                Duration::from_secs(self.config.timeouts.request_secs),
            ));
        }

        // Last layer runs first: assign the id, open the span, echo the id.
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Current proxy snapshot.
    pub fn proxy(&self) -> Arc<ForwardProxy> {
        self.state.proxy.load_full()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires. Configs arriving on
    /// `config_updates` replace the proxy for subsequent requests; in-flight
    /// relays finish on the snapshot they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<AppConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_reloads(self.state.proxy.clone(), config_updates));

        if let Some(console) = &self.console {
            tokio::spawn(sweep_sessions(console.clone(), shutdown.clone()));
        }

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_reloads(
    proxy: Arc<ArcSwap<ForwardProxy>>,
    mut updates: mpsc::UnboundedReceiver<AppConfig>,
) {
    while let Some(config) = updates.recv().await {
        match ForwardProxy::from_config(&config) {
            Ok(next) => {
                if next.policy().is_open() {
                    tracing::warn!("Reloaded config has no allowed_hosts, relaying to any host");
                }
                proxy.store(Arc::new(next));
                tracing::info!("Proxy configuration reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected reloaded proxy configuration, keeping current one");
            }
        }
    }
}

async fn sweep_sessions(console: ConsoleState, shutdown: ShutdownSignal) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    let stopped = shutdown.recv();
    tokio::pin!(stopped);
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = interval.tick() => {}
        }
        let purged = console.sessions.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, remaining = console.sessions.len(), "Expired console sessions swept");
        }
    }
}

/// First `url` value in the query string. Later repeats are ignored.
fn target_param(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find_map(|(key, value)| (key == "url").then_some(value))
        .unwrap_or_default()
}

/// `GET /proxy?url=<target>`: relay the target's response.
async fn proxy_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let start = Instant::now();
    let proxy = state.proxy.load_full();
    let target = target_param(params);

    match proxy.fetch(&target).await {
        Ok(upstream) => {
            tracing::debug!(status = %upstream.status(), "Upstream responded");
            metrics::record_proxy_request(upstream.status().as_u16(), start);
            upstream.into_response()
        }
        Err(e) => {
            match e.failure_kind() {
                Some(kind) => {
                    tracing::warn!(kind, error = %e, "Upstream fetch failed");
                    metrics::record_upstream_failure(kind);
                }
                None => tracing::debug!(error = %e, "Rejected proxy request"),
            }
            metrics::record_proxy_request(e.status().as_u16(), start);
            e.into_response()
        }
    }
}
