//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router (root greeting, metrics scrape route)
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Serve on a bound listener until shutdown
//! - Apply greeting updates from reloaded configuration

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{extract::FromRef, middleware, routing::get, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusHandle};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::greeting::{greet, Greeting};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics::{self, HttpMetrics};

/// Errors raised while setting up or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    greeting: Arc<ArcSwap<Greeting>>,
    metrics: HttpMetrics,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            greeting: Arc::new(ArcSwap::from_pointee(Greeting::from(&config.greeting))),
            metrics: HttpMetrics::new(config.observability.group_status_codes),
        }
    }

    /// Current greeting snapshot.
    pub fn greeting(&self) -> Arc<Greeting> {
        self.greeting.load_full()
    }

    /// Swap in the greeting from a reloaded configuration.
    /// Returns whether the payload changed.
    pub fn apply(&self, config: &ServiceConfig) -> bool {
        let next = Greeting::from(&config.greeting);
        if *self.greeting.load_full() == next {
            return false;
        }

        tracing::info!(
            version = %next.version,
            environment = next.environment.as_deref().unwrap_or("-"),
            "Greeting updated"
        );
        self.greeting.store(Arc::new(next));
        true
    }
}

impl FromRef<AppState> for HttpMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics
    }
}

/// HTTP server for the greeting service.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Installs the global Prometheus recorder when metrics are enabled.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config);

        let metrics_handle = if config.observability.metrics_enabled {
            Some(metrics::install_recorder(&config.observability.latency_buckets)?)
        } else {
            None
        };

        let router = Self::build_router(&config, state.clone(), metrics_handle);
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Router {
        let mut router = Router::new().route("/", get(greet));

        if let Some(handle) = metrics_handle {
            router = router
                .merge(metrics::metrics_router(&config.observability.metrics_path, handle))
                .route_layer(middleware::from_fn_with_state(
                    state.metrics,
                    metrics::track_metrics,
                ))
                .fallback(metrics::record_unmatched);
        }

        with_service_layers(
            router.with_state(state),
            Duration::from_secs(config.timeouts.request_secs),
        )
    }

    /// The assembled router, for driving the service in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the greeting; other
    /// sections only take effect after a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            version = %self.state.greeting().version,
            metrics_enabled = self.config.observability.metrics_enabled,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let running = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if config.listener != running.listener
                    || config.timeouts != running.timeouts
                    || config.observability != running.observability
                {
                    tracing::warn!("Only the greeting is reloaded; restart to apply other changes");
                }
                state.apply(&config);
            }
        });

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reloader.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Request ID, tracing and timeout layers shared by every route.
/// Requests exceeding `request_timeout` get a 408.
#[allow(deprecated)]
fn with_service_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}
