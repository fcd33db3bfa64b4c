//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, handler, status
//! - `http_request_duration_seconds` (histogram): latency by method, handler
//! - `http_requests_in_progress` (gauge): requests currently being served
//!
//! `handler` is the matched route template. Requests that match no route are
//! recorded under `handler="none"` so arbitrary paths cannot blow up label
//! cardinality.

use std::sync::Mutex;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Gauge, Unit,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUESTS_IN_PROGRESS: &str = "http_requests_in_progress";

/// Label value for requests that matched no route.
pub const UNMATCHED_HANDLER: &str = "none";

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

static RECORDER: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the process-wide Prometheus recorder.
///
/// The `metrics` facade only accepts one global recorder, so the first call
/// wins: later calls return the installed handle and ignore `latency_buckets`.
pub fn install_recorder(latency_buckets: &[f64]) -> Result<PrometheusHandle, BuildError> {
    let mut slot = RECORDER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of requests by method, handler and status");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of handled requests"
    );
    describe_gauge!(HTTP_REQUESTS_IN_PROGRESS, "Number of requests currently in flight");

    tracing::debug!(buckets = ?latency_buckets, "Prometheus recorder installed");

    *slot = Some(handle.clone());
    Ok(handle)
}

/// Request instrumentation shared by the middleware and the fallback route.
#[derive(Debug, Clone, Copy)]
pub struct HttpMetrics {
    group_status_codes: bool,
}

impl HttpMetrics {
    pub fn new(group_status_codes: bool) -> Self {
        Self { group_status_codes }
    }

    /// Status label, either the exact code or its class ("2xx").
    pub fn status_label(&self, status: StatusCode) -> String {
        if self.group_status_codes {
            format!("{}xx", status.as_u16() / 100)
        } else {
            status.as_u16().to_string()
        }
    }

    /// Record a completed request.
    pub fn record(&self, method: &Method, handler: &str, status: StatusCode, started: Instant) {
        let method = method.to_string();
        let handler = handler.to_string();

        counter!(
            HTTP_REQUESTS_TOTAL,
            "method" => method.clone(),
            "handler" => handler.clone(),
            "status" => self.status_label(status)
        )
        .increment(1);

        histogram!(
            HTTP_REQUEST_DURATION_SECONDS,
            "method" => method,
            "handler" => handler
        )
        .record(started.elapsed().as_secs_f64());
    }
}

/// Middleware recording every request that reaches a route.
///
/// Must be attached with `Router::route_layer` so the [`MatchedPath`]
/// extension is already populated.
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_HANDLER.to_owned());

    let in_flight = InFlight::enter(&method, &handler);
    let response = next.run(request).await;
    drop(in_flight);

    metrics.record(&method, &handler, response.status(), started);

    response
}

/// Holds one slot of the in-progress gauge. Released on drop, so requests
/// cancelled by the timeout layer are accounted for too.
struct InFlight(Gauge);

impl InFlight {
    fn enter(method: &Method, handler: &str) -> Self {
        let gauge = gauge!(
            HTTP_REQUESTS_IN_PROGRESS,
            "method" => method.to_string(),
            "handler" => handler.to_string()
        );
        gauge.increment(1.0);
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}

/// Fallback for unmatched paths: a plain 404, counted under `handler="none"`.
pub async fn record_unmatched(State(metrics): State<HttpMetrics>, method: Method) -> StatusCode {
    let started = Instant::now();
    metrics.record(&method, UNMATCHED_HANDLER, StatusCode::NOT_FOUND, started);
    StatusCode::NOT_FOUND
}

/// Router exposing the scrape endpoint at `path`.
pub fn metrics_router<S>(path: &str, handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(path, get(render_metrics))
        .with_state(handle)
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        handle.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_grouped_by_class() {
        let metrics = HttpMetrics::new(true);
        assert_eq!(metrics.status_label(StatusCode::OK), "2xx");
        assert_eq!(metrics.status_label(StatusCode::METHOD_NOT_ALLOWED), "4xx");
        assert_eq!(metrics.status_label(StatusCode::BAD_GATEWAY), "5xx");
    }

    #[test]
    fn exact_status_codes_when_grouping_disabled() {
        let metrics = HttpMetrics::new(false);
        assert_eq!(metrics.status_label(StatusCode::OK), "200");
        assert_eq!(metrics.status_label(StatusCode::NOT_FOUND), "404");
    }

    #[test]
    fn second_install_returns_existing_handle() {
        let first = install_recorder(&[0.1, 0.5, 1.0]).unwrap();
        let second = install_recorder(&[2.0]).unwrap();

        counter!("recorder_reuse_check_total").increment(1);
        assert!(first.render().contains("recorder_reuse_check_total"));
        assert!(second.render().contains("recorder_reuse_check_total"));
    }
}
