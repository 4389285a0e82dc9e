//! nsq-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `{metrics_path}` (default `/metrics`) | Prometheus exposition, one nsqd fetch per request |
//! | GET | `/` | Landing page linking the metrics path (only when the metrics path is not `/`) |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use nsq_metrics::Collector;
use nsq_stats::StatsSource;
use thiserror::Error;

/// A metrics path the router cannot mount verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid metrics path {0:?}: must not contain '{{', '}}', '*' or ':'")]
pub struct InvalidMetricsPath(pub String);

/// Shared state for route handlers.
pub struct ApiState<S> {
    pub collector: Arc<Collector<S>>,
    pub metrics_path: Arc<str>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            metrics_path: Arc::clone(&self.metrics_path),
        }
    }
}

/// Build the exporter router.
pub fn build_router<S>(
    collector: Arc<Collector<S>>,
    metrics_path: &str,
) -> Result<Router, InvalidMetricsPath>
where
    S: StatsSource + 'static,
{
    let metrics_path = normalize_metrics_path(metrics_path)?;
    let state = ApiState {
        collector,
        metrics_path: Arc::from(metrics_path.as_str()),
    };

    let mut router = Router::new().route(&metrics_path, get(handlers::metrics::<S>));
    if metrics_path != "/" {
        router = router.route("/", get(handlers::landing_page::<S>));
    }
    Ok(router.with_state(state))
}

/// Ensure a metrics path is non-empty and starts with `/`.
///
/// Paths carrying route syntax (captures or wildcards) are rejected, since
/// the router would otherwise treat them as patterns.
pub fn normalize_metrics_path(path: &str) -> Result<String, InvalidMetricsPath> {
    let path = path.trim();
    if path.contains(['{', '}', '*', ':']) {
        return Err(InvalidMetricsPath(path.to_string()));
    }
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("/{path}"))
    }
}
