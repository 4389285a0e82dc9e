//! Route handlers.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use tracing::debug;

use nsq_metrics::CONTENT_TYPE;
use nsq_stats::StatsSource;

use crate::ApiState;

/// GET {metrics_path}
///
/// Always 200: a failed nsqd fetch yields a body with no series.
pub async fn metrics<S: StatsSource + 'static>(State(state): State<ApiState<S>>) -> impl IntoResponse {
    let body = state.collector.scrape().await;
    debug!(bytes = body.len(), "scrape served");
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

/// GET /
pub async fn landing_page<S: StatsSource + 'static>(State(state): State<ApiState<S>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>NSQ Exporter</title></head>\n\
         <body>\n\
         <h1>NSQ Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.metrics_path
    ))
}
