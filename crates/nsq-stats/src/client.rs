//! HTTP client for nsqd's stats endpoint.
//!
//! Each fetch is a single GET with no retries or caching; retry policy
//! belongs to the caller.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, Request, Uri};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::types::{decode_snapshot, Snapshot};

const USER_AGENT: &str = concat!("nsq-exporter/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce a stats snapshot on demand.
///
/// [`StatsClient`] is the production implementation; tests substitute
/// canned snapshots or failures.
pub trait StatsSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = FetchResult<Snapshot>> + Send;
}

/// Fetches snapshots from a single nsqd node.
#[derive(Clone)]
pub struct StatsClient {
    /// Stats address with `format=json` already applied.
    uri: Uri,
    client: Client<HttpConnector, Empty<Bytes>>,
    /// Per-request deadline. `None` waits as long as nsqd takes.
    timeout: Option<Duration>,
}

impl StatsClient {
    /// Create a client for an nsqd stats address such as
    /// `http://localhost:4151/stats`.
    pub fn new(address: &str) -> FetchResult<Self> {
        let base: Uri = address
            .parse()
            .map_err(|e| FetchError::InvalidAddress(format!("{address}: {e}")))?;

        match base.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(FetchError::InvalidAddress(format!(
                    "{address}: unsupported scheme {other}"
                )));
            }
            None => {
                return Err(FetchError::InvalidAddress(format!(
                    "{address}: missing scheme"
                )));
            }
        }
        if base.authority().is_none() {
            return Err(FetchError::InvalidAddress(format!(
                "{address}: missing host"
            )));
        }

        Ok(Self {
            uri: stats_uri(&base)?,
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout: None,
        })
    }

    /// Bound each fetch by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full URI requested on every fetch.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Fetch and decode one snapshot.
    pub async fn fetch_snapshot(&self) -> FetchResult<Snapshot> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.get())
                .await
                .map_err(|_| FetchError::Timeout(limit))?,
            None => self.get().await,
        }
    }

    async fn get(&self) -> FetchResult<Snapshot> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| FetchError::Request(error_chain(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, uri = %self.uri, "nsqd stats non-2xx");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Request(error_chain(&e)))?
            .to_bytes();

        debug!(bytes = body.len(), uri = %self.uri, "nsqd stats received");
        decode_snapshot(&body)
    }
}

impl StatsSource for StatsClient {
    fn fetch(&self) -> impl Future<Output = FetchResult<Snapshot>> + Send {
        self.fetch_snapshot()
    }
}

/// Append `format=json` to the address, keeping any existing query.
fn stats_uri(base: &Uri) -> FetchResult<Uri> {
    let path = base.path();
    let path_and_query = match base.query() {
        Some(q) if q.split('&').any(|kv| kv == "format=json") => format!("{path}?{q}"),
        Some(q) if !q.is_empty() => format!("{path}?{q}&format=json"),
        _ => format!("{path}?format=json"),
    };

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e| FetchError::InvalidAddress(format!("{base}: {e}")))?,
    );
    Uri::from_parts(parts).map_err(|e| FetchError::InvalidAddress(format!("{base}: {e}")))
}

/// Render an error with its source chain; hyper's top-level messages
/// alone ("client error (Connect)") hide the cause.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
