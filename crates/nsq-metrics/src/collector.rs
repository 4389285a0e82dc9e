//! Scrape collector — fetches a snapshot per scrape and publishes it.
//!
//! Each scrape stages a fresh [`ChannelGauges`] from the fetched snapshot,
//! then swaps it into the published set and renders it under one lock, so
//! a response always reflects exactly one scrape's complete value set.
//! Series for channels that disappeared from nsqd are dropped by the swap.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use nsq_stats::{StatsClient, StatsSource};

use crate::gauge::{ChannelGauges, GaugeDesc};
use crate::prometheus::render_prometheus;

/// Result of the most recent scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// The snapshot was fetched and every channel recorded.
    Succeeded { topics: usize, channels: usize },
    /// The fetch or population failed; an empty set was published.
    Failed,
}

struct Published {
    gauges: ChannelGauges,
    outcome: Option<ScrapeOutcome>,
}

/// Serves channel gauges populated from a [`StatsSource`] on demand.
pub struct Collector<S = StatsClient> {
    source: S,
    namespace: String,
    published: Mutex<Published>,
}

impl<S: StatsSource> Collector<S> {
    /// Create a collector whose metric names are prefixed with
    /// `{namespace}_` (no prefix when empty).
    pub fn new(source: S, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            source,
            published: Mutex::new(Published {
                gauges: ChannelGauges::new(&namespace),
                outcome: None,
            }),
            namespace,
        }
    }

    /// Static description of every gauge this collector publishes.
    pub fn describe(&self) -> Vec<GaugeDesc> {
        ChannelGauges::new(&self.namespace).describe()
    }

    /// Run one scrape: fetch, populate, publish, render.
    ///
    /// Never fails; an unreachable or misbehaving nsqd yields a body with
    /// no series.
    pub async fn scrape(&self) -> String {
        let (gauges, outcome) = self.stage().await;

        let mut published = self.published.lock().await;
        published.gauges = gauges;
        published.outcome = Some(outcome);
        render_prometheus(&published.gauges)
    }

    /// Render the most recently published set without fetching.
    pub async fn render(&self) -> String {
        let published = self.published.lock().await;
        render_prometheus(&published.gauges)
    }

    /// Outcome of the most recent scrape, `None` before the first one.
    pub async fn last_scrape(&self) -> Option<ScrapeOutcome> {
        self.published.lock().await.outcome
    }

    async fn stage(&self) -> (ChannelGauges, ScrapeOutcome) {
        let mut gauges = ChannelGauges::new(&self.namespace);

        let snapshot = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "error fetching nsqd stats");
                return (gauges, ScrapeOutcome::Failed);
            }
        };

        match gauges.populate(&snapshot) {
            Ok(channels) => {
                debug!(
                    version = %snapshot.version,
                    topics = snapshot.topics.len(),
                    channels,
                    series = gauges.series_count(),
                    "nsqd stats collected"
                );
                let outcome = ScrapeOutcome::Succeeded {
                    topics: snapshot.topics.len(),
                    channels,
                };
                (gauges, outcome)
            }
            Err(e) => {
                warn!(error = %e, "error recording nsqd stats");
                (ChannelGauges::new(&self.namespace), ScrapeOutcome::Failed)
            }
        }
    }
}
