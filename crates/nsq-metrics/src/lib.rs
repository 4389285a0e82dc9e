//! nsq-metrics — turns nsqd stats snapshots into Prometheus gauges.
//!
//! # Architecture
//!
//! ```text
//! Collector<S: StatsSource>
//!   └── scrape()
//!         ├── S::fetch()              → Snapshot | FetchError
//!         ├── ChannelGauges::populate → fresh per-scrape series
//!         ├── swap into published set (mutex)
//!         └── render_prometheus()     → text/plain for /metrics
//! ```
//!
//! Every channel contributes one series to each of the four gauges
//! (`client_count`, `message_count`, `depth`, `in_flight_count`), labelled
//! `{topic, channel, paused}`. A failed fetch publishes an empty set.

pub mod collector;
pub mod gauge;
pub mod prometheus;

pub use collector::{Collector, ScrapeOutcome};
pub use gauge::{ChannelGauges, GaugeDesc, GaugeVec, MetricError, CHANNEL_LABELS};
pub use prometheus::{render_prometheus, CONTENT_TYPE};
