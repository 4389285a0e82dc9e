//! nsq-stats — typed access to nsqd's `/stats` endpoint.
//!
//! Fetches the broker's JSON status document and decodes it into a
//! [`Snapshot`] of topics, channels and connected clients.
//!
//! # Architecture
//!
//! ```text
//! StatsClient (impl StatsSource)
//!   ├── GET {addr}?format=json   ← one request per fetch, no retries
//!   └── decode_snapshot()        → Snapshot { topics[] { channels[] { clients[] } } }
//! ```
//!
//! Decoding is permissive: unknown fields are ignored and missing or
//! `null` fields fall back to their zero value. Both the bare document and
//! the `{"status_code":..,"data":{..}}` envelope of older nsqd releases
//! are accepted.

pub mod client;
pub mod error;
pub mod types;

pub use client::{StatsClient, StatsSource};
pub use error::{FetchError, FetchResult};
pub use types::*;
