//! Snapshot types mirroring nsqd's `/stats?format=json` document.
//!
//! Every struct is `#[serde(default)]`: a field nsqd omits decodes to its
//! zero value instead of failing the whole snapshot. Arrays additionally
//! accept `null`, which nsqd emits for empty Go slices.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FetchError, FetchResult};

// ── Snapshot ───────────────────────────────────────────────────────

/// One decoded stats document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// nsqd version string, e.g. "1.3.0".
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<Topic>,
}

impl Snapshot {
    /// Total number of channels across all topics.
    pub fn channel_count(&self) -> usize {
        self.topics.iter().map(|t| t.channels.len()).sum()
    }
}

/// A named message stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    #[serde(rename = "topic_name")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channels: Vec<Channel>,
}

/// A consumer group within a topic.
///
/// Counters are signed, as in nsqd itself; values are passed through
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    #[serde(rename = "channel_name")]
    pub name: String,
    /// Undelivered messages (memory + backend).
    pub depth: i64,
    /// Undelivered messages spilled to disk.
    pub backend_depth: i64,
    /// Delivered but not yet finished.
    pub in_flight_count: i64,
    pub deferred_count: i64,
    /// Cumulative messages delivered to the channel.
    pub message_count: i64,
    pub requeue_count: i64,
    pub timeout_count: i64,
    pub client_count: i64,
    pub paused: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub clients: Vec<ClientStats>,
}

/// A consumer connection on a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientStats {
    pub client_id: String,
    pub hostname: String,
    pub version: String,
    pub remote_address: String,
    pub ready_count: i64,
    pub in_flight_count: i64,
    pub message_count: i64,
    pub finish_count: i64,
    pub requeue_count: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Decoding ───────────────────────────────────────────────────────

/// Decode a stats response body.
///
/// Accepts either the bare document or the legacy envelope
/// `{"status_code":200,"status_txt":"OK","data":{...}}`. An envelope with
/// any other status code, or without a `data` object, is an error.
pub fn decode_snapshot(body: &[u8]) -> FetchResult<Snapshot> {
    let mut doc: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(code) = doc.get("status_code").and_then(serde_json::Value::as_i64) {
        let reason = doc
            .get("status_txt")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        if code != 200 {
            return Err(FetchError::Decode(format!(
                "nsqd envelope status_code {code} {reason}"
            )));
        }
        match doc.get_mut("data").filter(|d| d.is_object()) {
            Some(data) => doc = data.take(),
            None => {
                return Err(FetchError::Decode(format!(
                    "nsqd envelope status_code {code} {reason} without a data object"
                )));
            }
        }
    } else if let Some(data) = doc.get_mut("data").filter(|d| d.is_object()) {
        doc = data.take();
    }

    serde_json::from_value(doc).map_err(|e| FetchError::Decode(e.to_string()))
}
