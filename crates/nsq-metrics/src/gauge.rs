//! Labelled gauge registry.
//!
//! A [`GaugeVec`] holds one value per label tuple. [`ChannelGauges`] is the
//! fixed set of four per-channel gauges the exporter publishes.

use std::collections::BTreeMap;

use thiserror::Error;

use nsq_stats::{Channel, Snapshot, Topic};

/// Label schema shared by every channel gauge.
pub const CHANNEL_LABELS: [&str; 3] = ["topic", "channel", "paused"];

/// Errors raised while setting gauge values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("metric {name} expects {expected} label values, got {got}")]
    LabelArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Static description of a gauge: everything but its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeDesc {
    /// Fully-qualified name, namespace included.
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
}

impl GaugeDesc {
    /// Build a description; `name` is prefixed with `{namespace}_` unless
    /// the namespace is empty.
    pub fn new(namespace: &str, name: &str, help: &str, label_names: &[&str]) -> Self {
        let name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}_{name}")
        };
        Self {
            name,
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// A gauge with one value per label tuple.
///
/// Series are kept sorted by label values so emission order is stable.
#[derive(Debug, Clone)]
pub struct GaugeVec {
    desc: GaugeDesc,
    series: BTreeMap<Vec<String>, f64>,
}

impl GaugeVec {
    pub fn new(desc: GaugeDesc) -> Self {
        Self {
            desc,
            series: BTreeMap::new(),
        }
    }

    pub fn desc(&self) -> &GaugeDesc {
        &self.desc
    }

    /// Set the value for a label tuple, replacing any previous value.
    pub fn set(&mut self, label_values: &[&str], value: f64) -> Result<(), MetricError> {
        self.check_arity(label_values)?;
        let key = label_values.iter().map(|v| v.to_string()).collect();
        self.series.insert(key, value);
        Ok(())
    }

    /// Current value for a label tuple, if set.
    pub fn get(&self, label_values: &[&str]) -> Option<f64> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.series.get(&key).copied()
    }

    /// All set series in label order.
    pub fn series(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.series.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn check_arity(&self, label_values: &[&str]) -> Result<(), MetricError> {
        let expected = self.desc.label_names.len();
        if label_values.len() != expected {
            return Err(MetricError::LabelArityMismatch {
                name: self.desc.name.clone(),
                expected,
                got: label_values.len(),
            });
        }
        Ok(())
    }
}

/// The four per-channel gauges.
#[derive(Debug, Clone)]
pub struct ChannelGauges {
    pub client_count: GaugeVec,
    pub message_count: GaugeVec,
    pub depth: GaugeVec,
    pub in_flight_count: GaugeVec,
}

impl ChannelGauges {
    /// Create an empty set of gauges under `namespace`.
    pub fn new(namespace: &str) -> Self {
        let gauge = |name, help| GaugeVec::new(GaugeDesc::new(namespace, name, help, &CHANNEL_LABELS));
        Self {
            client_count: gauge("client_count", "Number of clients connected to the channel"),
            message_count: gauge("message_count", "Number of messages in the channel"),
            depth: gauge("depth", "Depth of the channel's queue"),
            in_flight_count: gauge(
                "in_flight_count",
                "Number of messages currently in-flight in the channel",
            ),
        }
    }

    /// Gauges in emission order.
    pub fn families(&self) -> [&GaugeVec; 4] {
        [
            &self.client_count,
            &self.message_count,
            &self.depth,
            &self.in_flight_count,
        ]
    }

    /// Descriptions of every gauge, independent of any values.
    pub fn describe(&self) -> Vec<GaugeDesc> {
        self.families().iter().map(|g| g.desc().clone()).collect()
    }

    /// Record one channel's counters under `(topic, channel, paused)`.
    pub fn observe_channel(&mut self, topic: &Topic, channel: &Channel) -> Result<(), MetricError> {
        let paused = channel.paused.to_string();
        let labels = [topic.name.as_str(), channel.name.as_str(), paused.as_str()];

        self.client_count.set(&labels, channel.client_count as f64)?;
        self.message_count.set(&labels, channel.message_count as f64)?;
        self.depth.set(&labels, channel.depth as f64)?;
        self.in_flight_count.set(&labels, channel.in_flight_count as f64)?;
        Ok(())
    }

    /// Record every channel of every topic, in snapshot order.
    ///
    /// Returns the number of channels observed.
    pub fn populate(&mut self, snapshot: &Snapshot) -> Result<usize, MetricError> {
        let mut observed = 0;
        for topic in &snapshot.topics {
            for channel in &topic.channels {
                self.observe_channel(topic, channel)?;
                observed += 1;
            }
        }
        Ok(observed)
    }

    /// Total series across all four gauges.
    pub fn series_count(&self) -> usize {
        self.families().iter().map(|g| g.len()).sum()
    }
}
