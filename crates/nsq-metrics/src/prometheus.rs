//! Prometheus text exposition format.
//!
//! Renders the channel gauges into the text format (version 0.0.4) for
//! scraping by a Prometheus server or compatible agent.

use crate::gauge::{ChannelGauges, GaugeVec};

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render all channel gauges into Prometheus text format.
///
/// Every gauge emits its HELP/TYPE header even when it has no series.
pub fn render_prometheus(gauges: &ChannelGauges) -> String {
    let mut out = String::new();
    for family in gauges.families() {
        render_family(&mut out, family);
    }
    out
}

fn render_family(out: &mut String, gauge: &GaugeVec) {
    let desc = gauge.desc();

    // Help + type declarations.
    out.push_str(&format!("# HELP {} {}\n", desc.name, escape_help(&desc.help)));
    out.push_str(&format!("# TYPE {} gauge\n", desc.name));

    for (label_values, value) in gauge.series() {
        let labels: Vec<String> = desc
            .label_names
            .iter()
            .zip(label_values)
            .map(|(name, value)| format!("{name}=\"{}\"", escape_label_value(value)))
            .collect();
        out.push_str(&format!(
            "{}{{{}}} {}\n",
            desc.name,
            labels.join(","),
            format_value(value)
        ));
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
