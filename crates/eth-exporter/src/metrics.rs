//! Pull-model metric plumbing: descriptors, samples, the collector registry,
//! and Prometheus text exposition (format version 0.0.4).

use std::{
    collections::{BTreeMap, HashSet},
    fmt::Write as _,
    sync::Arc,
};

use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::collectors::Collector;

// ── Descriptors and samples ──────────────────────────────────

/// Static description of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Desc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

/// One collected observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// An instantaneous value.
    Gauge {
        desc: Desc,
        labels: Vec<String>,
        value: f64,
    },
    /// A count/sum pair covering one collection window.
    Summary {
        desc: Desc,
        labels: Vec<String>,
        count: u64,
        sum: f64,
    },
    /// Stands in for samples a collector could not produce. Logged and
    /// skipped at exposition time; the rest of the scrape proceeds.
    Invalid { desc: Desc, message: String },
}

impl Sample {
    pub fn gauge(desc: Desc, labels: Vec<String>, value: f64) -> Self {
        Self::Gauge { desc, labels, value }
    }

    pub fn summary(desc: Desc, labels: Vec<String>, count: u64, sum: f64) -> Self {
        Self::Summary { desc, labels, count, sum }
    }

    pub fn invalid(desc: Desc, message: impl Into<String>) -> Self {
        Self::Invalid { desc, message: message.into() }
    }

    pub fn desc(&self) -> &Desc {
        match self {
            Self::Gauge { desc, .. } | Self::Summary { desc, .. } | Self::Invalid { desc, .. } => {
                desc
            }
        }
    }
}

// ── Registry ─────────────────────────────────────────────────

/// Holds every registered collector and runs them concurrently per scrape.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Arc<dyn Collector>>,
    family_names: HashSet<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector. A duplicate family name is warned about but
    /// still registered; exposition will emit both under one header.
    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        for desc in collector.describe() {
            if !self.family_names.insert(desc.name) {
                warn!(
                    metric = desc.name,
                    collector = collector.name(),
                    "duplicate metric family registered"
                );
            }
        }
        self.collectors.push(collector);
    }

    /// Run every collector concurrently and collect all their samples.
    ///
    /// A panicked collector task loses its samples for this scrape; the
    /// others are unaffected.
    pub async fn gather(&self) -> Vec<Sample> {
        let mut set = JoinSet::new();
        for collector in &self.collectors {
            let collector = Arc::clone(collector);
            set.spawn(async move { collector.collect().await });
        }

        let mut samples = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(mut collected) => samples.append(&mut collected),
                Err(e) => error!(error = %e, "collector task failed"),
            }
        }
        samples
    }

    /// Gather and render the text exposition.
    ///
    /// Invalid samples are logged here and omitted from the output, so one
    /// failing collector never takes down the whole scrape.
    pub async fn expose(&self) -> String {
        let samples = self.gather().await;
        for sample in &samples {
            if let Sample::Invalid { desc, message } = sample {
                error!(metric = desc.name, "collection failed: {message}");
            }
        }
        encode_text(&samples)
    }
}

// ── Text exposition ──────────────────────────────────────────

/// Render samples in the Prometheus text format.
///
/// Families are sorted by name. A [`Sample::Summary`] renders as a cumulative
/// histogram with a single `+Inf` bucket, which carries the same count/sum
/// information without fixed bucket boundaries.
pub fn encode_text(samples: &[Sample]) -> String {
    let mut families: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        if matches!(sample, Sample::Invalid { .. }) {
            continue;
        }
        families.entry(sample.desc().name).or_default().push(sample);
    }

    let mut out = String::new();
    for (name, group) in families {
        let desc = group[0].desc();
        let kind = match group[0] {
            Sample::Summary { .. } => "histogram",
            _ => "gauge",
        };
        let _ = writeln!(out, "# HELP {name} {}", escape_help(desc.help));
        let _ = writeln!(out, "# TYPE {name} {kind}");

        for sample in group {
            match sample {
                Sample::Gauge { desc, labels, value } => {
                    let _ = writeln!(out, "{name}{} {value}", render_labels(desc, labels, None));
                }
                Sample::Summary { desc, labels, count, sum } => {
                    let bucket = render_labels(desc, labels, Some(("le", "+Inf")));
                    let plain = render_labels(desc, labels, None);
                    let _ = writeln!(out, "{name}_bucket{bucket} {count}");
                    let _ = writeln!(out, "{name}_sum{plain} {sum}");
                    let _ = writeln!(out, "{name}_count{plain} {count}");
                }
                Sample::Invalid { .. } => {}
            }
        }
    }
    out
}

fn render_labels(desc: &Desc, values: &[String], extra: Option<(&str, &str)>) -> String {
    let mut pairs: Vec<String> = desc
        .labels
        .iter()
        .zip(values)
        .map(|(key, value)| format!("{key}=\"{}\"", escape_label(value)))
        .collect();
    if let Some((key, value)) = extra {
        pairs.push(format!("{key}=\"{value}\""));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
