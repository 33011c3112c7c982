use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::network::ident::link_id;

/// One of the per-link values an operator can pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tunable {
    Bandwidth,
    Latency,
    Jitter,
}

impl Tunable {
    pub const ALL: [Tunable; 3] = [Tunable::Bandwidth, Tunable::Latency, Tunable::Jitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tunable::Bandwidth => "bandwidth",
            Tunable::Latency => "latency",
            Tunable::Jitter => "jitter",
        }
    }
}

impl Display for Tunable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pinned overrides as reported by the simulator: tunable name to a flag or value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides(HashMap<String, Value>);

impl Overrides {
    /// An override counts as pinned when its value is truthy.
    pub fn is_pinned(&self, tunable: Tunable) -> bool {
        match self.0.get(tunable.as_str()) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    pub fn pinned(&self) -> impl Iterator<Item = Tunable> + '_ {
        Tunable::ALL.into_iter().filter(|t| self.is_pinned(*t))
    }
}

impl FromIterator<(Tunable, Value)> for Overrides {
    fn from_iter<T: IntoIterator<Item = (Tunable, Value)>>(iter: T) -> Self {
        Overrides(
            iter.into_iter()
                .map(|(t, v)| (t.as_str().to_string(), v))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: u32,
    pub target: u32,
    #[serde(default)]
    pub latency: f64,
    #[serde(default, deserialize_with = "bandwidth_from_number")]
    pub bandwidth: u64,
    #[serde(default)]
    pub jitter: f64,
    #[serde(default)]
    pub packet_loss: f64,
    #[serde(default, deserialize_with = "overrides_or_empty")]
    pub overrides: Overrides,
    /// Derived from the endpoints every time a snapshot is applied.
    #[serde(default, skip_serializing)]
    pub id: String,
}

impl Link {
    pub fn new(source: u32, target: u32, latency: f64, bandwidth: u64, jitter: f64) -> Self {
        Self {
            source,
            target,
            latency,
            bandwidth,
            jitter,
            packet_loss: 0.0,
            overrides: Overrides::default(),
            id: link_id(source, target),
        }
    }

    #[cfg(test)]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn refresh_id(&mut self) {
        self.id = link_id(self.source, self.target);
    }

    /// Current value of a tunable, formatted for an edit field.
    pub fn tunable_value(&self, tunable: Tunable) -> String {
        match tunable {
            Tunable::Bandwidth => self.bandwidth.to_string(),
            Tunable::Latency => self.latency.to_string(),
            Tunable::Jitter => self.jitter.to_string(),
        }
    }

    pub fn latency_label(&self) -> String {
        pretty_latency(self.latency)
    }

    pub fn bandwidth_label(&self) -> String {
        pretty_bandwidth(self.bandwidth)
    }
}

fn bandwidth_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite() && *v > 0.0).map_or(0, |v| v.round() as u64))
}

fn overrides_or_empty<'de, D>(deserializer: D) -> Result<Overrides, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Overrides>::deserialize(deserializer)?.unwrap_or_default())
}

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Human-readable bandwidth, one decimal place past each binary threshold.
pub fn pretty_bandwidth(bw: u64) -> String {
    let v = bw as f64;
    let scaled = |unit: f64| (10.0 * v / unit).round() / 10.0;
    if v > GIB {
        format!("{}Gbps", scaled(GIB))
    } else if v > MIB {
        format!("{}Mbps", scaled(MIB))
    } else if v > KIB {
        format!("{}Kbps", scaled(KIB))
    } else {
        format!("{bw}bps")
    }
}

/// Latency rounded to two decimals, e.g. `12.35ms`.
pub fn pretty_latency(latency: f64) -> String {
    format!("{}ms", (latency * 100.0).round() / 100.0)
}
