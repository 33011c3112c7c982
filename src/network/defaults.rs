use serde::{Deserialize, Serialize};

/// Routing cost function the simulator uses when computing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostFunction {
    #[default]
    #[serde(rename = "cost_min_latency")]
    MinLatency,
    #[serde(rename = "cost_max_bandwidth")]
    MaxBandwidth,
}

impl CostFunction {
    pub const ALL: [CostFunction; 2] = [CostFunction::MinLatency, CostFunction::MaxBandwidth];

    pub fn label(&self) -> &'static str {
        match self {
            CostFunction::MinLatency => "Minimise latency",
            CostFunction::MaxBandwidth => "Maximise bandwidth",
        }
    }
}

/// Global simulation parameters exposed at `/defaults`.
///
/// The simulator sanitises whatever it receives, so after a write the dashboard always
/// re-reads this document rather than trusting its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub bandwidth: i64,
    pub decay_bandwidth: bool,
    pub min_bandwidth: i64,
    pub max_latency: i64,
    pub jitter: i64,
    pub packet_loss: i64,
    pub cost_function: CostFunction,
    pub latency_scale: i64,
    pub client_latency: i64,
    pub client_bandwidth: i64,
    pub client_jitter: i64,
    pub client_loss: i64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bandwidth: 512_000,
            decay_bandwidth: true,
            min_bandwidth: 0,
            max_latency: 300,
            jitter: 0,
            packet_loss: 0,
            cost_function: CostFunction::MinLatency,
            latency_scale: 100,
            client_latency: 0,
            client_bandwidth: 512_000,
            client_jitter: 0,
            client_loss: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialization() {
        let json = include_str!("../../test_data/defaults.json");
        let defaults: DefaultsConfig = serde_json::from_str(json).unwrap();

        assert_eq!(defaults.bandwidth, 1_024_000);
        assert!(!defaults.decay_bandwidth);
        assert_eq!(defaults.cost_function, CostFunction::MaxBandwidth);
        assert_eq!(defaults.latency_scale, 150);
        // absent from the fixture
        assert_eq!(defaults.client_loss, 0);
    }

    #[test]
    fn cost_function_wire_names() {
        let json = serde_json::to_string(&CostFunction::MinLatency).unwrap();
        assert_eq!(json, "\"cost_min_latency\"");
    }
}
