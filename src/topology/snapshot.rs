use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::network::{link::Link, node::Node};

/// One authoritative `/data` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Snapshot {
    /// Decode a snapshot body. A `nodes` or `links` field that is missing, `null` or
    /// does not decode is taken as empty, so a half-broken backend response never takes
    /// the session down. Only a body that is not JSON at all is an error.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self {
            nodes: field_or_empty(&value, "nodes"),
            links: field_or_empty(&value, "links"),
        })
    }
}

fn field_or_empty<T: DeserializeOwned>(value: &Value, field: &str) -> Vec<T> {
    match value.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
            warn!(field, error = %e, "Malformed snapshot field, treating as empty");
            Vec::new()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserialization() {
        let json = include_str!("../../test_data/snapshot.json");
        let snapshot = Snapshot::from_json(json).unwrap();

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.links.len(), 2);
        assert!(snapshot.nodes.iter().all(|n| !n.local_echo));
        assert_eq!(snapshot.nodes[2].name, 2);
        assert_eq!(snapshot.links[1].bandwidth, 1_500_000_000);
    }

    #[test]
    fn null_and_missing_fields_become_empty() {
        let json = include_str!("../../test_data/partial_snapshot.json");
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.links.is_empty());

        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());

        let snapshot = Snapshot::from_json("null").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn malformed_field_is_dropped_not_fatal() {
        let snapshot =
            Snapshot::from_json(r#"{"nodes": "oops", "links": [{"source": 0, "target": 1}]}"#)
                .unwrap();
        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.links.len(), 1);
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(Snapshot::from_json("<html>502 Bad Gateway</html>").is_err());
    }
}
