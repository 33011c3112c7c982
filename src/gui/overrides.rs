use thiserror::Error;

use crate::network::link::{Link, Tunable};
use crate::topology::sync::Outbound;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverrideError {
    #[error("no link is selected")]
    NoSelection,
    #[error("{tunable} value {value:?} is not a number")]
    InvalidValue { tunable: Tunable, value: String },
}

/// Edit field for one tunable of the selected link.
#[derive(Debug, Clone, PartialEq)]
pub struct TunableField {
    pub tunable: Tunable,
    pub text: String,
    /// Mirrors the last snapshot; never toggled locally.
    pub pinned: bool,
}

/// Override editor for the selected link.
#[derive(Debug, Clone, PartialEq)]
pub struct OverridePanel {
    pub link_id: String,
    pub source: u32,
    pub target: u32,
    pub fields: [TunableField; 3],
}

impl OverridePanel {
    pub fn for_link(link: &Link) -> Self {
        Self {
            link_id: link.id.clone(),
            source: link.source,
            target: link.target,
            fields: Tunable::ALL.map(|tunable| TunableField {
                tunable,
                text: link.tunable_value(tunable),
                pinned: link.overrides.is_pinned(tunable),
            }),
        }
    }

    pub fn field(&self, tunable: Tunable) -> &TunableField {
        &self.fields[Self::slot(tunable)]
    }

    #[cfg(test)]
    pub fn field_mut(&mut self, tunable: Tunable) -> &mut TunableField {
        &mut self.fields[Self::slot(tunable)]
    }

    fn slot(tunable: Tunable) -> usize {
        match tunable {
            Tunable::Bandwidth => 0,
            Tunable::Latency => 1,
            Tunable::Jitter => 2,
        }
    }

    /// Pin the typed value. The simulator clamps it; the next snapshot shows what stuck.
    pub fn pin(&self, tunable: Tunable) -> Result<Outbound, OverrideError> {
        let text = &self.field(tunable).text;
        let value = text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| OverrideError::InvalidValue {
                tunable,
                value: text.clone(),
            })?;
        Ok(Outbound::SetOverride {
            source: self.source,
            target: self.target,
            tunable,
            value,
        })
    }

    pub fn unpin(&self, tunable: Tunable) -> Outbound {
        Outbound::ClearOverride {
            source: self.source,
            target: self.target,
            tunable,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn pinned_link() -> Link {
        Link::new(1, 2, 30.0, 2048, 3.0)
            .with_overrides([(Tunable::Latency, Value::Bool(true))].into_iter().collect())
    }

    #[test]
    fn panel_reflects_link_and_pins() {
        let panel = OverridePanel::for_link(&pinned_link());
        assert_eq!(panel.link_id, "l_1_2");
        assert_eq!(panel.field(Tunable::Bandwidth).text, "2048");
        assert!(panel.field(Tunable::Latency).pinned);
        assert!(!panel.field(Tunable::Jitter).pinned);
    }

    #[test]
    fn pin_sends_typed_value() {
        let mut panel = OverridePanel::for_link(&pinned_link());
        panel.field_mut(Tunable::Jitter).text = " 12.5 ".to_string();

        assert_eq!(
            panel.pin(Tunable::Jitter),
            Ok(Outbound::SetOverride { source: 1, target: 2, tunable: Tunable::Jitter, value: 12.5 })
        );
        // typing does not flip the pin state, only a snapshot does
        assert!(!panel.field(Tunable::Jitter).pinned);
    }

    #[test]
    fn pin_rejects_non_numbers() {
        let mut panel = OverridePanel::for_link(&pinned_link());
        panel.field_mut(Tunable::Bandwidth).text = "fast".to_string();
        assert!(matches!(
            panel.pin(Tunable::Bandwidth),
            Err(OverrideError::InvalidValue { tunable: Tunable::Bandwidth, .. })
        ));
    }

    #[test]
    fn unpin_clears_override() {
        let panel = OverridePanel::for_link(&pinned_link());
        assert_eq!(
            panel.unpin(Tunable::Latency),
            Outbound::ClearOverride { source: 1, target: 2, tunable: Tunable::Latency }
        );
    }
}
