use egui::{DragValue, Ui};
use tracing::debug;

use crate::network::defaults::{CostFunction, DefaultsConfig};
use crate::topology::sync::Outbound;

/// Editor for the simulator's global defaults.
///
/// Edits go to a draft; the draft is only replaced by the server's copy while it is clean,
/// so a refetch landing mid-edit does not eat what the user typed.
#[derive(Debug, Default)]
pub struct DefaultsPanel {
    server: Option<DefaultsConfig>,
    draft: DefaultsConfig,
    dirty: bool,
}

impl DefaultsPanel {
    pub fn set_from_server(&mut self, defaults: DefaultsConfig) {
        if !self.dirty {
            self.draft = defaults.clone();
        }
        self.server = Some(defaults);
    }

    pub fn draft(&self) -> &DefaultsConfig {
        &self.draft
    }

    pub fn is_loaded(&self) -> bool {
        self.server.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Hand the draft over for a `PUT /defaults`. The reply is re-read afterwards because
    /// the simulator sanitises what it stores.
    pub fn apply(&mut self) -> Outbound {
        self.dirty = false;
        Outbound::PutDefaults(self.draft.clone())
    }

    pub fn revert(&mut self) {
        if let Some(server) = &self.server {
            self.draft = server.clone();
        }
        self.dirty = false;
    }

    pub fn ui(&mut self, ui: &mut Ui) -> Option<Outbound> {
        if !self.is_loaded() {
            ui.label("Waiting for /defaults...");
            return None;
        }

        let before = self.draft().clone();
        let d = &mut self.draft;

        egui::Grid::new("defaults_grid").num_columns(2).striped(true).show(ui, |ui| {
            ui.label("Bandwidth (bps)");
            ui.add(DragValue::new(&mut d.bandwidth).range(0..=i64::MAX).speed(1024));
            ui.end_row();

            ui.label("Decay bandwidth");
            ui.checkbox(&mut d.decay_bandwidth, "");
            ui.end_row();

            ui.label("Min bandwidth (bps)");
            ui.add(DragValue::new(&mut d.min_bandwidth).range(0..=i64::MAX).speed(1024));
            ui.end_row();

            ui.label("Max latency (ms)");
            ui.add(DragValue::new(&mut d.max_latency).range(0..=i64::MAX));
            ui.end_row();

            ui.label("Jitter (%)");
            ui.add(DragValue::new(&mut d.jitter).range(0..=100));
            ui.end_row();

            ui.label("Packet loss (%)");
            ui.add(DragValue::new(&mut d.packet_loss).range(0..=100));
            ui.end_row();

            ui.label("Latency scale");
            ui.add(DragValue::new(&mut d.latency_scale).range(0..=i64::MAX));
            ui.end_row();

            ui.label("Client latency (ms)");
            ui.add(DragValue::new(&mut d.client_latency).range(0..=i64::MAX));
            ui.end_row();

            ui.label("Client bandwidth (bps)");
            ui.add(DragValue::new(&mut d.client_bandwidth).range(0..=i64::MAX).speed(1024));
            ui.end_row();

            ui.label("Client jitter (%)");
            ui.add(DragValue::new(&mut d.client_jitter).range(0..=100));
            ui.end_row();

            ui.label("Client loss (%)");
            ui.add(DragValue::new(&mut d.client_loss).range(0..=100));
            ui.end_row();
        });

        ui.label("Cost function");
        for cost in CostFunction::ALL {
            ui.radio_value(&mut d.cost_function, cost, cost.label());
        }

        if self.draft != before {
            self.dirty = true;
        }

        let mut outbound = None;
        ui.horizontal(|ui| {
            if ui.add_enabled(self.is_dirty(), egui::Button::new("Apply")).clicked() {
                debug!("Applying defaults");
                outbound = Some(self.apply());
            }
            if ui.add_enabled(self.is_dirty(), egui::Button::new("Revert")).clicked() {
                self.revert();
            }
        });
        outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_defaults() -> DefaultsConfig {
        serde_json::from_str(include_str!("../../test_data/defaults.json")).unwrap()
    }

    #[test]
    fn clean_draft_follows_server() {
        let mut panel = DefaultsPanel::default();
        assert!(!panel.is_loaded());

        panel.set_from_server(server_defaults());
        assert!(panel.is_loaded());
        assert_eq!(panel.draft().bandwidth, 1_024_000);
        assert_eq!(panel.draft().cost_function, CostFunction::MaxBandwidth);
    }

    #[test]
    fn dirty_draft_survives_refetch_until_applied() {
        let mut panel = DefaultsPanel::default();
        panel.set_from_server(server_defaults());
        panel.draft.latency_scale = 42;
        panel.dirty = true;

        panel.set_from_server(server_defaults());
        assert_eq!(panel.draft().latency_scale, 42);

        let Outbound::PutDefaults(sent) = panel.apply() else {
            panic!("expected a defaults write");
        };
        assert_eq!(sent.latency_scale, 42);
        assert!(!panel.is_dirty());

        // the simulator sanitised it back
        panel.set_from_server(server_defaults());
        assert_eq!(panel.draft().latency_scale, 150);
    }

    #[test]
    fn revert_restores_server_copy() {
        let mut panel = DefaultsPanel::default();
        panel.set_from_server(server_defaults());
        panel.draft.jitter = 99;
        panel.dirty = true;

        panel.revert();
        assert_eq!(panel.draft(), &server_defaults());
        assert!(!panel.is_dirty());
    }
}
