/*!
Session state of the dashboard.

This module defines:
- `Dashboard`, which owns the store, the scene, the animator and the interaction state
- how completed snapshots and pushed events are folded into that state
*/

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::data_aquisition::event_stream::SimEvent;
use crate::gui::interaction::Interaction;
use crate::gui::message_anim::Animator;
use crate::gui::scene::Scene;
use crate::topology::source::BackendResult;
use crate::topology::sync::SnapshotGate;
use crate::topology::{GraphStore, Snapshot};

#[derive(Debug, Default)]
pub struct Dashboard {
    pub store: GraphStore,
    pub scene: Scene,
    pub animator: Animator,
    pub interaction: Interaction,
    gate: SnapshotGate,
}

/// What "Print store data" dumps.
#[derive(Serialize)]
struct StoreDump<'a> {
    store: &'a GraphStore,
    selected: Option<&'a str>,
    in_flight: usize,
}

impl Dashboard {
    pub fn new(message_ttl: Option<Duration>) -> Self {
        Self {
            animator: Animator::with_message_ttl(message_ttl),
            ..Default::default()
        }
    }

    /// Fold a finished `/data` fetch into the view. Returns whether anything was applied.
    ///
    /// Failed fetches leave the current view and the gate untouched; they have already been
    /// logged by the dispatcher.
    pub fn apply_snapshot(&mut self, seq: u64, result: BackendResult<Snapshot>) -> bool {
        let Ok(snapshot) = result else {
            return false;
        };
        if !self.gate.admit(seq) {
            debug!(seq, "Dropping stale snapshot");
            return false;
        }

        let reconcile = self.store.apply(snapshot);
        let render = self.scene.render(&self.store);
        self.interaction.after_render(&self.store, &mut self.scene);

        info!(
            seq,
            nodes = self.store.nodes().len(),
            links = reconcile.links,
            confirmed = reconcile.confirmed,
            carried_over = reconcile.carried_over,
            "Snapshot applied"
        );
        debug!(?render, "Scene diffed");
        true
    }

    pub fn handle_event(&mut self, event: SimEvent, now: Instant) {
        if let Some(ack) = self.animator.handle(event, &self.store, now) {
            self.scene.acknowledge(ack.node, ack.color);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.animator.tick(&self.store, now);
    }

    pub fn dump_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&StoreDump {
            store: &self.store,
            selected: self.interaction.selected(),
            in_flight: self.animator.in_flight().count(),
        })
    }
}
