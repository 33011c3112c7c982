/*!
Animation of messages travelling through the mesh.

A "sending" notification names the whole path a message takes. It is decomposed into hops,
and the marker walks them one after another: hop `k + 1` only starts once hop `k` is done,
and each hop takes as long as its link's latency *at the moment the hop starts*.

Links are stored in ascending endpoint order, so a hop travelling from a higher to a lower
node name runs along its link backwards.

A "receive" notification removes the matching marker if there still is one and always
produces an impact halo at the receiving node.
*/

use std::collections::HashMap;
use std::time::{Duration, Instant};

use egui::{Color32, Pos2};
use tracing::{debug, warn};

use crate::data_aquisition::event_stream::SimEvent;
use crate::network::ident::{Category, link_id};
use crate::topology::store::GraphStore;

pub const HALO_DURATION: Duration = Duration::from_millis(1000);
const HALO_START_RADIUS: f32 = 6.0;
const HALO_END_RADIUS: f32 = 20.0;
const HALO_START_FILL: f32 = 0.75;

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct MessageKey {
    pub destination: u32,
    pub event: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hop {
    pub from: u32,
    pub to: u32,
    pub link_id: String,
    pub backwards: bool,
}

/// Split a path into hops along ascending-order links.
pub fn decompose_path(path: &[u32]) -> Vec<Hop> {
    path.windows(2)
        .map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let backwards = from > to;
            let (lo, hi) = if backwards { (to, from) } else { (from, to) };
            Hop {
                from,
                to,
                link_id: link_id(lo, hi),
                backwards,
            }
        })
        .collect()
}

fn latency_duration(store: &GraphStore, hop: &Hop) -> Duration {
    match store.link_between(hop.from, hop.to) {
        Some(link) if link.latency.is_finite() && link.latency > 0.0 => {
            Duration::from_nanos((link.latency * 1_000_000.0).round() as u64)
        }
        Some(_) => Duration::ZERO,
        None => {
            debug!(link = %hop.link_id, "No link for hop, skipping");
            Duration::ZERO
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveHop {
    index: usize,
    started: Instant,
    duration: Duration,
}

#[derive(Clone, Debug)]
pub struct InFlightMessage {
    pub key: MessageKey,
    pub category: Category,
    pub created: Instant,
    hops: Vec<Hop>,
    durations: Vec<Duration>,
    active: Option<ActiveHop>,
    origin: Option<u32>,
}

impl InFlightMessage {
    fn new(key: MessageKey, path: &[u32], store: &GraphStore, now: Instant) -> Self {
        let mut message = Self {
            category: Category::for_event(&key.event),
            key,
            created: now,
            hops: decompose_path(path),
            durations: Vec::new(),
            active: None,
            origin: path.first().copied(),
        };
        if !message.hops.is_empty() {
            message.begin_hop(0, now, store);
        }
        message.advance(store, now);
        message
    }

    fn begin_hop(&mut self, index: usize, started: Instant, store: &GraphStore) {
        let duration = latency_duration(store, &self.hops[index]);
        self.durations.push(duration);
        self.active = Some(ActiveHop {
            index,
            started,
            duration,
        });
    }

    /// Chain into the following hops for as long as the current one has run its course.
    fn advance(&mut self, store: &GraphStore, now: Instant) {
        while let Some(active) = self.active.clone() {
            let ends = active.started + active.duration;
            if now < ends {
                return;
            }
            let next = active.index + 1;
            if next < self.hops.len() {
                self.begin_hop(next, ends, store);
            } else {
                self.active = None;
            }
        }
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Durations of the hops started so far, in order.
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    pub fn current_hop(&self) -> Option<(&Hop, Duration)> {
        self.active
            .as_ref()
            .map(|active| (&self.hops[active.index], active.duration))
    }

    pub fn is_travelling(&self) -> bool {
        self.active.is_some()
    }

    /// Where the marker is drawn, using live node positions.
    pub fn position(&self, store: &GraphStore, now: Instant) -> Option<Pos2> {
        let Some(active) = &self.active else {
            return store
                .node_position(self.key.destination)
                .or_else(|| self.origin.and_then(|o| store.node_position(o)));
        };
        let hop = &self.hops[active.index];
        let link = store.link_between(hop.from, hop.to)?;
        let (a, b) = store.link_endpoints(link)?;
        let t = if active.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(active.started).as_secs_f32()
                / active.duration.as_secs_f32())
            .clamp(0.0, 1.0)
        };
        let t = if hop.backwards { 1.0 - t } else { t };
        Some(a.lerp(b, t))
    }
}

#[derive(Clone, Debug)]
struct Halo {
    center: Pos2,
    color: Color32,
    started: Instant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaloFrame {
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
    pub fill_alpha: f32,
    pub stroke_alpha: f32,
}

impl Halo {
    fn frame(&self, now: Instant) -> Option<HaloFrame> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= HALO_DURATION {
            return None;
        }
        let p = ease_cubic_out(elapsed.as_secs_f32() / HALO_DURATION.as_secs_f32());
        Some(HaloFrame {
            center: self.center,
            radius: HALO_START_RADIUS + (HALO_END_RADIUS - HALO_START_RADIUS) * p,
            color: self.color,
            fill_alpha: HALO_START_FILL * (1.0 - p),
            stroke_alpha: 1.0 - p,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: Pos2,
    pub color: Color32,
}

/// Transient recolouring of a node that just received a message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acknowledgement {
    pub node: u32,
    pub color: Color32,
}

#[derive(Debug, Default)]
pub struct Animator {
    in_flight: HashMap<MessageKey, InFlightMessage>,
    halos: Vec<Halo>,
    message_ttl: Option<Duration>,
}

impl Animator {
    /// Messages whose receipt never arrives are dropped after `ttl`, if set.
    pub fn with_message_ttl(ttl: Option<Duration>) -> Self {
        Self {
            message_ttl: ttl,
            ..Default::default()
        }
    }

    pub fn handle(&mut self, event: SimEvent, store: &GraphStore, now: Instant) -> Option<Acknowledgement> {
        match event {
            SimEvent::Sending { event, path } => {
                self.send(event, &path, store, now);
                None
            }
            SimEvent::Receive { event, target } => self.receive(event, target, store, now),
            SimEvent::Unknown => None,
        }
    }

    fn send(&mut self, event: String, path: &[u32], store: &GraphStore, now: Instant) {
        let Some(&destination) = path.last() else {
            warn!(event = %event, "Sending notification with an empty path");
            return;
        };
        let key = MessageKey { destination, event };
        let message = InFlightMessage::new(key.clone(), path, store, now);
        debug!(event = %key.event, destination, hops = message.hops.len(), "Message in flight");
        self.in_flight.insert(key, message);
    }

    fn receive(&mut self, event: String, target: u32, store: &GraphStore, now: Instant) -> Option<Acknowledgement> {
        let key = MessageKey {
            destination: target,
            event,
        };
        if self.in_flight.remove(&key).is_none() {
            debug!(event = %key.event, target, "Receipt without a marker in flight");
        }

        let center = store.node_position(target)?;
        let color = Category::for_event(&key.event).color();
        self.halos.push(Halo {
            center,
            color,
            started: now,
        });
        Some(Acknowledgement { node: target, color })
    }

    /// Advance hop chains and drop finished halos and expired messages.
    pub fn tick(&mut self, store: &GraphStore, now: Instant) {
        for message in self.in_flight.values_mut() {
            message.advance(store, now);
        }
        self.halos
            .retain(|halo| now.saturating_duration_since(halo.started) < HALO_DURATION);
        if let Some(ttl) = self.message_ttl {
            self.in_flight.retain(|key, message| {
                let keep = now.saturating_duration_since(message.created) < ttl;
                if !keep {
                    debug!(event = %key.event, destination = key.destination, "In-flight message expired");
                }
                keep
            });
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &MessageKey) -> Option<&InFlightMessage> {
        self.in_flight.get(key)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &InFlightMessage> {
        self.in_flight.values()
    }

    pub fn markers(&self, store: &GraphStore, now: Instant) -> Vec<Marker> {
        self.in_flight
            .values()
            .filter_map(|message| {
                Some(Marker {
                    position: message.position(store, now)?,
                    color: message.category.color(),
                })
            })
            .collect()
    }

    pub fn halo_frames(&self, now: Instant) -> Vec<HaloFrame> {
        self.halos.iter().filter_map(|halo| halo.frame(now)).collect()
    }

    /// Anything that still needs frames.
    pub fn is_animating(&self) -> bool {
        !self.halos.is_empty() || self.in_flight.values().any(InFlightMessage::is_travelling)
    }
}

fn ease_cubic_out(t: f32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}
