/*!
Retained, keyed scene for the canvas.

The scene is rebuilt incrementally from the `GraphStore` on every pass: visuals whose key
(node name, link id) has disappeared are dropped, surviving ones are updated in place, and
new keys get fresh visuals. Each visual keeps the serial it was created with, so a visual
that merely changed attributes is never torn down and recreated.

Link endpoints are never stored on their own: every pass reads them from the store's
current node positions. `update_links_only` is the cheap path used on every drag tick.
*/

use std::collections::{HashMap, HashSet};

use egui::{Color32, Pos2};
use tracing::trace;

use crate::network::{ident::Category, link::Link};
use crate::topology::store::GraphStore;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeVisual {
    pub serial: u64,
    pub name: u32,
    pub center: Pos2,
    pub ring: Color32,
    /// Hidden while the node is a local echo.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkVisual {
    pub serial: u64,
    pub id: String,
    pub from: Pos2,
    pub to: Pos2,
    pub latency_label: String,
    pub bandwidth_label: String,
    pub highlighted: bool,
}

impl LinkVisual {
    pub fn midpoint(&self) -> Pos2 {
        self.from.lerp(self.to, 0.5)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerReport {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub nodes: LayerReport,
    pub links: LayerReport,
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: HashMap<u32, NodeVisual>,
    node_order: Vec<u32>,
    links: HashMap<String, LinkVisual>,
    link_order: Vec<String>,
    selected: Option<String>,
    next_serial: u64,
}

impl Scene {
    /// Full pass over both layers. Links go first so they sit under the nodes.
    pub fn render(&mut self, store: &GraphStore) -> RenderReport {
        let links = self.diff_links(store);
        let nodes = self.diff_nodes(store);
        RenderReport { nodes, links }
    }

    /// Link layer only, for drag ticks.
    pub fn update_links_only(&mut self, store: &GraphStore) -> LayerReport {
        self.diff_links(store)
    }

    /// Move a node visual directly, ahead of the next full pass.
    pub fn place_node(&mut self, name: u32, center: Pos2) -> bool {
        match self.nodes.get_mut(&name) {
            Some(visual) => {
                visual.center = center;
                true
            }
            None => false,
        }
    }

    /// Tint a node's ring until the next full pass restores its default colour.
    pub fn acknowledge(&mut self, name: u32, color: Color32) -> bool {
        match self.nodes.get_mut(&name) {
            Some(visual) => {
                trace!(node = name, serial = visual.serial, "Ring tinted");
                visual.ring = color;
                true
            }
            None => false,
        }
    }

    /// Highlight the given link, clearing any previous highlight. Returns false (and clears
    /// the selection) if the link has no visual.
    pub fn set_selection(&mut self, id: Option<&str>) -> bool {
        if let Some(previous) = self.selected.take() {
            if let Some(visual) = self.links.get_mut(&previous) {
                visual.highlighted = false;
            }
        }
        let Some(id) = id else {
            return true;
        };
        match self.links.get_mut(id) {
            Some(visual) => {
                trace!(link = id, serial = visual.serial, "Link highlighted");
                visual.highlighted = true;
                self.selected = Some(id.to_string());
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn selection(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn node(&self, name: u32) -> Option<&NodeVisual> {
        self.nodes.get(&name)
    }

    pub fn link(&self, id: &str) -> Option<&LinkVisual> {
        self.links.get(id)
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeVisual> {
        self.node_order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Links in paint order.
    pub fn links(&self) -> impl Iterator<Item = &LinkVisual> {
        self.link_order.iter().filter_map(|id| self.links.get(id))
    }

    /// Topmost node within `radius` of `pos`.
    pub fn node_at(&self, pos: Pos2, radius: f32) -> Option<u32> {
        self.nodes()
            .filter(|n| n.center.distance(pos) <= radius)
            .last()
            .map(|n| n.name)
    }

    /// Topmost link within `tolerance` of `pos`.
    pub fn link_at(&self, pos: Pos2, tolerance: f32) -> Option<&str> {
        self.links()
            .filter(|l| distance_point_to_segment(pos, l.from, l.to) <= tolerance)
            .last()
            .map(|l| l.id.as_str())
    }

    fn serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    fn diff_links(&mut self, store: &GraphStore) -> LayerReport {
        let mut report = LayerReport::default();

        let wanted: Vec<(&Link, (Pos2, Pos2))> = store
            .links()
            .iter()
            .filter_map(|link| store.link_endpoints(link).map(|ends| (link, ends)))
            .collect();
        let keep: HashSet<&str> = wanted.iter().map(|&(link, _)| link.id.as_str()).collect();

        let before = self.links.len();
        self.links.retain(|id, _| keep.contains(id.as_str()));
        report.exited = before - self.links.len();

        let mut order = Vec::with_capacity(wanted.len());
        for (link, (from, to)) in wanted {
            let highlighted = self.selected.as_deref() == Some(link.id.as_str());
            match self.links.get_mut(&link.id) {
                Some(visual) => {
                    visual.from = from;
                    visual.to = to;
                    visual.latency_label = link.latency_label();
                    visual.bandwidth_label = link.bandwidth_label();
                    visual.highlighted = highlighted;
                    report.updated += 1;
                }
                None => {
                    let serial = self.serial();
                    self.links.insert(
                        link.id.clone(),
                        LinkVisual {
                            serial,
                            id: link.id.clone(),
                            from,
                            to,
                            latency_label: link.latency_label(),
                            bandwidth_label: link.bandwidth_label(),
                            highlighted,
                        },
                    );
                    report.entered += 1;
                }
            }
            order.push(link.id.clone());
        }
        self.link_order = order;
        report
    }

    fn diff_nodes(&mut self, store: &GraphStore) -> LayerReport {
        let mut report = LayerReport::default();

        let keep: HashSet<u32> = store.nodes().iter().map(|n| n.name).collect();
        let before = self.nodes.len();
        self.nodes.retain(|name, _| keep.contains(name));
        report.exited = before - self.nodes.len();

        let mut order = Vec::with_capacity(store.nodes().len());
        for (index, node) in store.nodes().iter().enumerate() {
            let ring = Category::from_index(index).color();
            let label = (!node.local_echo).then(|| node.name.to_string());
            match self.nodes.get_mut(&node.name) {
                Some(visual) => {
                    visual.center = node.position();
                    visual.ring = ring;
                    visual.label = label;
                    report.updated += 1;
                }
                None => {
                    let serial = self.serial();
                    self.nodes.insert(
                        node.name,
                        NodeVisual {
                            serial,
                            name: node.name,
                            center: node.position(),
                            ring,
                            label,
                        },
                    );
                    report.entered += 1;
                }
            }
            order.push(node.name);
        }
        self.node_order = order;
        report
    }
}

fn distance_point_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = p - a;
    let ab = b - a;
    let ab_len2 = ab.length_sq();
    if ab_len2 <= f32::EPSILON {
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len2).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::node::Node;
    use crate::topology::snapshot::Snapshot;

    fn fixture_store() -> GraphStore {
        let json = include_str!("../../test_data/snapshot.json");
        let mut store = GraphStore::default();
        store.apply(Snapshot::from_json(json).unwrap());
        store
    }

    #[test]
    fn first_render_enters_everything() {
        let store = fixture_store();
        let mut scene = Scene::default();
        let report = scene.render(&store);

        assert_eq!(report.nodes, LayerReport { entered: 3, updated: 0, exited: 0 });
        assert_eq!(report.links, LayerReport { entered: 2, updated: 0, exited: 0 });
        let link = scene.link("l_1_2").unwrap();
        assert_eq!(link.latency_label, "30ms");
        assert_eq!(link.bandwidth_label, "1.4Gbps");
        assert_eq!(link.from, Pos2::new(300.0, 120.0));
        assert_eq!(link.to, Pos2::new(200.0, 260.0));
    }

    #[test]
    fn rerender_keeps_visual_identity() {
        let mut store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);
        let serial = scene.node(1).unwrap().serial;
        let link_serial = scene.link("l_0_2").unwrap().serial;

        store.move_node(1, 10.0, 10.0);
        let report = scene.render(&store);

        assert_eq!(report.nodes, LayerReport { entered: 0, updated: 3, exited: 0 });
        assert_eq!(scene.node(1).unwrap().serial, serial);
        assert_eq!(scene.node(1).unwrap().center, Pos2::new(10.0, 10.0));
        assert_eq!(scene.link("l_0_2").unwrap().serial, link_serial);
    }

    #[test]
    fn vanished_keys_exit() {
        let mut store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);

        store.replace_snapshot(
            vec![Node::new(0, 0.0, 0.0), Node::new(1, 1.0, 1.0), Node::new(2, 2.0, 2.0)],
            vec![Link::new(0, 1, 5.0, 1000, 0.0)],
        );
        let report = scene.render(&store);
        assert_eq!(report.links, LayerReport { entered: 1, updated: 0, exited: 2 });
        assert!(scene.link("l_0_2").is_none());
        assert_eq!(scene.links().count(), 1);
    }

    #[test]
    fn link_geometry_follows_nodes_on_link_only_pass() {
        let mut store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);

        store.move_node(0, 0.0, 0.0);
        scene.place_node(0, Pos2::new(0.0, 0.0));
        let report = scene.update_links_only(&store);
        assert_eq!(report.updated, 2);
        assert_eq!(scene.link("l_0_2").unwrap().from, Pos2::ZERO);
        assert_eq!(scene.node(0).unwrap().center, Pos2::ZERO);
    }

    #[test]
    fn local_echo_nodes_have_no_label() {
        let mut store = fixture_store();
        let mut scene = Scene::default();
        let node = store.add_local_node(5.0, 5.0);
        scene.render(&store);
        assert_eq!(scene.node(node.name).unwrap().label, None);
        assert_eq!(scene.node(0).unwrap().label.as_deref(), Some("0"));
    }

    #[test]
    fn acknowledgement_is_reset_by_full_render() {
        let store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);
        let default_ring = scene.node(2).unwrap().ring;

        assert!(scene.acknowledge(2, Color32::RED));
        assert_eq!(scene.node(2).unwrap().ring, Color32::RED);
        scene.update_links_only(&store);
        assert_eq!(scene.node(2).unwrap().ring, Color32::RED);
        scene.render(&store);
        assert_eq!(scene.node(2).unwrap().ring, default_ring);
    }

    #[test]
    fn selection_highlight_moves_between_links() {
        let store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);

        assert!(scene.set_selection(Some("l_0_2")));
        assert!(scene.link("l_0_2").unwrap().highlighted);
        assert!(scene.set_selection(Some("l_1_2")));
        assert!(!scene.link("l_0_2").unwrap().highlighted);
        assert!(scene.link("l_1_2").unwrap().highlighted);
        assert!(!scene.set_selection(Some("l_9_9")));
        assert_eq!(scene.selection(), None);
    }

    #[test]
    fn hit_testing() {
        let store = fixture_store();
        let mut scene = Scene::default();
        scene.render(&store);

        assert_eq!(scene.node_at(Pos2::new(103.0, 121.0), 8.0), Some(0));
        assert_eq!(scene.node_at(Pos2::new(150.0, 50.0), 8.0), None);
        // midpoint of l_0_2 is (150, 190)
        assert_eq!(scene.link_at(Pos2::new(151.0, 190.0), 4.0), Some("l_0_2"));
        assert_eq!(scene.link_at(Pos2::new(10.0, 10.0), 4.0), None);
    }
}
