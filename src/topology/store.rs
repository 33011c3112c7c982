/*!
This module provides the dashboard's single source of truth for the simulated mesh.

This module defines:
- `GraphStore`: ordered nodes, links, the `links_by_id` lookup and the node name index.
- `ReconcileReport`: what a snapshot reconciliation changed, for logging.

Reconciliation rules:
- Nodes are merged by position: a server node at position `i` wins, otherwise a node the
  dashboard already held at `i` is carried over untouched. This is what keeps a freshly
  clicked (local echo) node alive until the simulator reports it back.
- Links carry no local-only state and are always replaced wholesale.
*/

use std::collections::HashMap;

use egui::Pos2;
use serde::Serialize;

use crate::network::{ident::link_id, link::Link, node::Node};
use crate::topology::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub confirmed: usize,
    pub carried_over: usize,
    pub links: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct GraphStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    #[serde(skip)]
    links_by_id: HashMap<String, usize>,
    #[serde(skip)]
    index_by_name: HashMap<u32, usize>,
    #[serde(skip)]
    next_local_name: u32,
}

impl GraphStore {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Merge an authoritative snapshot into the current state.
    pub fn replace_snapshot(&mut self, server_nodes: Vec<Node>, server_links: Vec<Link>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let len = server_nodes.len().max(self.nodes.len());
        let mut previous = std::mem::take(&mut self.nodes).into_iter();
        let mut incoming = server_nodes.into_iter();

        let mut merged = Vec::with_capacity(len);
        for _ in 0..len {
            let local = previous.next();
            match incoming.next() {
                Some(mut node) => {
                    node.local_echo = false;
                    report.confirmed += 1;
                    merged.push(node);
                }
                None => {
                    if let Some(node) = local {
                        report.carried_over += 1;
                        merged.push(node);
                    }
                }
            }
        }
        self.nodes = merged;
        self.rebuild_name_index();

        self.links = server_links;
        for link in self.links.iter_mut() {
            link.refresh_id();
        }
        self.rebuild_link_index();
        report.links = self.links.len();

        self.next_local_name = self.nodes.len() as u32;
        report
    }

    pub fn apply(&mut self, snapshot: Snapshot) -> ReconcileReport {
        self.replace_snapshot(snapshot.nodes, snapshot.links)
    }

    /// Append an unconfirmed node. Its name is the current node count, which is the name the
    /// simulator is expected to hand out for it.
    pub fn add_local_node(&mut self, x: f32, y: f32) -> Node {
        let node = Node::new_local(self.next_local_name, x, y);
        self.next_local_name += 1;
        self.index_by_name.insert(node.name, self.nodes.len());
        self.nodes.push(node.clone());
        node
    }

    /// Overwrite a node's position. Returns false if no node has that name.
    pub fn move_node(&mut self, name: u32, x: f32, y: f32) -> bool {
        match self.index_by_name.get(&name).and_then(|&i| self.nodes.get_mut(i)) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    pub fn get_link(&self, id: &str) -> Option<&Link> {
        self.links_by_id.get(id).and_then(|&i| self.links.get(i))
    }

    /// The link joining two nodes, in the ascending endpoint order the simulator emits.
    pub fn link_between(&self, a: u32, b: u32) -> Option<&Link> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.get_link(&link_id(lo, hi))
    }

    pub fn node(&self, name: u32) -> Option<&Node> {
        self.index_by_name.get(&name).and_then(|&i| self.nodes.get(i))
    }

    pub fn node_position(&self, name: u32) -> Option<Pos2> {
        self.node(name).map(Node::position)
    }

    /// Current canvas positions of a link's endpoints.
    pub fn link_endpoints(&self, link: &Link) -> Option<(Pos2, Pos2)> {
        Some((self.node_position(link.source)?, self.node_position(link.target)?))
    }

    fn rebuild_link_index(&mut self) {
        self.links_by_id.clear();
        for (i, link) in self.links.iter().enumerate() {
            self.links_by_id.insert(link.id.clone(), i);
        }
    }

    fn rebuild_name_index(&mut self) {
        self.index_by_name.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.index_by_name.insert(node.name, i);
        }
    }
}
