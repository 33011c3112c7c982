/*!
Pointer gestures on the canvas.

Every gesture applies its effect to the store and the scene straight away and hands back the
request that persists it, if any. The caller dispatches that request; the refetch that
follows it eventually replaces whatever was guessed locally.
*/

use egui::{PointerButton, Pos2, Vec2};
use tracing::debug;

use crate::gui::overrides::{OverrideError, OverridePanel};
use crate::gui::scene::Scene;
use crate::network::link::{Link, Tunable};
use crate::topology::store::GraphStore;
use crate::topology::sync::Outbound;

#[derive(Debug, Default)]
pub struct Interaction {
    selected: Option<String>,
    panel: Option<OverridePanel>,
    dragging: Option<Drag>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    name: u32,
    /// Pointer position relative to the node centre when the drag started.
    grab: Vec2,
}

impl Interaction {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn panel(&self) -> Option<&OverridePanel> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut OverridePanel> {
        self.panel.as_mut()
    }

    pub fn dragging(&self) -> Option<u32> {
        self.dragging.map(|drag| drag.name)
    }

    /// Press on empty canvas: create a node where the pointer is.
    pub fn press_background(
        &mut self,
        store: &mut GraphStore,
        scene: &mut Scene,
        pos: Pos2,
        button: PointerButton,
    ) -> Option<Outbound> {
        if button != PointerButton::Primary {
            return None;
        }
        let node = store.add_local_node(pos.x, pos.y);
        debug!(name = node.name, x = node.x, y = node.y, "Local echo node created");
        scene.render(store);
        self.after_render(store, scene);
        Some(Outbound::CreateNode { x: node.x, y: node.y })
    }

    /// Press on a node at `pointer`. Starting a drag has no other effect.
    pub fn start_drag(&mut self, store: &GraphStore, name: u32, pointer: Pos2, button: PointerButton) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        let Some(center) = store.node_position(name) else {
            return false;
        };
        self.dragging = Some(Drag {
            name,
            grab: pointer - center,
        });
        true
    }

    /// Pointer moved during a drag. The node keeps its offset from the pointer.
    pub fn drag_to(&mut self, store: &mut GraphStore, scene: &mut Scene, pointer: Pos2) {
        let Some(Drag { name, grab }) = self.dragging else {
            return;
        };
        let pos = pointer - grab;
        if store.node_position(name) == Some(pos) {
            return;
        }
        if store.move_node(name, pos.x, pos.y) {
            scene.place_node(name, pos);
            scene.update_links_only(store);
        }
    }

    /// Drag released: persist the node's final position.
    pub fn end_drag(&mut self, store: &GraphStore) -> Option<Outbound> {
        let name = self.dragging.take()?.name;
        let node = store.node(name)?;
        Some(Outbound::MoveNode {
            name,
            x: node.x,
            y: node.y,
        })
    }

    /// Press on a link: toggle its selection.
    pub fn press_link(&mut self, store: &GraphStore, scene: &mut Scene, id: &str, button: PointerButton) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        if self.selected.as_deref() == Some(id) {
            self.select(None, scene);
        } else {
            self.select(store.get_link(id), scene);
        }
        true
    }

    /// After a full render: re-highlight the selected link if it survived, otherwise drop
    /// the selection and its panel. The panel is refilled from the fresh link.
    pub fn after_render(&mut self, store: &GraphStore, scene: &mut Scene) {
        let link = self.selected.as_deref().and_then(|id| store.get_link(id));
        if self.selected.is_some() && link.is_none() {
            debug!(link = self.selected.as_deref(), "Selected link vanished");
        }
        self.select(link, scene);
    }

    fn select(&mut self, link: Option<&Link>, scene: &mut Scene) {
        scene.set_selection(None);
        self.selected = None;
        self.panel = None;

        let Some(link) = link else {
            return;
        };
        if scene.set_selection(Some(&link.id)) {
            debug!(
                link = %link.id,
                pinned = ?link.overrides.pinned().collect::<Vec<_>>(),
                "Link selected"
            );
            self.selected = Some(link.id.clone());
            self.panel = Some(OverridePanel::for_link(link));
        }
    }

    pub fn pin(&self, tunable: Tunable) -> Result<Outbound, OverrideError> {
        self.panel.as_ref().ok_or(OverrideError::NoSelection)?.pin(tunable)
    }

    pub fn unpin(&self, tunable: Tunable) -> Result<Outbound, OverrideError> {
        Ok(self.panel.as_ref().ok_or(OverrideError::NoSelection)?.unpin(tunable))
    }
}
