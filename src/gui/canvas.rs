/*!
The central canvas: pointer routing and painting.

This module defines:
- `show`, which reads this frame's pointer input, routes it to the interaction controller
  and paints the scene, markers and halos on top of each other
- `press`, the hit-test order for a pointer press (node, then link, then background)

Canvas coordinates are the simulator's coordinates; the painter rect's top-left corner is
the origin.
*/

use std::time::Instant;

use catppuccin_egui::Theme;
use egui::{Align2, Color32, FontId, Painter, PointerButton, Pos2, Sense, Stroke, Ui, Vec2, vec2};

use crate::gui::dashboard::Dashboard;
use crate::topology::sync::Outbound;

pub const NODE_RADIUS: f32 = 6.0;
const NODE_HIT_RADIUS: f32 = 10.0;
const LINK_HIT_TOLERANCE: f32 = 4.0;
const MARKER_RADIUS: f32 = 4.0;

/// Route a press at canvas position `pos`.
pub fn press(dashboard: &mut Dashboard, pos: Pos2, button: PointerButton) -> Option<Outbound> {
    let Dashboard {
        store,
        scene,
        interaction,
        ..
    } = dashboard;

    if let Some(name) = scene.node_at(pos, NODE_HIT_RADIUS) {
        interaction.start_drag(store, name, pos, button);
        return None;
    }
    if let Some(id) = scene.link_at(pos, LINK_HIT_TOLERANCE).map(str::to_owned) {
        interaction.press_link(store, scene, &id, button);
        return None;
    }
    interaction.press_background(store, scene, pos, button)
}

enum PointerInput {
    Press(Pos2, PointerButton),
    Release,
}

/// Handle this frame's input and paint. Returns the requests the gestures produced.
pub fn show(ui: &mut Ui, dashboard: &mut Dashboard, theme: &Theme, now: Instant) -> Vec<Outbound> {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let origin = response.rect.min.to_vec2();

    let inputs: Vec<PointerInput> = ui.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed: true,
                    ..
                } if response.rect.contains(*pos) => Some(PointerInput::Press(*pos - origin, *button)),
                egui::Event::PointerButton {
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } => Some(PointerInput::Release),
                _ => None,
            })
            .collect()
    });
    let pointer = ui.input(|i| i.pointer.latest_pos()).map(|pos| pos - origin);

    let mut outbound = Vec::new();
    for input in inputs {
        match input {
            PointerInput::Press(pos, button) => outbound.extend(press(dashboard, pos, button)),
            PointerInput::Release => {
                if let Some(pos) = pointer {
                    drag(dashboard, pos);
                }
                outbound.extend(dashboard.interaction.end_drag(&dashboard.store));
            }
        }
    }
    if let Some(pos) = pointer {
        drag(dashboard, pos);
    }

    paint(&painter, origin, dashboard, theme, now);
    outbound
}

fn drag(dashboard: &mut Dashboard, pointer: Pos2) {
    let Dashboard {
        store,
        scene,
        interaction,
        ..
    } = dashboard;
    interaction.drag_to(store, scene, pointer);
}

fn paint(painter: &Painter, origin: Vec2, dashboard: &Dashboard, theme: &Theme, now: Instant) {
    let to_screen = |p: Pos2| p + origin;
    let label_font = FontId::proportional(11.0);

    for link in dashboard.scene.links() {
        let (stroke, text) = if link.highlighted {
            (Stroke::new(2.5, theme.red), theme.red)
        } else {
            (Stroke::new(1.5, theme.overlay1), theme.subtext0)
        };
        painter.line_segment([to_screen(link.from), to_screen(link.to)], stroke);

        let mid = to_screen(link.midpoint());
        painter.text(mid - vec2(0.0, 3.0), Align2::CENTER_BOTTOM, &link.latency_label, label_font.clone(), text);
        painter.text(mid + vec2(0.0, 3.0), Align2::CENTER_TOP, &link.bandwidth_label, label_font.clone(), text);
    }

    for node in dashboard.scene.nodes() {
        let center = to_screen(node.center);
        painter.circle(center, NODE_RADIUS, Color32::WHITE, Stroke::new(2.0, node.ring));
        if let Some(label) = &node.label {
            painter.text(center + vec2(10.0, 2.0), Align2::LEFT_CENTER, label, label_font.clone(), theme.text);
        }
    }

    for marker in dashboard.animator.markers(&dashboard.store, now) {
        painter.circle_filled(to_screen(marker.position), MARKER_RADIUS, marker.color);
    }

    for halo in dashboard.animator.halo_frames(now) {
        painter.circle(
            to_screen(halo.center),
            halo.radius,
            halo.color.gamma_multiply(halo.fill_alpha),
            Stroke::new(1.5, halo.color.gamma_multiply(halo.stroke_alpha)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::snapshot::Snapshot;

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::default();
        let snapshot = Snapshot::from_json(include_str!("../../test_data/snapshot.json")).unwrap();
        dashboard.apply_snapshot(0, Ok(snapshot));
        dashboard
    }

    #[test]
    fn press_on_node_starts_drag() {
        let mut dashboard = dashboard();
        assert_eq!(press(&mut dashboard, Pos2::new(104.0, 118.0), PointerButton::Primary), None);
        assert_eq!(dashboard.interaction.dragging(), Some(0));
        assert_eq!(dashboard.store.nodes().len(), 3);
    }

    #[test]
    fn release_without_motion_keeps_node_in_place() {
        let mut dashboard = dashboard();
        press(&mut dashboard, Pos2::new(104.0, 118.0), PointerButton::Primary);
        drag(&mut dashboard, Pos2::new(104.0, 118.0));

        let outbound = dashboard.interaction.end_drag(&dashboard.store);
        assert_eq!(outbound, Some(Outbound::MoveNode { name: 0, x: 100.0, y: 120.0 }));
        assert_eq!(dashboard.scene.node(0).unwrap().center, Pos2::new(100.0, 120.0));
    }

    #[test]
    fn press_on_link_selects_it() {
        let mut dashboard = dashboard();
        // midpoint of node 0 (100,120) and node 2 (200,260)
        assert_eq!(press(&mut dashboard, Pos2::new(150.0, 190.0), PointerButton::Primary), None);
        assert_eq!(dashboard.interaction.selected(), Some("l_0_2"));
        assert_eq!(dashboard.scene.selection(), Some("l_0_2"));
    }

    #[test]
    fn press_on_background_creates_node() {
        let mut dashboard = dashboard();
        let outbound = press(&mut dashboard, Pos2::new(400.0, 400.0), PointerButton::Primary);
        assert_eq!(outbound, Some(Outbound::CreateNode { x: 400.0, y: 400.0 }));
        assert_eq!(dashboard.store.nodes().len(), 4);
    }

    #[test]
    fn secondary_press_is_ignored_everywhere() {
        let mut dashboard = dashboard();
        assert_eq!(press(&mut dashboard, Pos2::new(100.0, 120.0), PointerButton::Secondary), None);
        assert_eq!(press(&mut dashboard, Pos2::new(150.0, 190.0), PointerButton::Secondary), None);
        assert_eq!(press(&mut dashboard, Pos2::new(400.0, 400.0), PointerButton::Secondary), None);
        assert_eq!(dashboard.interaction.dragging(), None);
        assert_eq!(dashboard.interaction.selected(), None);
        assert_eq!(dashboard.store.nodes().len(), 3);
    }
}
