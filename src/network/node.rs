use egui::Pos2;
use serde::{Deserialize, Serialize};

/// A simulated server placed on the canvas.
///
/// `name` is assigned by the simulator and, under its numbering, equals the node's
/// position in the snapshot. A node created locally carries `local_echo = true` until a
/// snapshot confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local_echo: bool,
}

impl Node {
    #[cfg(test)]
    pub fn new(name: u32, x: f32, y: f32) -> Self {
        Self {
            name,
            x,
            y,
            local_echo: false,
        }
    }

    pub fn new_local(name: u32, x: f32, y: f32) -> Self {
        Self {
            name,
            x,
            y,
            local_echo: true,
        }
    }

    pub fn position(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }
}
