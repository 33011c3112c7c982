/*!
Identity helpers shared by the store, the scene and the message animator.

This module defines:
- `hash_string`: deterministic 32-bit string hash used to correlate sent/received messages visually.
- `link_id`: canonical link identifier in server endpoint order.
- `Category`: one of ten palette slots, derived from a hash or a node position.
*/

use egui::Color32;

/// d3 "category10" palette.
const PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// Rolling hash with multiplier 31 over UTF-16 code units, wrapping to `i32`.
///
/// Matches the hash the simulator's web frontend used, so colours line up across both.
pub fn hash_string(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}

/// Link identifier, `l_<source>_<target>`. The endpoint order is kept as given.
pub fn link_id(source: u32, target: u32) -> String {
    format!("l_{source}_{target}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category(u8);

impl Category {
    pub fn from_hash(hash: i32) -> Self {
        Category(hash.rem_euclid(PALETTE.len() as i32) as u8)
    }

    pub fn from_index(index: usize) -> Self {
        Category((index % PALETTE.len()) as u8)
    }

    pub fn for_event(event_id: &str) -> Self {
        Self::from_hash(hash_string(event_id))
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn color(&self) -> Color32 {
        PALETTE[self.index()]
    }
}
