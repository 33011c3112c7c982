/*
 * This module defines the wire-level graph format shared with the simulator:
 * nodes, links with their tunables and overrides, global defaults, and the identity helpers.
 */

pub mod defaults;
pub mod ident;
pub mod link;
pub mod node;
