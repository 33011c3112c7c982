/*
 * This module holds everything the dashboard window shows and how the user drives it.
 * `dashboard` owns the session state, `canvas` and `app` put it on screen.
 */

pub mod app;
pub mod canvas;
pub mod dashboard;
pub mod defaults_panel;
pub mod interaction;
pub mod message_anim;
pub mod overrides;
pub mod scene;
