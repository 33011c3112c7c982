/*
 * This module provides the transports the dashboard uses to reach the simulator.
 * It doesn't care what the data means, just how it gets here.
 * `http` implements `MeshBackend` over REST, `event_stream` reads the push channel.
 */

pub mod event_stream;
pub mod http;
