/*!
Simulator-facing backend interface.

This module defines:
- `BackendError`: error type for every request the dashboard makes.
- `MeshBackend`: an async trait covering the simulator's HTTP surface.

Transports (e.g. `data_aquisition::http::HttpBackend`) implement `MeshBackend` and hide how
requests are encoded. The rest of the dashboard only ever sees decoded values or errors.
*/

use async_trait::async_trait;
use thiserror::Error;

use crate::network::{defaults::DefaultsConfig, link::Tunable};
use crate::topology::snapshot::Snapshot;

/// Error type for simulator requests.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Backend unreachable, timed out, connection dropped.
    #[error("transport error: {0}")]
    Transport(String),
    /// Backend answered with a non-success status.
    #[error("{method} {path} returned status {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },
    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Convenience result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait MeshBackend: Send + Sync {
    /// `GET /data`
    async fn fetch_snapshot(&self) -> BackendResult<Snapshot>;

    /// `POST /server`
    async fn create_node(&self, x: f32, y: f32) -> BackendResult<()>;

    /// `PUT /server/{name}/position`
    async fn move_node(&self, name: u32, x: f32, y: f32) -> BackendResult<()>;

    /// `PUT /link/{source}/{target}/{type}`
    async fn set_override(
        &self,
        source: u32,
        target: u32,
        tunable: Tunable,
        value: f64,
    ) -> BackendResult<()>;

    /// `DELETE /link/{source}/{target}/{type}`
    async fn clear_override(&self, source: u32, target: u32, tunable: Tunable) -> BackendResult<()>;

    /// `GET /defaults`
    async fn fetch_defaults(&self) -> BackendResult<DefaultsConfig>;

    /// `PUT /defaults`
    async fn put_defaults(&self, defaults: &DefaultsConfig) -> BackendResult<()>;
}
