/*!
Topology module

This module holds the dashboard's authoritative view of the simulated mesh and the interface
used to talk to the simulator.

Structure:
- `snapshot`: Lenient decoding of `/data` responses.
- `store`: `GraphStore`, the in-memory graph and the snapshot reconciliation algorithm.
- `source`: `MeshBackend`, the async trait implemented by transports, plus `BackendError`.
- `sync`: `Dispatcher`, which runs outbound requests and refetches, and `SnapshotGate`.

Re-exports:
- `GraphStore`, `MeshBackend` and `Snapshot` for easy consumption by the GUI layer.
*/

pub mod snapshot;
pub mod source;
pub mod store;
pub mod sync;

pub use snapshot::Snapshot;
pub use source::MeshBackend;
pub use store::GraphStore;
