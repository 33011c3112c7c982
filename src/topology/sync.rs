/*!
Request dispatch and refetch sequencing.

Every mutation the dashboard sends is followed by a full `/data` refetch, whether or not the
mutation succeeded. Requests run as tasks on the tokio runtime and report back to the UI
thread through an unbounded channel that is drained once per frame.

Two refetches may overlap (e.g. two quick override edits). Each refetch is numbered when it
starts and `SnapshotGate` drops any completion older than the last one applied, so a slow
response can never roll the view back.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::network::{defaults::DefaultsConfig, link::Tunable};
use crate::topology::snapshot::Snapshot;
use crate::topology::source::{BackendResult, MeshBackend};

/// A mutation to persist on the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    CreateNode { x: f32, y: f32 },
    MoveNode { name: u32, x: f32, y: f32 },
    SetOverride { source: u32, target: u32, tunable: Tunable, value: f64 },
    ClearOverride { source: u32, target: u32, tunable: Tunable },
    PutDefaults(DefaultsConfig),
}

impl Outbound {
    pub fn describe(&self) -> &'static str {
        match self {
            Outbound::CreateNode { .. } => "create node",
            Outbound::MoveNode { .. } => "move node",
            Outbound::SetOverride { .. } => "pin override",
            Outbound::ClearOverride { .. } => "unpin override",
            Outbound::PutDefaults(_) => "apply defaults",
        }
    }
}

/// Results posted back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    Snapshot { seq: u64, result: BackendResult<Snapshot> },
    Defaults(BackendResult<DefaultsConfig>),
}

/// Admits snapshot completions in request order, dropping stale ones.
#[derive(Debug, Default)]
pub struct SnapshotGate {
    last_applied: Option<u64>,
}

impl SnapshotGate {
    pub fn admit(&mut self, seq: u64) -> bool {
        if self.last_applied.is_some_and(|last| seq <= last) {
            return false;
        }
        self.last_applied = Some(seq);
        true
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn MeshBackend>,
    runtime: Handle,
    completions: UnboundedSender<Completion>,
    next_seq: Arc<AtomicU64>,
    repaint: Option<egui::Context>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn MeshBackend>, runtime: Handle) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            backend,
            runtime,
            completions: tx,
            next_seq: Arc::new(AtomicU64::new(0)),
            repaint: None,
        };
        (dispatcher, rx)
    }

    /// Wake the UI whenever a completion is posted.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn refetch(&self) {
        let this = self.clone();
        self.runtime.spawn(async move { this.fetch_snapshot().await });
    }

    pub fn refresh_defaults(&self) {
        let this = self.clone();
        self.runtime.spawn(async move { this.fetch_defaults().await });
    }

    /// Persist a mutation, then refetch. Failures are logged and never retried.
    pub fn dispatch(&self, outbound: Outbound) {
        let this = self.clone();
        self.runtime.spawn(async move {
            match perform(this.backend.as_ref(), &outbound).await {
                Ok(()) => debug!(request = outbound.describe(), "Request completed"),
                Err(e) => warn!(request = outbound.describe(), error = %e, "Request failed"),
            }
            if matches!(outbound, Outbound::PutDefaults(_)) {
                this.fetch_defaults().await;
            }
            this.fetch_snapshot().await;
        });
    }

    async fn fetch_snapshot(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let result = self.backend.fetch_snapshot().await;
        if let Err(e) = &result {
            warn!(seq, error = %e, "Snapshot fetch failed");
        }
        self.post(Completion::Snapshot { seq, result });
    }

    async fn fetch_defaults(&self) {
        let result = self.backend.fetch_defaults().await;
        if let Err(e) = &result {
            warn!(error = %e, "Defaults fetch failed");
        }
        self.post(Completion::Defaults(result));
    }

    fn post(&self, completion: Completion) {
        // The receiver only goes away when the window closes.
        if self.completions.send(completion).is_err() {
            debug!("Completion dropped, UI is gone");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

async fn perform(backend: &dyn MeshBackend, outbound: &Outbound) -> BackendResult<()> {
    match outbound {
        Outbound::CreateNode { x, y } => backend.create_node(*x, *y).await,
        Outbound::MoveNode { name, x, y } => backend.move_node(*name, *x, *y).await,
        Outbound::SetOverride { source, target, tunable, value } => {
            backend.set_override(*source, *target, *tunable, *value).await
        }
        Outbound::ClearOverride { source, target, tunable } => {
            backend.clear_override(*source, *target, *tunable).await
        }
        Outbound::PutDefaults(defaults) => backend.put_defaults(defaults).await,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::network::node::Node;
    use crate::topology::source::BackendError;

    /// In-memory simulator that records every call.
    #[derive(Default)]
    pub(crate) struct MemoryBackend {
        pub calls: Mutex<Vec<String>>,
        pub snapshot: Mutex<Snapshot>,
        pub fail_mutations: bool,
    }

    impl MemoryBackend {
        fn record(&self, call: String) -> BackendResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail_mutations {
                Err(BackendError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl MeshBackend for MemoryBackend {
        async fn fetch_snapshot(&self) -> BackendResult<Snapshot> {
            self.calls.lock().unwrap().push("GET /data".to_string());
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn create_node(&self, x: f32, y: f32) -> BackendResult<()> {
            if !self.fail_mutations {
                let mut snapshot = self.snapshot.lock().unwrap();
                let name = snapshot.nodes.len() as u32;
                snapshot.nodes.push(Node::new(name, x, y));
            }
            self.record("POST /server".to_string())
        }

        async fn move_node(&self, name: u32, _x: f32, _y: f32) -> BackendResult<()> {
            self.record(format!("PUT /server/{name}/position"))
        }

        async fn set_override(&self, source: u32, target: u32, tunable: Tunable, value: f64) -> BackendResult<()> {
            self.record(format!("PUT /link/{source}/{target}/{tunable} {value}"))
        }

        async fn clear_override(&self, source: u32, target: u32, tunable: Tunable) -> BackendResult<()> {
            self.record(format!("DELETE /link/{source}/{target}/{tunable}"))
        }

        async fn fetch_defaults(&self) -> BackendResult<DefaultsConfig> {
            self.calls.lock().unwrap().push("GET /defaults".to_string());
            Ok(DefaultsConfig::default())
        }

        async fn put_defaults(&self, _defaults: &DefaultsConfig) -> BackendResult<()> {
            self.record("PUT /defaults".to_string())
        }
    }

    #[test]
    fn gate_drops_stale_completions() {
        let mut gate = SnapshotGate::default();
        assert!(gate.admit(0));
        assert!(gate.admit(2));
        assert!(!gate.admit(1));
        assert!(!gate.admit(2));
        assert!(gate.admit(3));
    }

    #[tokio::test]
    async fn mutation_is_followed_by_refetch() {
        let backend = Arc::new(MemoryBackend::default());
        let (dispatcher, mut rx) = Dispatcher::new(backend.clone(), Handle::current());

        dispatcher.dispatch(Outbound::CreateNode { x: 10.0, y: 20.0 });
        let Some(Completion::Snapshot { seq, result }) = rx.recv().await else {
            panic!("expected a snapshot completion");
        };
        assert_eq!(seq, 0);
        assert_eq!(result.unwrap().nodes.len(), 1);
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["POST /server".to_string(), "GET /data".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_mutation_still_refetches() {
        let backend = Arc::new(MemoryBackend {
            fail_mutations: true,
            ..Default::default()
        });
        let (dispatcher, mut rx) = Dispatcher::new(backend.clone(), Handle::current());

        dispatcher.dispatch(Outbound::MoveNode { name: 3, x: 1.0, y: 2.0 });
        let completion = rx.recv().await;
        assert!(matches!(completion, Some(Completion::Snapshot { result: Ok(_), .. })));
        assert_eq!(backend.calls.lock().unwrap()[0], "PUT /server/3/position");
    }

    #[tokio::test]
    async fn applying_defaults_rereads_both_documents() {
        let backend = Arc::new(MemoryBackend::default());
        let (dispatcher, mut rx) = Dispatcher::new(backend.clone(), Handle::current());

        dispatcher.dispatch(Outbound::PutDefaults(DefaultsConfig::default()));
        assert!(matches!(rx.recv().await, Some(Completion::Defaults(Ok(_)))));
        assert!(matches!(rx.recv().await, Some(Completion::Snapshot { .. })));
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["PUT /defaults", "GET /defaults", "GET /data"]
        );
    }
}
