// ── Reconciliation cycle ──
//
// One fetch → diff → notify → reload-decide → publish pass, run on a
// fixed schedule by the controller. The scheduler's cadence is the only
// retry mechanism: a failed fetch surfaces as a retryable error and
// leaves the published state untouched. Everything downstream of the
// fetch is contained — notification and reload failures never mark the
// cycle as failed.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures_core::future::BoxFuture;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};

use crate::diff::diff_snapshots;
use crate::error::CoreError;
use crate::events::{MeshEvent, NewDevicePayload, NewNodePayload, PrimaryNodePayload};
use crate::model::MeshSnapshot;
use crate::store::{MeshStore, Signal};

// ── Collaborator seams ──────────────────────────────────────────────

/// Supplies the current mesh state. Implemented by the JNAP-backed
/// source; test doubles implement it directly.
pub trait MeshSource: Send + Sync {
    fn fetch_state(&self) -> BoxFuture<'_, Result<MeshSnapshot, CoreError>>;
}

/// Durable store for the mesh's primary-node identity. A single
/// key-value update, called only from the publishing stage.
pub trait IdentityStore: Send + Sync {
    fn record_primary(&self, serial: &str) -> Result<(), CoreError>;
}

/// Host-level "reload this mesh instance" trigger.
pub trait ReloadHandle: Send + Sync {
    fn reload(&self) -> BoxFuture<'_, Result<(), CoreError>>;
}

/// Identity store that records nothing. Default for embedders without
/// durable config.
pub struct NullIdentityStore;

impl IdentityStore for NullIdentityStore {
    fn record_primary(&self, _serial: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Reload handle that does nothing.
pub struct NullReloadHandle;

impl ReloadHandle for NullReloadHandle {
    fn reload(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async { Ok(()) })
    }
}

// ── Host run state ──────────────────────────────────────────────────

/// Lifecycle state of the embedding host, observed over a watch channel.
///
/// Identity updates, the primary-node event, and reloads are suppressed
/// unless the host is fully [`Running`](Self::Running) — this avoids
/// identity churn during the bulk of startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Starting,
    Running,
    Stopping,
}

// ── Reload guard ────────────────────────────────────────────────────

/// Shared map of meshes with a reload in flight.
///
/// `begin` is a single atomic check-and-set: it protects against a
/// reload starting twice for the same new-node detection, not against
/// concurrent cycles (the host's single-flight scheduling rules those
/// out). The flag is cleared unconditionally once the reload returns,
/// even on failure, so future new-node detections are never wedged.
#[derive(Default)]
pub struct ReloadGuard {
    in_progress: DashMap<String, ()>,
}

impl ReloadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the reload slot for a mesh. Returns `true` if this
    /// caller acquired it.
    pub fn begin(&self, mesh_id: &str) -> bool {
        self.in_progress.insert(mesh_id.to_owned(), ()).is_none()
    }

    /// Release the reload slot.
    pub fn finish(&self, mesh_id: &str) {
        self.in_progress.remove(mesh_id);
    }

    pub fn is_reloading(&self, mesh_id: &str) -> bool {
        self.in_progress.contains_key(mesh_id)
    }
}

// ── Context ─────────────────────────────────────────────────────────

/// Everything one reconciliation cycle needs, owned by the controller
/// for the lifetime of the mesh instance. Explicit context object —
/// no ambient process-wide state.
pub struct ReconcileContext {
    /// Stable identifier of this mesh (keys the reload guard).
    pub mesh_id: String,
    pub store: Arc<MeshStore>,
    pub events: broadcast::Sender<Arc<MeshEvent>>,
    pub signals: broadcast::Sender<Signal>,
    pub run_state: watch::Receiver<RunState>,
    pub reload_guard: Arc<ReloadGuard>,
    pub identity: Arc<dyn IdentityStore>,
    pub reload: Arc<dyn ReloadHandle>,
    /// The mesh's recorded primary serial; updated only after a
    /// successful identity persist.
    pub primary_serial: Mutex<Option<String>>,
}

impl ReconcileContext {
    pub fn recorded_primary(&self) -> Option<String> {
        self.primary_serial.lock().ok().and_then(|g| (*g).clone())
    }

    fn set_recorded_primary(&self, serial: &str) {
        if let Ok(mut guard) = self.primary_serial.lock() {
            *guard = Some(serial.to_owned());
        }
    }

    fn is_running(&self) -> bool {
        *self.run_state.borrow() == RunState::Running
    }
}

/// Summary of what one cycle did, for logging and tests.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub new_devices: usize,
    pub new_nodes: usize,
    pub updated_nodes: usize,
    /// Serial persisted as the new primary identity, when that happened.
    pub primary_changed: Option<String>,
    pub reloaded: bool,
}

// ── The cycle ───────────────────────────────────────────────────────

/// Run one reconciliation cycle: fetch the current mesh state, diff it
/// against the previously published state, emit change events, decide
/// on a topology reload, and publish the new snapshot.
///
/// Only the fetch stage can fail the cycle. On any fetch error the
/// published state is left exactly as it was — stale but consistent —
/// and the error is surfaced for the scheduler to retry at the next
/// fixed interval.
pub async fn run_cycle(
    source: &dyn MeshSource,
    ctx: &ReconcileContext,
) -> Result<CycleReport, CoreError> {
    debug!(mesh = %ctx.mesh_id, "reconciliation cycle entered");

    // Previous identifier sets come from the prior cycle's publication,
    // never from the snapshot being built in this one.
    let previous = ctx.store.known();

    let snapshot = match source.fetch_state().await {
        Ok(snapshot) => snapshot,
        Err(err) if err.is_timeout() => {
            warn!(
                mesh = %ctx.mesh_id,
                error = %err,
                "timeout gathering data from the mesh — retrying at the next scheduled poll"
            );
            return Err(err);
        }
        Err(err) => {
            error!(mesh = %ctx.mesh_id, error = %err, "failed to gather data from the mesh");
            return Err(err);
        }
    };

    if snapshot.speedtest_running {
        debug!(mesh = %ctx.mesh_id, "dispatching speedtest status signal");
        let _ = ctx.signals.send(Signal::SpeedtestStatus);
    }

    let recorded = ctx.recorded_primary();
    let diff = diff_snapshots(previous.as_ref(), &snapshot, recorded.as_deref());

    let mut report = CycleReport {
        new_devices: diff.new_devices.len(),
        new_nodes: diff.new_nodes.len(),
        updated_nodes: diff.updated_nodes.len(),
        ..CycleReport::default()
    };

    // ── New devices ──────────────────────────────────────────────────
    for device in &diff.new_devices {
        let event = MeshEvent::NewDevice(NewDevicePayload::for_device(device, &ctx.mesh_id));
        debug!(
            mesh = %ctx.mesh_id,
            event = event.name(),
            device = %device.unique_id,
            "new device on mesh"
        );
        let _ = ctx.events.send(Arc::new(event));
    }

    // ── New nodes, with the inline reload decision ───────────────────
    if !diff.new_nodes.is_empty() && !ctx.reload_guard.is_reloading(&ctx.mesh_id) {
        for node in &diff.new_nodes {
            debug!(mesh = %ctx.mesh_id, serial = %node.serial, "new node found");

            if ctx.is_running() && ctx.reload_guard.begin(&ctx.mesh_id) {
                match ctx.reload.reload().await {
                    Ok(()) => report.reloaded = true,
                    Err(err) => {
                        warn!(mesh = %ctx.mesh_id, error = %err, "reload failed");
                    }
                }
                // Cleared even on failure so future new-node
                // detections are never permanently wedged.
                ctx.reload_guard.finish(&ctx.mesh_id);
            }

            let event = MeshEvent::NewNode(NewNodePayload::for_node(node, &ctx.mesh_id));
            let _ = ctx.events.send(Arc::new(event));
        }
    }

    // ── Updated nodes ────────────────────────────────────────────────
    // The new values land in the published snapshot; registry-facing
    // consumers pick the rename up from there.
    for update in &diff.updated_nodes {
        for change in &update.changes {
            debug!(
                mesh = %ctx.mesh_id,
                serial = %update.node.serial,
                field = %change.field,
                old = %change.old,
                new = %change.new,
                "updating node field"
            );
        }
    }

    // ── Primary-node change ──────────────────────────────────────────
    if let Some(primary) = &diff.primary_changed {
        debug!(
            mesh = %ctx.mesh_id,
            serial = %primary.serial,
            "assuming the primary node has changed"
        );
        if ctx.is_running() {
            match ctx.identity.record_primary(&primary.serial) {
                Ok(()) => {
                    ctx.set_recorded_primary(&primary.serial);
                    report.primary_changed = Some(primary.serial.clone());
                    let event = MeshEvent::PrimaryNodeChanged(PrimaryNodePayload::for_node(
                        primary,
                        &ctx.mesh_id,
                    ));
                    let _ = ctx.events.send(Arc::new(event));
                }
                Err(err) => {
                    warn!(
                        mesh = %ctx.mesh_id,
                        error = %err,
                        "failed to persist primary node identity"
                    );
                }
            }
        } else {
            debug!(
                mesh = %ctx.mesh_id,
                "backing off identity updates until the host is fully running"
            );
        }
    }

    // ── Publish ──────────────────────────────────────────────────────
    ctx.store.publish(Arc::new(snapshot));

    debug!(mesh = %ctx.mesh_id, "reconciliation cycle exited");
    Ok(report)
}
