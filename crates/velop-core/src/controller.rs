// ── Controller abstraction ──
//
// Full lifecycle management for one mesh instance. Handles
// authentication, the initial reconciliation pass, background polling,
// and reactive state streaming through the MeshStore.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{LoggingMode, MeshConfig};
use crate::convert::snapshot_from_details;
use crate::error::CoreError;
use crate::events::{LoggingStoppedPayload, MeshEvent};
use crate::model::MeshSnapshot;
use crate::reconcile::{
    IdentityStore, MeshSource, NullIdentityStore, NullReloadHandle, ReconcileContext, ReloadGuard,
    ReloadHandle, RunState, run_cycle,
};
use crate::store::{MeshStore, Signal, SnapshotStream};

use futures_core::future::BoxFuture;
use velop_api::{JnapClient, TransportConfig};

const EVENT_CHANNEL_SIZE: usize = 256;
const SIGNAL_CHANNEL_SIZE: usize = 16;

// ── JNAP-backed mesh source ──────────────────────────────────────

/// Mesh state source backed by a live JNAP client.
struct JnapSource {
    client: Arc<JnapClient>,
    host: String,
}

impl MeshSource for JnapSource {
    fn fetch_state(&self) -> BoxFuture<'_, Result<MeshSnapshot, CoreError>> {
        Box::pin(async move {
            let details = self.client.gather_details().await?;
            Ok(snapshot_from_details(details, &self.host))
        })
    }
}

// ── MeshController ───────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Manages the full
/// mesh lifecycle: authentication, the initial reconciliation pass,
/// periodic polling, and reactive snapshot streaming.
#[derive(Clone)]
pub struct MeshController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: MeshConfig,
    ctx: ReconcileContext,
    run_state: watch::Sender<RunState>,
    cancel: CancellationToken,
    /// Child token for the current session — cancelled on disconnect,
    /// replaced on reconnect (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    /// Set once the initial cycle has succeeded; cleared on disconnect.
    source: Mutex<Option<Arc<dyn MeshSource>>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl MeshController {
    /// Create a controller with no durable identity store and no reload
    /// capability. Does NOT connect — call [`connect()`](Self::connect)
    /// to authenticate and start background tasks.
    pub fn new(config: MeshConfig) -> Self {
        Self::with_collaborators(config, Arc::new(NullIdentityStore), Arc::new(NullReloadHandle))
    }

    /// Create a controller wired to an embedder's identity store and
    /// reload handle.
    pub fn with_collaborators(
        config: MeshConfig,
        identity: Arc<dyn IdentityStore>,
        reload: Arc<dyn ReloadHandle>,
    ) -> Self {
        let (run_state, run_state_rx) = watch::channel(RunState::Starting);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        let ctx = ReconcileContext {
            mesh_id: config.mesh_id(),
            store: Arc::new(MeshStore::new()),
            events: event_tx,
            signals: signal_tx,
            run_state: run_state_rx,
            reload_guard: Arc::new(ReloadGuard::new()),
            identity,
            reload,
            primary_serial: std::sync::Mutex::new(config.primary_serial.clone()),
        };

        Self {
            inner: Arc::new(ControllerInner {
                config,
                ctx,
                run_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                source: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Convenience constructor for embedders that only have a host and
    /// a password.
    pub fn for_host(host: impl Into<String>, password: SecretString) -> Self {
        Self::new(MeshConfig {
            host: host.into(),
            password,
            ..MeshConfig::default()
        })
    }

    /// Access the mesh configuration.
    pub fn config(&self) -> &MeshConfig {
        &self.inner.config
    }

    /// Access the underlying MeshStore.
    pub fn store(&self) -> &Arc<MeshStore> {
        &self.inner.ctx.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the mesh.
    ///
    /// Verifies the admin password, runs the initial reconciliation
    /// pass (a failure here aborts the connect), then spawns the
    /// periodic poll and device-tracker tasks.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self.inner.run_state.send(RunState::Starting);

        // Fresh child token for this session (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = TransportConfig {
            timeout: config.request_timeout,
        };
        let client = Arc::new(JnapClient::new(&config.host, &config.password, &transport)?);

        client.check_password().await?;
        debug!(host = %config.host, "admin password accepted");

        if config.logging_mode == LoggingMode::SinglePoll {
            info!(mesh = %self.inner.ctx.mesh_id, "verbose diagnostics enabled for the first poll");
        }

        // Initial reconciliation pass — a mesh we cannot read is a
        // failed connect, not a degraded one.
        let source: Arc<dyn MeshSource> = Arc::new(JnapSource {
            client,
            host: config.host.clone(),
        });
        run_cycle(source.as_ref(), &self.inner.ctx).await?;

        if config.logging_mode == LoggingMode::SinglePoll {
            // The one-shot diagnostic dump single-poll mode promises;
            // filtering beyond this stays with the embedder's tracing
            // subscriber.
            if let Some(snapshot) = self.inner.ctx.store.snapshot() {
                info!(
                    mesh = %self.inner.ctx.mesh_id,
                    nodes = snapshot.nodes.len(),
                    devices = snapshot.devices.len(),
                    wan_connected = snapshot.wan.as_ref().is_some_and(|w| w.connected),
                    guest_wifi = snapshot.guest_wifi_enabled,
                    speedtest_running = snapshot.speedtest_running,
                    "first poll diagnostics"
                );
            }
            info!(mesh = %self.inner.ctx.mesh_id, "verbose diagnostics reverted after the first poll");
            let event = MeshEvent::LoggingStopped(LoggingStoppedPayload {
                name: config.name.clone(),
            });
            let _ = self.inner.ctx.events.send(Arc::new(event));
        }

        *self.inner.source.lock().await = Some(source);

        let _ = self.inner.run_state.send(RunState::Running);

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if config.scan_interval_secs > 0 {
            let controller = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(poll_task(
                controller,
                config.scan_interval_secs,
                cancel,
            )));
        }

        if config.device_trackers && config.tracker_interval_secs > 0 {
            let signals = self.inner.ctx.signals.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(tracker_task(
                signals,
                config.tracker_interval_secs,
                cancel,
            )));
        }

        info!(mesh = %self.inner.ctx.mesh_id, "connected");
        Ok(())
    }

    /// Disconnect from the mesh and stop all background tasks.
    pub async fn disconnect(&self) {
        let _ = self.inner.run_state.send(RunState::Stopping);

        // Cancel the child token (not the parent — allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        // Join all background tasks
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.source.lock().await = None;
        debug!(mesh = %self.inner.ctx.mesh_id, "disconnected");
    }

    /// Run one reconciliation cycle against the mesh now.
    ///
    /// Normally driven by the poll task; exposed for embedders that
    /// want an out-of-band refresh.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let source = self
            .inner
            .source
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)?;

        run_cycle(source.as_ref(), &self.inner.ctx).await?;
        Ok(())
    }

    // ── Read access ──────────────────────────────────────────────

    /// The latest published snapshot, if any cycle has completed.
    pub fn snapshot(&self) -> Option<Arc<MeshSnapshot>> {
        self.inner.ctx.store.snapshot()
    }

    /// Subscribe to snapshot publications.
    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.ctx.store.subscribe()
    }

    /// Subscribe to mesh change events.
    pub fn events(&self) -> broadcast::Receiver<Arc<MeshEvent>> {
        self.inner.ctx.events.subscribe()
    }

    /// Subscribe to out-of-band refresh signals.
    pub fn signals(&self) -> broadcast::Receiver<Signal> {
        self.inner.ctx.signals.subscribe()
    }

    /// Observe the controller's run state.
    pub fn run_state(&self) -> watch::Receiver<RunState> {
        self.inner.run_state.subscribe()
    }

    /// How long ago the last successful cycle published, or `None` if
    /// none has.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.inner.ctx.store.data_age()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically run a reconciliation cycle until cancelled.
///
/// Cancellation also interrupts a cycle already in flight: the dropped
/// cycle never reaches its publish stage, so the store keeps the state
/// from the last completed cycle.
async fn poll_task(controller: MeshController, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match cancel.run_until_cancelled(controller.refresh()).await {
                    Some(Err(e)) => warn!(error = %e, "periodic mesh poll failed"),
                    Some(Ok(())) => {}
                    None => break,
                }
            }
        }
    }
}

/// Nudge device-tracker consumers on their own, faster cadence.
async fn tracker_task(
    signals: broadcast::Sender<Signal>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let _ = signals.send(Signal::DeviceTrackers);
            }
        }
    }
}
