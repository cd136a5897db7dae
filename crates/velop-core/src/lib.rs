// velop-core: Reconciliation engine between velop-api and consumers.

pub mod config;
pub mod controller;
pub mod convert;
pub mod diff;
pub mod error;
pub mod events;
pub mod model;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{LoggingMode, MeshConfig};
pub use controller::MeshController;
pub use error::CoreError;
pub use reconcile::{
    IdentityStore, MeshSource, ReconcileContext, ReloadGuard, ReloadHandle, RunState, run_cycle,
};
pub use store::{MeshStore, Signal, SnapshotStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BackhaulInfo, ConnectedAdapter, DeviceRecord, FirmwareInfo, GuestNetwork, MeshSnapshot,
    NodeRecord, NodeType, WanInfo,
};

pub use diff::{FieldChange, KnownEntities, NodeUpdate, SnapshotDiff, UpdatedField};
pub use events::{
    LoggingStoppedPayload, MeshEvent, NewDevicePayload, NewNodePayload, PrimaryNodePayload,
};
