// ── Unified domain model ──
//
// Clean representations of mesh state, converted from the raw JNAP wire
// models. Consumers only ever see these types; a snapshot is immutable
// once published and superseded (never mutated) by the next poll.

pub mod common;
pub mod device;
pub mod mesh;
pub mod node;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::{BackhaulInfo, ConnectedAdapter, GuestNetwork, WanInfo};
pub use device::DeviceRecord;
pub use mesh::MeshSnapshot;
pub use node::{FirmwareInfo, NodeRecord, NodeType};
