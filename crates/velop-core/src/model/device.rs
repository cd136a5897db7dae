// ── Client device domain type ──

use serde::{Deserialize, Serialize};

use super::common::ConnectedAdapter;

/// An end-user client device connected to the mesh (phone, laptop, ...).
///
/// Identity key is [`unique_id`](Self::unique_id), the mesh-assigned
/// device UUID. Matched exactly, unlike node serials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub unique_id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub operating_system: Option<String>,
    pub serial: Option<String>,
    pub connected_adapters: Vec<ConnectedAdapter>,
    /// Display name of the node the device is connected through.
    pub parent_name: Option<String>,
    /// `true` while the device has at least one active connection.
    pub status: bool,
}
