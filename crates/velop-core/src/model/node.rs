// ── Node domain types ──

use serde::{Deserialize, Serialize};

use super::common::{BackhaulInfo, ConnectedAdapter};

/// The role a node plays in the mesh.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The gateway/root node.
    Primary,
    /// A satellite node.
    Secondary,
}

/// Firmware state of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    pub version: Option<String>,
    /// Version offered by the update service, when one is pending.
    pub latest_version: Option<String>,
}

/// A physical router/satellite unit participating in the mesh.
///
/// Identity key is [`serial`](Self::serial); serials are stable and
/// never reused, but firmware casing is not — matching must be
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The mesh-assigned device UUID.
    pub unique_id: String,
    /// Hardware serial number — the stable identity of the node.
    pub serial: String,
    pub name: String,
    pub node_type: NodeType,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub hardware_version: Option<String>,
    pub firmware: FirmwareInfo,
    pub connected_adapters: Vec<ConnectedAdapter>,
    pub backhaul: Option<BackhaulInfo>,
    /// Display name of the node this one uplinks through.
    pub parent_name: Option<String>,
    /// `true` while the node is reachable on the mesh.
    pub status: bool,
}

impl NodeRecord {
    pub fn is_primary(&self) -> bool {
        self.node_type == NodeType::Primary
    }

    /// Case-insensitive serial comparison.
    pub fn serial_matches(&self, other: &str) -> bool {
        self.serial.eq_ignore_ascii_case(other)
    }
}
