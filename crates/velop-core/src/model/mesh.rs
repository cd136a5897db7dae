// ── Mesh snapshot ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{GuestNetwork, WanInfo};
use super::device::DeviceRecord;
use super::node::NodeRecord;

/// Immutable value representing mesh state at one point in time.
///
/// Created by the conversion layer on each fetch, owned exclusively by
/// the reconciliation cycle until published, then superseded (never
/// mutated) by the next snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub nodes: Vec<Arc<NodeRecord>>,
    pub devices: Vec<Arc<DeviceRecord>>,
    /// Address of the node this snapshot was fetched from.
    pub connected_node: String,
    pub wan: Option<WanInfo>,
    pub guest_wifi_enabled: bool,
    pub guest_networks: Vec<GuestNetwork>,
    pub parental_control_enabled: bool,
    /// A speedtest (health check) was in flight at fetch time.
    pub speedtest_running: bool,
    pub fetched_at: DateTime<Utc>,
}

impl MeshSnapshot {
    /// The node flagged as primary.
    ///
    /// The firmware guarantees at most one, but that guarantee has been
    /// observed to slip — when several nodes claim primary, the lowest
    /// serial (compared case-insensitively) wins so the answer is stable
    /// across polls.
    pub fn primary_node(&self) -> Option<&Arc<NodeRecord>> {
        self.nodes
            .iter()
            .filter(|n| n.is_primary())
            .min_by(|a, b| {
                a.serial
                    .to_ascii_lowercase()
                    .cmp(&b.serial.to_ascii_lowercase())
            })
    }

    /// Look up a node by serial, case-insensitively.
    pub fn node_by_serial(&self, serial: &str) -> Option<&Arc<NodeRecord>> {
        self.nodes.iter().find(|n| n.serial_matches(serial))
    }

    /// Look up a device by its exact unique id.
    pub fn device_by_id(&self, unique_id: &str) -> Option<&Arc<DeviceRecord>> {
        self.devices.iter().find(|d| d.unique_id == unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{FirmwareInfo, NodeType};

    fn node(serial: &str, node_type: NodeType) -> Arc<NodeRecord> {
        Arc::new(NodeRecord {
            unique_id: format!("id-{serial}"),
            serial: serial.to_owned(),
            name: serial.to_owned(),
            node_type,
            manufacturer: None,
            model: None,
            hardware_version: None,
            firmware: FirmwareInfo::default(),
            connected_adapters: Vec::new(),
            backhaul: None,
            parent_name: None,
            status: true,
        })
    }

    fn snapshot(nodes: Vec<Arc<NodeRecord>>) -> MeshSnapshot {
        MeshSnapshot {
            nodes,
            devices: Vec::new(),
            connected_node: "192.168.1.1".into(),
            wan: None,
            guest_wifi_enabled: false,
            guest_networks: Vec::new(),
            parental_control_enabled: false,
            speedtest_running: false,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn primary_tie_break_is_lowest_serial_case_insensitive() {
        // Two nodes claiming primary must not panic and must pick
        // deterministically: "abc" < "XYZ" once lowercased.
        let snap = snapshot(vec![
            node("XYZ999", NodeType::Primary),
            node("abc123", NodeType::Primary),
            node("mmm555", NodeType::Secondary),
        ]);

        let primary = snap.primary_node().expect("a primary should be found");
        assert_eq!(primary.serial, "abc123");
    }

    #[test]
    fn no_primary_yields_none() {
        let snap = snapshot(vec![node("abc123", NodeType::Secondary)]);
        assert!(snap.primary_node().is_none());
    }

    #[test]
    fn node_lookup_ignores_serial_case() {
        let snap = snapshot(vec![node("ABC123", NodeType::Primary)]);
        assert!(snap.node_by_serial("abc123").is_some());
        assert!(snap.node_by_serial("def456").is_none());
    }
}
