// ── Snapshot differ ──
//
// Pure set arithmetic between the previously published mesh state and a
// freshly fetched snapshot. Only additions and field updates are
// tracked — removals are the device registry's problem, not ours.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::model::{DeviceRecord, MeshSnapshot, NodeRecord};

/// Identifier sets from the last published snapshot.
///
/// Node serials are keyed lowercased because firmware casing drifts
/// between polls; device unique ids are mesh-assigned UUIDs and match
/// exactly. Node display names ride along so rename detection doesn't
/// need the full previous snapshot.
#[derive(Debug, Clone, Default)]
pub struct KnownEntities {
    pub device_ids: HashSet<String>,
    /// Lowercased node serial -> display name at publish time.
    pub node_names: HashMap<String, String>,
}

impl KnownEntities {
    /// Capture the identifier sets of a snapshot.
    pub fn of(snapshot: &MeshSnapshot) -> Self {
        Self {
            device_ids: snapshot
                .devices
                .iter()
                .map(|d| d.unique_id.clone())
                .collect(),
            node_names: snapshot
                .nodes
                .iter()
                .map(|n| (n.serial.to_ascii_lowercase(), n.name.clone()))
                .collect(),
        }
    }
}

/// The fixed field list compared for updated nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum UpdatedField {
    Name,
}

/// A single old/new value pair for one compared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: UpdatedField,
    pub old: String,
    pub new: String,
}

/// A node present in both snapshots whose compared fields differ.
#[derive(Debug, Clone)]
pub struct NodeUpdate {
    pub node: Arc<NodeRecord>,
    pub changes: Vec<FieldChange>,
}

/// The four independent outputs of one diff pass.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiff {
    pub new_devices: Vec<Arc<DeviceRecord>>,
    pub new_nodes: Vec<Arc<NodeRecord>>,
    pub updated_nodes: Vec<NodeUpdate>,
    /// The current primary node, when its serial differs from the
    /// mesh's recorded identity.
    pub primary_changed: Option<Arc<NodeRecord>>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.new_devices.is_empty()
            && self.new_nodes.is_empty()
            && self.updated_nodes.is_empty()
            && self.primary_changed.is_none()
    }
}

/// Diff `current` against the identifier sets of the prior cycle.
///
/// With no previous state (`None`, or empty identifier sets — the first
/// run), new-device and new-node detection is skipped entirely so an
/// integration install doesn't trigger an event storm. The four outputs
/// are computed independently; sparse data in one never blocks another.
///
/// `recorded_primary` is the mesh's durable identity (the serial of the
/// primary node as last persisted). `None` counts as a change so the
/// identity gets seeded once the host is running.
pub fn diff_snapshots(
    previous: Option<&KnownEntities>,
    current: &MeshSnapshot,
    recorded_primary: Option<&str>,
) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();

    // ── New devices ──────────────────────────────────────────────────
    match previous {
        Some(prev) if !prev.device_ids.is_empty() => {
            diff.new_devices = current
                .devices
                .iter()
                .filter(|d| !prev.device_ids.contains(&d.unique_id))
                .cloned()
                .collect();
        }
        _ => {} // first run: no comparison
    }

    // ── New nodes ────────────────────────────────────────────────────
    match previous {
        Some(prev) if !prev.node_names.is_empty() => {
            diff.new_nodes = current
                .nodes
                .iter()
                .filter(|n| !prev.node_names.contains_key(&n.serial.to_ascii_lowercase()))
                .cloned()
                .collect();
        }
        _ => {}
    }

    // ── Updated nodes ────────────────────────────────────────────────
    if let Some(prev) = previous {
        for node in &current.nodes {
            let Some(old_name) = prev.node_names.get(&node.serial.to_ascii_lowercase()) else {
                continue;
            };
            // Values compare case-sensitively.
            if *old_name != node.name {
                diff.updated_nodes.push(NodeUpdate {
                    node: node.clone(),
                    changes: vec![FieldChange {
                        field: UpdatedField::Name,
                        old: old_name.clone(),
                        new: node.name.clone(),
                    }],
                });
            }
        }
    }

    // ── Primary node change ──────────────────────────────────────────
    if let Some(primary) = current.primary_node() {
        let changed = match recorded_primary {
            Some(recorded) => !primary.serial_matches(recorded),
            None => true,
        };
        if changed {
            diff.primary_changed = Some(primary.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FirmwareInfo, NodeType, common::ConnectedAdapter};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn node(serial: &str, name: &str, node_type: NodeType) -> Arc<NodeRecord> {
        Arc::new(NodeRecord {
            unique_id: format!("id-{serial}"),
            serial: serial.to_owned(),
            name: name.to_owned(),
            node_type,
            manufacturer: Some("Linksys".into()),
            model: Some("WHW03".into()),
            hardware_version: None,
            firmware: FirmwareInfo::default(),
            connected_adapters: vec![ConnectedAdapter {
                mac: "AA:BB:CC:00:11:22".into(),
                ip: Some("192.168.1.1".into()),
                ipv6: None,
            }],
            backhaul: None,
            parent_name: None,
            status: true,
        })
    }

    fn device(unique_id: &str, name: &str) -> Arc<DeviceRecord> {
        Arc::new(DeviceRecord {
            unique_id: unique_id.to_owned(),
            name: name.to_owned(),
            manufacturer: None,
            model: None,
            description: None,
            operating_system: None,
            serial: None,
            connected_adapters: Vec::new(),
            parent_name: None,
            status: true,
        })
    }

    fn snapshot(nodes: Vec<Arc<NodeRecord>>, devices: Vec<Arc<DeviceRecord>>) -> MeshSnapshot {
        MeshSnapshot {
            nodes,
            devices,
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
    fn disjoint_device_sets_report_every_device_as_new() {
        let s1 = snapshot(
            vec![node("N1", "Gateway", NodeType::Primary)],
            vec![device("D1", "phone"), device("D2", "laptop")],
        );
        let s2 = snapshot(
            vec![node("N1", "Gateway", NodeType::Primary)],
            vec![device("D3", "tablet"), device("D4", "tv")],
        );

        let prev = KnownEntities::of(&s1);
        let diff = diff_snapshots(Some(&prev), &s2, Some("N1"));

        let mut new_ids: Vec<&str> =
            diff.new_devices.iter().map(|d| d.unique_id.as_str()).collect();
        new_ids.sort_unstable();
        assert_eq!(new_ids, vec!["D3", "D4"]);
    }

    #[test]
    fn first_run_suppresses_new_devices_and_nodes() {
        let current = snapshot(
            vec![node("N1", "Gateway", NodeType::Primary)],
            vec![device("D1", "phone")],
        );

        // No previous state at all.
        let diff = diff_snapshots(None, &current, Some("N1"));
        assert!(diff.new_devices.is_empty());
        assert!(diff.new_nodes.is_empty());

        // Empty identifier sets behave the same.
        let empty = KnownEntities::default();
        let diff = diff_snapshots(Some(&empty), &current, Some("N1"));
        assert!(diff.new_devices.is_empty());
        assert!(diff.new_nodes.is_empty());
    }

    #[test]
    fn node_serial_matching_is_case_insensitive() {
        let s1 = snapshot(
            vec![node("ABC123", "Node-Old", NodeType::Primary)],
            vec![device("D1", "phone")],
        );
        let s2 = snapshot(
            vec![node("abc123", "Node-New", NodeType::Primary)],
            vec![device("D1", "phone")],
        );

        let prev = KnownEntities::of(&s1);
        let diff = diff_snapshots(Some(&prev), &s2, Some("ABC123"));

        // Same node, so not "new"; one rename record.
        assert!(diff.new_nodes.is_empty());
        assert_eq!(diff.updated_nodes.len(), 1);

        let update = &diff.updated_nodes[0];
        assert_eq!(update.changes.len(), 1);
        assert_eq!(update.changes[0].field, UpdatedField::Name);
        assert_eq!(update.changes[0].old, "Node-Old");
        assert_eq!(update.changes[0].new, "Node-New");

        // Case-insensitive identity also covers the primary comparison.
        assert!(diff.primary_changed.is_none());
    }

    #[test]
    fn unchanged_name_produces_no_update() {
        let s1 = snapshot(vec![node("N1", "Gateway", NodeType::Primary)], Vec::new());
        let s2 = snapshot(vec![node("N1", "Gateway", NodeType::Primary)], Vec::new());

        let prev = KnownEntities::of(&s1);
        let diff = diff_snapshots(Some(&prev), &s2, Some("N1"));
        assert!(diff.updated_nodes.is_empty());
    }

    #[test]
    fn new_node_is_reported() {
        let s1 = snapshot(vec![node("N1", "Gateway", NodeType::Primary)], Vec::new());
        let s2 = snapshot(
            vec![
                node("N1", "Gateway", NodeType::Primary),
                node("N2", "Bedroom", NodeType::Secondary),
            ],
            Vec::new(),
        );

        let prev = KnownEntities::of(&s1);
        let diff = diff_snapshots(Some(&prev), &s2, Some("N1"));

        assert_eq!(diff.new_nodes.len(), 1);
        assert_eq!(diff.new_nodes[0].serial, "N2");
    }

    #[test]
    fn two_primaries_pick_one_deterministically() {
        let current = snapshot(
            vec![
                node("ZZZ", "A", NodeType::Primary),
                node("AAA", "B", NodeType::Primary),
            ],
            Vec::new(),
        );

        let diff = diff_snapshots(None, &current, Some("ZZZ"));
        let primary = diff.primary_changed.expect("should report a change");
        assert_eq!(primary.serial, "AAA");
    }

    #[test]
    fn missing_primary_is_not_an_error() {
        let current = snapshot(vec![node("N2", "Bedroom", NodeType::Secondary)], Vec::new());
        let diff = diff_snapshots(None, &current, Some("N1"));
        assert!(diff.primary_changed.is_none());
    }

    #[test]
    fn unrecorded_identity_counts_as_primary_change() {
        let current = snapshot(vec![node("N1", "Gateway", NodeType::Primary)], Vec::new());
        let diff = diff_snapshots(None, &current, None);
        assert_eq!(
            diff.primary_changed.expect("should report").serial,
            "N1"
        );
    }

    #[test]
    fn identical_snapshots_diff_to_empty() {
        let s = snapshot(
            vec![node("N1", "Gateway", NodeType::Primary)],
            vec![device("D1", "phone")],
        );
        let prev = KnownEntities::of(&s);
        let diff = diff_snapshots(Some(&prev), &s, Some("N1"));
        assert!(diff.is_empty());
    }
}
