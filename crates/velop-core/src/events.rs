// ── Change notification events ──
//
// Diff results become discrete events with fixed, enumerated payload
// shapes. Payloads are built field by field through typed mapping
// functions — no reflection — and a string field the source entity
// can't provide resolves to the literal `"unknown"`, never an error.
// Delivery is fire-and-forget over a broadcast channel: nobody
// listening is not a failure.

use serde::Serialize;

use crate::model::{BackhaulInfo, ConnectedAdapter, DeviceRecord, NodeRecord};

/// Marker for payload fields the source entity couldn't provide.
pub const UNKNOWN: &str = "unknown";

/// Event name prefix, mirrored in consumer subscriptions.
const DOMAIN: &str = "velop";

/// A discrete mesh change notification.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum MeshEvent {
    NewDevice(NewDevicePayload),
    NewNode(NewNodePayload),
    PrimaryNodeChanged(PrimaryNodePayload),
    LoggingStopped(LoggingStoppedPayload),
}

impl MeshEvent {
    /// The wire name consumers subscribe by.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewDevice(_) => "velop_new_device_on_mesh",
            Self::NewNode(_) => "velop_new_node_on_mesh",
            Self::PrimaryNodeChanged(_) => "velop_new_primary_node",
            Self::LoggingStopped(_) => "velop_logging_stopped",
        }
    }

    /// The domain all event names share.
    pub fn domain() -> &'static str {
        DOMAIN
    }
}

// ── Payloads ────────────────────────────────────────────────────────

/// Payload for a device newly seen on the mesh.
#[derive(Debug, Clone, Serialize)]
pub struct NewDevicePayload {
    pub connected_adapters: Vec<ConnectedAdapter>,
    pub description: String,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub operating_system: String,
    pub parent_name: String,
    pub serial: String,
    pub status: bool,
    pub unique_id: String,
    /// The owning mesh.
    pub mesh_id: String,
}

impl NewDevicePayload {
    pub fn for_device(device: &DeviceRecord, mesh_id: &str) -> Self {
        Self {
            connected_adapters: device.connected_adapters.clone(),
            description: or_unknown(device.description.as_deref()),
            manufacturer: or_unknown(device.manufacturer.as_deref()),
            model: or_unknown(device.model.as_deref()),
            name: device.name.clone(),
            operating_system: or_unknown(device.operating_system.as_deref()),
            parent_name: or_unknown(device.parent_name.as_deref()),
            serial: or_unknown(device.serial.as_deref()),
            status: device.status,
            unique_id: device.unique_id.clone(),
            mesh_id: mesh_id.to_owned(),
        }
    }
}

/// Payload for a node newly seen on the mesh.
#[derive(Debug, Clone, Serialize)]
pub struct NewNodePayload {
    pub backhaul: Option<BackhaulInfo>,
    pub connected_adapters: Vec<ConnectedAdapter>,
    pub model: String,
    pub name: String,
    pub parent_name: String,
    pub serial: String,
    pub status: bool,
    pub unique_id: String,
    pub mesh_id: String,
}

impl NewNodePayload {
    pub fn for_node(node: &NodeRecord, mesh_id: &str) -> Self {
        Self {
            backhaul: node.backhaul.clone(),
            connected_adapters: node.connected_adapters.clone(),
            model: or_unknown(node.model.as_deref()),
            name: node.name.clone(),
            parent_name: or_unknown(node.parent_name.as_deref()),
            serial: node.serial.clone(),
            status: node.status,
            unique_id: node.unique_id.clone(),
            mesh_id: mesh_id.to_owned(),
        }
    }
}

/// Payload for a change of the mesh's primary node.
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryNodePayload {
    pub connected_adapters: Vec<ConnectedAdapter>,
    pub model: String,
    pub name: String,
    pub serial: String,
    pub unique_id: String,
    pub mesh_id: String,
}

impl PrimaryNodePayload {
    pub fn for_node(node: &NodeRecord, mesh_id: &str) -> Self {
        Self {
            connected_adapters: node.connected_adapters.clone(),
            model: or_unknown(node.model.as_deref()),
            name: node.name.clone(),
            serial: node.serial.clone(),
            unique_id: node.unique_id.clone(),
            mesh_id: mesh_id.to_owned(),
        }
    }
}

/// Payload fired when verbose logging reverts after a single poll.
#[derive(Debug, Clone, Serialize)]
pub struct LoggingStoppedPayload {
    pub name: String,
}

/// Explicit fallback branch for string fields the entity lacks.
fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectedAdapter, FirmwareInfo, NodeType};

    fn sparse_device() -> DeviceRecord {
        DeviceRecord {
            unique_id: "D1".into(),
            name: "Network Device".into(),
            manufacturer: None,
            model: None,
            description: None,
            operating_system: None,
            serial: None,
            connected_adapters: Vec::new(),
            parent_name: None,
            status: false,
        }
    }

    #[test]
    fn missing_device_fields_resolve_to_unknown() {
        let payload = NewDevicePayload::for_device(&sparse_device(), "mesh-1");
        assert_eq!(payload.manufacturer, UNKNOWN);
        assert_eq!(payload.operating_system, UNKNOWN);
        assert_eq!(payload.serial, UNKNOWN);
        assert_eq!(payload.parent_name, UNKNOWN);
        assert_eq!(payload.unique_id, "D1");
        assert_eq!(payload.mesh_id, "mesh-1");
    }

    #[test]
    fn populated_device_fields_pass_through() {
        let mut device = sparse_device();
        device.manufacturer = Some("Apple".into());
        device.operating_system = Some("iOS".into());

        let payload = NewDevicePayload::for_device(&device, "mesh-1");
        assert_eq!(payload.manufacturer, "Apple");
        assert_eq!(payload.operating_system, "iOS");
    }

    #[test]
    fn node_payload_keeps_fixed_field_set() {
        let node = NodeRecord {
            unique_id: "id-N2".into(),
            serial: "N2".into(),
            name: "Bedroom".into(),
            node_type: NodeType::Secondary,
            manufacturer: Some("Linksys".into()),
            model: Some("WHW03".into()),
            hardware_version: Some("1".into()),
            firmware: FirmwareInfo::default(),
            connected_adapters: vec![ConnectedAdapter {
                mac: "AA:BB:CC:00:11:22".into(),
                ip: Some("192.168.1.2".into()),
                ipv6: None,
            }],
            backhaul: None,
            parent_name: Some("Gateway".into()),
            status: true,
        };

        let event = MeshEvent::NewNode(NewNodePayload::for_node(&node, "mesh-1"));
        assert_eq!(event.name(), "velop_new_node_on_mesh");

        let json = serde_json::to_value(&event).expect("event should serialize");
        let data = &json["data"];
        // Exactly the documented field set, nothing more.
        let keys: Vec<&str> = data
            .as_object()
            .expect("payload is an object")
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = vec![
            "backhaul",
            "connected_adapters",
            "mesh_id",
            "model",
            "name",
            "parent_name",
            "serial",
            "status",
            "unique_id",
        ];
        expected.sort_unstable();
        let mut got = keys;
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn event_names_are_stable() {
        let payload = LoggingStoppedPayload {
            name: "Linksys Velop Mesh".into(),
        };
        assert_eq!(
            MeshEvent::LoggingStopped(payload).name(),
            "velop_logging_stopped"
        );
    }
}
