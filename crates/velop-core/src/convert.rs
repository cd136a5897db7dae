// ── Wire-to-domain conversion ──
//
// Turns one `MeshDetails` batch from `velop-api` into a `MeshSnapshot`.
// The device list carries both infrastructure nodes and client devices
// in one shape; `nodeType` decides which side of the split an entry
// lands on. Sections the firmware failed to answer arrive as `None`
// and degrade to absent fields rather than failing the conversion.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use velop_api::MeshDetails;
use velop_api::models::{RawBackhaulEntry, RawDevice, RawWanStatus};

use crate::model::{
    BackhaulInfo, ConnectedAdapter, DeviceRecord, FirmwareInfo, GuestNetwork, MeshSnapshot,
    NodeRecord, NodeType, WanInfo,
};

/// Name given to devices the user has not named and the firmware has no
/// friendly name for.
const FALLBACK_NAME: &str = "Network Device";

/// Build a domain snapshot from one gathered batch of JNAP responses.
///
/// `connected_node` is the host the client is talking to, carried into
/// the snapshot verbatim.
pub fn snapshot_from_details(details: MeshDetails, connected_node: &str) -> MeshSnapshot {
    let backhaul_by_uuid: HashMap<&str, &RawBackhaulEntry> = details
        .backhaul
        .as_ref()
        .map_or_else(HashMap::new, |info| {
            info.backhaul_devices
                .iter()
                .map(|entry| (entry.device_uuid.as_str(), entry))
                .collect()
        });

    let pending_firmware: HashMap<&str, &str> = details
        .firmware_update
        .as_ref()
        .map_or_else(HashMap::new, |status| {
            status
                .firmware_update_status
                .iter()
                .filter_map(|node| {
                    let update = node.available_update.as_ref()?;
                    let version = update.firmware_version.as_deref()?;
                    Some((node.device_uuid.as_str(), version))
                })
                .collect()
        });

    // Display name by device id, for resolving a device's parent node.
    let name_by_id: HashMap<&str, String> = details
        .devices
        .devices
        .iter()
        .map(|raw| (raw.device_id.as_str(), display_name(raw)))
        .collect();

    // Node display name by its mesh-facing IP, for resolving a node's
    // uplink from the backhaul table's `parentIPAddress`.
    let node_name_by_ip: HashMap<&str, String> = details
        .devices
        .devices
        .iter()
        .filter(|raw| raw.node_type.is_some())
        .flat_map(|raw| {
            raw.connections
                .iter()
                .filter_map(|conn| conn.ip_address.as_deref())
                .map(|ip| (ip, display_name(raw)))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut nodes = Vec::new();
    let mut devices = Vec::new();

    for raw in &details.devices.devices {
        match raw.node_type.as_deref() {
            Some(node_type) => {
                let backhaul = backhaul_by_uuid.get(raw.device_id.as_str()).copied();
                nodes.push(Arc::new(node_record(
                    raw,
                    node_type,
                    backhaul,
                    &node_name_by_ip,
                    &pending_firmware,
                )));
            }
            None => devices.push(Arc::new(device_record(raw, &name_by_id))),
        }
    }

    let (guest_wifi_enabled, guest_networks) =
        details.guest_network.map_or((false, Vec::new()), |settings| {
            let networks = settings
                .radios
                .into_iter()
                .map(|radio| GuestNetwork {
                    ssid: radio.guest_ssid,
                    enabled: radio.is_enabled,
                })
                .collect();
            (settings.is_guest_network_enabled, networks)
        });

    let speedtest_running = details
        .health_check
        .as_ref()
        .and_then(|status| status.health_check_module_currently_running.as_deref())
        .is_some_and(|module| module == "SpeedTest");

    MeshSnapshot {
        nodes,
        devices,
        connected_node: connected_node.to_owned(),
        wan: details.wan.as_ref().map(wan_info),
        guest_wifi_enabled,
        guest_networks,
        parental_control_enabled: details
            .parental_control
            .as_ref()
            .is_some_and(|pc| pc.is_parental_control_enabled),
        speedtest_running,
        fetched_at: Utc::now(),
    }
}

fn node_record(
    raw: &RawDevice,
    node_type: &str,
    backhaul: Option<&RawBackhaulEntry>,
    node_name_by_ip: &HashMap<&str, String>,
    pending_firmware: &HashMap<&str, &str>,
) -> NodeRecord {
    let node_type = if node_type == "Master" {
        NodeType::Primary
    } else {
        NodeType::Secondary
    };

    // Secondaries uplink through the node at `parentIPAddress`; the
    // primary has no uplink and its backhaul table entry is absent.
    let parent_name = backhaul
        .and_then(|entry| entry.parent_ip_address.as_deref())
        .and_then(|ip| node_name_by_ip.get(ip).cloned());

    let version = raw.unit.firmware_version.clone();
    let latest_version = pending_firmware
        .get(raw.device_id.as_str())
        .map(|v| (*v).to_owned())
        .or_else(|| version.clone());

    NodeRecord {
        unique_id: raw.device_id.clone(),
        serial: raw
            .unit
            .serial_number
            .clone()
            .unwrap_or_else(|| raw.device_id.clone()),
        name: display_name(raw),
        node_type,
        manufacturer: raw.model.manufacturer.clone(),
        model: raw.model.model_number.clone(),
        hardware_version: raw.model.hardware_version.clone(),
        firmware: FirmwareInfo {
            version,
            latest_version,
        },
        connected_adapters: adapters(raw),
        backhaul: backhaul.map(backhaul_info),
        parent_name,
        status: !raw.connections.is_empty(),
    }
}

fn device_record(raw: &RawDevice, name_by_id: &HashMap<&str, String>) -> DeviceRecord {
    let parent_name = raw
        .connections
        .iter()
        .find_map(|conn| conn.parent_device_id.as_deref())
        .and_then(|id| name_by_id.get(id).cloned());

    DeviceRecord {
        unique_id: raw.device_id.clone(),
        name: display_name(raw),
        manufacturer: raw.model.manufacturer.clone(),
        model: raw.model.model_number.clone(),
        description: raw.model.description.clone(),
        operating_system: raw.unit.operating_system.clone(),
        serial: raw.unit.serial_number.clone(),
        connected_adapters: adapters(raw),
        parent_name,
        status: !raw.connections.is_empty(),
    }
}

/// User-assigned name wins over the firmware's friendly name.
fn display_name(raw: &RawDevice) -> String {
    raw.properties
        .iter()
        .find(|prop| prop.name == "userDeviceName")
        .map(|prop| prop.value.clone())
        .or_else(|| raw.friendly_name.clone())
        .unwrap_or_else(|| FALLBACK_NAME.to_owned())
}

/// Active connections first, then any known interface not currently
/// connected (MAC only) — a disconnected device keeps its adapters.
fn adapters(raw: &RawDevice) -> Vec<ConnectedAdapter> {
    let mut adapters: Vec<ConnectedAdapter> = raw
        .connections
        .iter()
        .map(|conn| ConnectedAdapter {
            mac: conn.mac_address.clone(),
            ip: conn.ip_address.clone(),
            ipv6: conn.ipv6_address.clone(),
        })
        .collect();

    for interface in &raw.known_interfaces {
        if !adapters.iter().any(|a| a.mac == interface.mac_address) {
            adapters.push(ConnectedAdapter {
                mac: interface.mac_address.clone(),
                ip: None,
                ipv6: None,
            });
        }
    }

    adapters
}

fn backhaul_info(entry: &RawBackhaulEntry) -> BackhaulInfo {
    BackhaulInfo {
        connection: entry
            .connection_type
            .clone()
            .unwrap_or_else(|| "Unknown".to_owned()),
        speed_mbps: entry
            .speed_mbps
            .as_deref()
            .and_then(|speed| speed.parse::<f64>().ok()),
        signal_strength: entry.wireless_connection_info.as_ref().and_then(|info| {
            // RSSI as the parent AP sees the satellite.
            info.ap_rssi.or(info.station_rssi)
        }),
    }
}

fn wan_info(raw: &RawWanStatus) -> WanInfo {
    let connection = raw.wan_connection.as_ref();
    WanInfo {
        connected: raw.wan_status.as_deref() == Some("Connected"),
        ip: connection.and_then(|conn| conn.ip_address.clone()),
        mac: raw.mac_address.clone(),
        dns: connection.map_or_else(Vec::new, |conn| {
            [&conn.dns_server1, &conn.dns_server2, &conn.dns_server3]
                .into_iter()
                .flatten()
                .cloned()
                .collect()
        }),
    }
}
