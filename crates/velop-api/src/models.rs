// Raw wire models for JNAP action outputs.
//
// These mirror the JSON the firmware actually emits, quirks included —
// `deviceID`, `deviceUUID`, `apRSSI`, and friends don't follow one casing
// convention, so the odd keys are renamed explicitly. `velop-core`
// converts these into the clean domain model; nothing downstream of the
// client should touch a `Raw*` type.

use serde::Deserialize;
use serde_json::Value;

// ── devicelist/GetDevices3 ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceList {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
    #[serde(default)]
    pub revision: u64,
}

/// One entry in the mesh device list. Nodes and client devices share
/// this shape; a node is a device with `nodeType` set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevice {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(default)]
    pub last_change_revision: u64,
    #[serde(default)]
    pub model: RawDeviceModel,
    #[serde(default)]
    pub unit: RawDeviceUnit,
    #[serde(default)]
    pub is_authority: bool,
    /// `"Master"` for the primary node, `"Slave"` for secondaries,
    /// absent for client devices.
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub known_interfaces: Vec<RawKnownInterface>,
    /// Present only while the device is connected.
    #[serde(default)]
    pub connections: Vec<RawConnection>,
    /// User-assigned metadata (`userDeviceName`, `userDeviceType`, ...).
    #[serde(default)]
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceModel {
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub hardware_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceUnit {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub firmware_date: Option<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKnownInterface {
    pub mac_address: String,
    #[serde(default)]
    pub interface_type: Option<String>,
    #[serde(default)]
    pub band: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConnection {
    pub mac_address: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub ipv6_address: Option<String>,
    #[serde(default, rename = "parentDeviceID")]
    pub parent_device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProperty {
    pub name: String,
    pub value: String,
}

// ── nodes/diagnostics/GetBackhaulInfo ───────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBackhaulInfo {
    #[serde(default)]
    pub backhaul_devices: Vec<RawBackhaulEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBackhaulEntry {
    #[serde(rename = "deviceUUID")]
    pub device_uuid: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, rename = "parentIPAddress")]
    pub parent_ip_address: Option<String>,
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub wireless_connection_info: Option<RawWirelessBackhaul>,
    /// The firmware reports this as a string, e.g. `"866.7"`.
    #[serde(default)]
    pub speed_mbps: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWirelessBackhaul {
    #[serde(default, rename = "radioID")]
    pub radio_id: Option<String>,
    #[serde(default)]
    pub channel: Option<u32>,
    #[serde(default, rename = "apRSSI")]
    pub ap_rssi: Option<i32>,
    #[serde(default, rename = "stationRSSI")]
    pub station_rssi: Option<i32>,
    #[serde(default, rename = "apBSSID")]
    pub ap_bssid: Option<String>,
    #[serde(default, rename = "stationBSSID")]
    pub station_bssid: Option<String>,
}

// ── router/GetWANStatus3 ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWanStatus {
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub detected_wan_type: Option<String>,
    #[serde(default)]
    pub wan_status: Option<String>,
    #[serde(default)]
    pub wan_connection: Option<RawWanConnection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWanConnection {
    #[serde(default)]
    pub wan_type: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub dns_server1: Option<String>,
    #[serde(default)]
    pub dns_server2: Option<String>,
    #[serde(default)]
    pub dns_server3: Option<String>,
    #[serde(default)]
    pub mtu: u32,
}

// ── guestnetwork/GetGuestRadioSettings2 ─────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGuestRadioSettings {
    #[serde(default)]
    pub is_guest_network_enabled: bool,
    #[serde(default)]
    pub radios: Vec<RawGuestRadio>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGuestRadio {
    #[serde(default, rename = "radioID")]
    pub radio_id: Option<String>,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default, rename = "guestSSID")]
    pub guest_ssid: Option<String>,
}

// ── parentalcontrol/GetParentalControlSettings ──────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParentalControl {
    #[serde(default)]
    pub is_parental_control_enabled: bool,
}

// ── healthcheck/GetHealthCheckStatus ────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHealthCheckStatus {
    /// `"SpeedTest"` while a speedtest is in flight, absent otherwise.
    #[serde(default)]
    pub health_check_module_currently_running: Option<String>,
}

// ── nodes/firmwareupdate/GetFirmwareUpdateStatus ────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFirmwareUpdateStatus {
    #[serde(default)]
    pub firmware_update_status: Vec<RawNodeFirmwareStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNodeFirmwareStatus {
    #[serde(rename = "deviceUUID")]
    pub device_uuid: String,
    #[serde(default)]
    pub last_successful_check_time: Option<String>,
    #[serde(default)]
    pub available_update: Option<RawAvailableUpdate>,
    #[serde(default)]
    pub pending_operation: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvailableUpdate {
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub firmware_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_list_decodes_firmware_casing() {
        let body = serde_json::json!({
            "devices": [{
                "deviceID": "dev-uuid-1",
                "lastChangeRevision": 42,
                "model": { "deviceType": "Infrastructure", "manufacturer": "Linksys",
                           "modelNumber": "WHW03", "hardwareVersion": "1" },
                "unit": { "serialNumber": "SER123", "firmwareVersion": "2.1.17" },
                "isAuthority": true,
                "nodeType": "Master",
                "friendlyName": "Living Room",
                "knownInterfaces": [
                    { "macAddress": "AA:BB:CC:00:11:22", "interfaceType": "Wired" }
                ],
                "connections": [
                    { "macAddress": "AA:BB:CC:00:11:22", "ipAddress": "192.168.1.1" }
                ],
                "properties": [
                    { "name": "userDeviceName", "value": "Gateway" }
                ]
            }],
            "revision": 7
        });

        let list: RawDeviceList = serde_json::from_value(body).expect("should decode");
        assert_eq!(list.revision, 7);
        assert_eq!(list.devices.len(), 1);

        let dev = &list.devices[0];
        assert_eq!(dev.device_id, "dev-uuid-1");
        assert_eq!(dev.node_type.as_deref(), Some("Master"));
        assert_eq!(dev.unit.serial_number.as_deref(), Some("SER123"));
        assert_eq!(dev.connections[0].ip_address.as_deref(), Some("192.168.1.1"));
        assert_eq!(dev.properties[0].value, "Gateway");
    }

    #[test]
    fn sparse_device_decodes_with_defaults() {
        let body = serde_json::json!({
            "devices": [{ "deviceID": "dev-2" }]
        });

        let list: RawDeviceList = serde_json::from_value(body).expect("should decode");
        let dev = &list.devices[0];
        assert!(dev.node_type.is_none());
        assert!(dev.connections.is_empty());
        assert!(dev.unit.serial_number.is_none());
    }

    #[test]
    fn backhaul_decodes_rssi_keys() {
        let body = serde_json::json!({
            "backhaulDevices": [{
                "deviceUUID": "dev-2",
                "ipAddress": "192.168.1.2",
                "parentIPAddress": "192.168.1.1",
                "connectionType": "Wireless",
                "wirelessConnectionInfo": {
                    "radioID": "RADIO_5GHz",
                    "channel": 36,
                    "apRSSI": -50,
                    "stationRSSI": -52,
                    "apBSSID": "AA:BB:CC:00:11:33",
                    "stationBSSID": "AA:BB:CC:00:11:44"
                },
                "speedMbps": "866.7"
            }]
        });

        let info: RawBackhaulInfo = serde_json::from_value(body).expect("should decode");
        let entry = &info.backhaul_devices[0];
        assert_eq!(entry.device_uuid, "dev-2");
        let wireless = entry.wireless_connection_info.as_ref().expect("wireless info");
        assert_eq!(wireless.ap_rssi, Some(-50));
        assert_eq!(wireless.radio_id.as_deref(), Some("RADIO_5GHz"));
    }
}
