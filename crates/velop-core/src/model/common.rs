// ── Common types shared across the domain model ──

use serde::{Deserialize, Serialize};

/// One network adapter a node or device is currently connected through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAdapter {
    pub mac: String,
    pub ip: Option<String>,
    pub ipv6: Option<String>,
}

/// Backhaul link details for a secondary node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackhaulInfo {
    /// `"Wired"` or `"Wireless"`.
    pub connection: String,
    pub speed_mbps: Option<f64>,
    /// RSSI as seen by the parent AP, wireless backhauls only.
    pub signal_strength: Option<i32>,
}

/// WAN link state of the primary node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanInfo {
    pub connected: bool,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub dns: Vec<String>,
}

/// A guest Wi-Fi network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestNetwork {
    pub ssid: Option<String>,
    pub enabled: bool,
}
