// ── Runtime mesh configuration ──
//
// Describes *how* to reach and poll one mesh. Carries credential data
// and polling cadence, but never touches disk — the embedder constructs
// a `MeshConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

/// Diagnostic logging behaviour across polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoggingMode {
    #[default]
    Off,
    /// Verbose diagnostics for the first poll only: the controller logs
    /// a one-shot summary of the gathered state at `info` level, then
    /// reverts and fires the logging-stopped event. Finer-grained
    /// verbosity is the embedder's `tracing` subscriber's concern — the
    /// mode never touches the global filter.
    SinglePoll,
}

/// Configuration for one mesh instance.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Address of any node in the mesh (IP or hostname, no scheme).
    pub host: String,
    /// Admin password (the username is always `admin`).
    pub password: SecretString,
    /// Per-request deadline against the JNAP endpoint.
    pub request_timeout: Duration,
    /// How often to run a reconciliation cycle (seconds). 0 = never.
    pub scan_interval_secs: u64,
    /// Whether the device-tracker signal timer runs at all.
    pub device_trackers: bool,
    /// Device-tracker signal cadence (seconds).
    pub tracker_interval_secs: u64,
    /// The mesh's recorded primary-node serial, if one has been
    /// persisted before. `None` until the identity store is first
    /// written.
    pub primary_serial: Option<String>,
    /// Display name, used in the logging-stopped event payload.
    pub name: String,
    pub logging_mode: LoggingMode,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.1".into(),
            password: SecretString::from(String::new()),
            request_timeout: Duration::from_secs(10),
            scan_interval_secs: 60,
            device_trackers: false,
            tracker_interval_secs: 10,
            primary_serial: None,
            name: "Linksys Velop Mesh".into(),
            logging_mode: LoggingMode::Off,
        }
    }
}

impl MeshConfig {
    /// Stable identifier for this mesh instance, used to key the shared
    /// reload guard. Falls back to the host while no primary serial has
    /// been recorded yet.
    pub fn mesh_id(&self) -> String {
        self.primary_serial
            .clone()
            .unwrap_or_else(|| self.host.clone())
    }
}
