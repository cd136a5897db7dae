// JNAP protocol plumbing.
//
// Every JNAP call is an HTTP POST to `/JNAP/` with the action named in
// the `X-JNAP-Action` header and credentials in `X-JNAP-Authorization`.
// The body is the action's request object; the reply is a
// `{ "result": "...", "output": {...} }` envelope. Multiple actions can
// be batched through `core/Transaction`, which replies with one
// sub-envelope per requested action, in order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// JNAP result code for a successful call.
pub const RESULT_OK: &str = "OK";

/// JNAP result code for rejected credentials.
pub const RESULT_UNAUTHORIZED: &str = "_ErrorUnauthorized";

/// The JNAP actions this crate speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Batch several actions into one round trip.
    Transaction,
    /// Verify the admin password without side effects.
    CheckAdminPassword,
    /// Full device list — nodes and client devices alike.
    GetDevices,
    /// Per-node backhaul connection details.
    GetBackhaulInfo,
    /// WAN link state of the primary node.
    GetWanStatus,
    /// Guest Wi-Fi radio settings.
    GetGuestRadioSettings,
    /// Parental-control state.
    GetParentalControlSettings,
    /// Whether a speedtest (health check) is currently running.
    GetHealthCheckStatus,
    /// Firmware-update availability and progress per node.
    GetFirmwareUpdateStatus,
}

impl Action {
    /// The full action URI sent in the `X-JNAP-Action` header.
    pub fn uri(self) -> &'static str {
        match self {
            Self::Transaction => "http://linksys.com/jnap/core/Transaction",
            Self::CheckAdminPassword => "http://linksys.com/jnap/core/CheckAdminPassword",
            Self::GetDevices => "http://linksys.com/jnap/devicelist/GetDevices3",
            Self::GetBackhaulInfo => "http://linksys.com/jnap/nodes/diagnostics/GetBackhaulInfo",
            Self::GetWanStatus => "http://linksys.com/jnap/router/GetWANStatus3",
            Self::GetGuestRadioSettings => {
                "http://linksys.com/jnap/guestnetwork/GetGuestRadioSettings2"
            }
            Self::GetParentalControlSettings => {
                "http://linksys.com/jnap/parentalcontrol/GetParentalControlSettings"
            }
            Self::GetHealthCheckStatus => {
                "http://linksys.com/jnap/healthcheck/GetHealthCheckStatus"
            }
            Self::GetFirmwareUpdateStatus => {
                "http://linksys.com/jnap/nodes/firmwareupdate/GetFirmwareUpdateStatus"
            }
        }
    }
}

// ── Envelopes ───────────────────────────────────────────────────────

/// Single-action response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JnapResponse {
    pub result: String,
    #[serde(default)]
    pub output: Value,
}

impl JnapResponse {
    /// Unwrap the envelope into a typed output, or the appropriate error.
    pub fn into_output<T: DeserializeOwned>(self, action: Action) -> Result<T, Error> {
        if self.result != RESULT_OK {
            if self.result == RESULT_UNAUTHORIZED {
                return Err(Error::Authentication {
                    message: "admin password rejected".into(),
                });
            }
            return Err(Error::Jnap {
                action: action.uri().to_owned(),
                result: self.result,
            });
        }

        let body = self.output.to_string();
        serde_json::from_value(self.output).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// One entry in a `core/Transaction` request body.
#[derive(Debug, Serialize)]
pub struct TransactionRequest {
    pub action: &'static str,
    pub request: Value,
}

impl TransactionRequest {
    /// An action invoked with an empty request object.
    pub fn bare(action: Action) -> Self {
        Self {
            action: action.uri(),
            request: Value::Object(serde_json::Map::new()),
        }
    }
}

/// `core/Transaction` response envelope: the transaction itself has a
/// result code, then one sub-envelope per requested action.
#[derive(Debug, Deserialize)]
pub struct TransactionResponse {
    pub result: String,
    #[serde(default)]
    pub responses: Vec<JnapResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Out {
        is_parental_control_enabled: bool,
    }

    #[test]
    fn ok_envelope_unwraps_output() {
        let resp = JnapResponse {
            result: RESULT_OK.into(),
            output: serde_json::json!({ "isParentalControlEnabled": true }),
        };

        let out: Out = resp
            .into_output(Action::GetParentalControlSettings)
            .expect("output should decode");
        assert!(out.is_parental_control_enabled);
    }

    #[test]
    fn unauthorized_result_maps_to_auth_error() {
        let resp = JnapResponse {
            result: RESULT_UNAUTHORIZED.into(),
            output: Value::Null,
        };
        let err = resp
            .into_output::<Value>(Action::CheckAdminPassword)
            .expect_err("should fail");
        assert!(err.is_auth());
    }

    #[test]
    fn other_result_maps_to_jnap_error() {
        let resp = JnapResponse {
            result: "_ErrorUnknownAction".into(),
            output: Value::Null,
        };
        let err = resp
            .into_output::<Value>(Action::GetDevices)
            .expect_err("should fail");
        assert!(matches!(err, Error::Jnap { ref result, .. } if result == "_ErrorUnknownAction"));
    }
}
