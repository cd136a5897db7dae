// JNAP HTTP client
//
// Wraps `reqwest::Client` with the JNAP calling convention: every call
// is a POST to `{node}/JNAP/` with the action in `X-JNAP-Action` and
// HTTP basic credentials (username fixed to `admin`) in
// `X-JNAP-Authorization`. The full mesh state is gathered in a single
// `core/Transaction` round trip.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::jnap::{
    Action, JnapResponse, RESULT_OK, RESULT_UNAUTHORIZED, TransactionRequest, TransactionResponse,
};
use crate::models::{
    RawBackhaulInfo, RawDeviceList, RawFirmwareUpdateStatus, RawGuestRadioSettings,
    RawHealthCheckStatus, RawParentalControl, RawWanStatus,
};
use crate::transport::TransportConfig;

const HEADER_ACTION: &str = "X-JNAP-Action";
const HEADER_AUTH: &str = "X-JNAP-Authorization";

/// The raw payload bundle from one full mesh poll.
///
/// `devices` is the only mandatory payload — a node that can't answer
/// the device list can't be reconciled at all. Everything else degrades
/// to `None` when the firmware doesn't support the action.
#[derive(Debug, Clone)]
pub struct MeshDetails {
    pub devices: RawDeviceList,
    pub backhaul: Option<RawBackhaulInfo>,
    pub wan: Option<RawWanStatus>,
    pub guest_network: Option<RawGuestRadioSettings>,
    pub parental_control: Option<RawParentalControl>,
    pub health_check: Option<RawHealthCheckStatus>,
    pub firmware_update: Option<RawFirmwareUpdateStatus>,
}

/// Raw HTTP client for a Velop node's JNAP endpoint.
pub struct JnapClient {
    http: reqwest::Client,
    endpoint: Url,
    auth_header: String,
    timeout_secs: u64,
}

impl JnapClient {
    /// Create a client for the node at `host` (IP or hostname, no scheme).
    pub fn new(
        host: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("http://{host}/JNAP/"))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint,
            auth_header: basic_auth(password),
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and endpoint.
    ///
    /// Used by tests to point at a mock server.
    pub fn with_client(http: reqwest::Client, endpoint: Url, password: &SecretString) -> Self {
        Self {
            http,
            endpoint,
            auth_header: basic_auth(password),
            timeout_secs: 10,
        }
    }

    /// The JNAP endpoint this client posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Single-action calls ──────────────────────────────────────────

    /// Send a single JNAP action and return the raw envelope.
    pub(crate) async fn call(&self, action: Action, request: &Value) -> Result<JnapResponse, Error> {
        debug!(action = action.uri(), "POST {}", self.endpoint);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(HEADER_ACTION, action.uri())
            .header(HEADER_AUTH, &self.auth_header)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Verify the admin password without touching any state.
    ///
    /// A rejected password comes back as a `_ErrorUnauthorized` result,
    /// which maps to [`Error::Authentication`].
    pub async fn check_password(&self) -> Result<(), Error> {
        let resp = self
            .call(Action::CheckAdminPassword, &Value::Object(serde_json::Map::new()))
            .await?;
        resp.into_output::<Value>(Action::CheckAdminPassword)?;
        Ok(())
    }

    // ── Bulk gather ──────────────────────────────────────────────────

    /// Gather the full mesh state in one `core/Transaction` round trip.
    pub async fn gather_details(&self) -> Result<MeshDetails, Error> {
        const ACTIONS: [Action; 7] = [
            Action::GetDevices,
            Action::GetBackhaulInfo,
            Action::GetWanStatus,
            Action::GetGuestRadioSettings,
            Action::GetParentalControlSettings,
            Action::GetHealthCheckStatus,
            Action::GetFirmwareUpdateStatus,
        ];

        let batch: Vec<TransactionRequest> =
            ACTIONS.iter().map(|a| TransactionRequest::bare(*a)).collect();

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(HEADER_ACTION, Action::Transaction.uri())
            .header(HEADER_AUTH, &self.auth_header)
            .json(&batch)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let body = resp.text().await.map_err(Error::Transport)?;
        let txn: TransactionResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        if txn.result != RESULT_OK {
            if txn.result == RESULT_UNAUTHORIZED {
                return Err(Error::Authentication {
                    message: "admin password rejected".into(),
                });
            }
            return Err(Error::Jnap {
                action: Action::Transaction.uri().to_owned(),
                result: txn.result,
            });
        }

        if txn.responses.len() != ACTIONS.len() {
            return Err(Error::TransactionMismatch {
                expected: ACTIONS.len(),
                got: txn.responses.len(),
            });
        }

        // Length was checked above, so the zip pairs every action with
        // its sub-response in request order.
        let mut responses = txn.responses.into_iter().zip(ACTIONS);

        let mut take = |expected: Action| -> Result<JnapResponse, Error> {
            match responses.next() {
                Some((resp, action)) if action == expected => Ok(resp),
                _ => Err(Error::TransactionMismatch {
                    expected: ACTIONS.len(),
                    got: 0,
                }),
            }
        };

        let devices: RawDeviceList =
            take(Action::GetDevices)?.into_output(Action::GetDevices)?;
        let backhaul = optional(take(Action::GetBackhaulInfo)?, Action::GetBackhaulInfo)?;
        let wan = optional(take(Action::GetWanStatus)?, Action::GetWanStatus)?;
        let guest_network = optional(
            take(Action::GetGuestRadioSettings)?,
            Action::GetGuestRadioSettings,
        )?;
        let parental_control = optional(
            take(Action::GetParentalControlSettings)?,
            Action::GetParentalControlSettings,
        )?;
        let health_check = optional(
            take(Action::GetHealthCheckStatus)?,
            Action::GetHealthCheckStatus,
        )?;
        let firmware_update = optional(
            take(Action::GetFirmwareUpdateStatus)?,
            Action::GetFirmwareUpdateStatus,
        )?;

        Ok(MeshDetails {
            devices,
            backhaul,
            wan,
            guest_network,
            parental_control,
            health_check,
            firmware_update,
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Decode an optional transaction sub-payload.
///
/// Firmware that doesn't support an action answers the sub-request with
/// an error result; those degrade to `None`. Auth failures still
/// propagate — a rejected password is never "optional".
fn optional<T: serde::de::DeserializeOwned>(
    resp: JnapResponse,
    action: Action,
) -> Result<Option<T>, Error> {
    if resp.result == RESULT_UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "admin password rejected".into(),
        });
    }
    if resp.result != RESULT_OK {
        debug!(
            action = action.uri(),
            result = %resp.result,
            "optional payload unavailable"
        );
        return Ok(None);
    }
    resp.into_output(action).map(Some)
}

fn basic_auth(password: &SecretString) -> String {
    let token = BASE64.encode(format!("admin:{}", password.expose_secret()));
    format!("Basic {token}")
}
