//! Identity service wire messages.
//!
//! Requests are `{id, service: "identity", method, payload}`; responses echo
//! the correlation `id` and carry either signatures or a JWT in `payload`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `service` field of every request.
pub const IDENTITY_SERVICE: &str = "identity";

/// Access level requested for API JWTs.
pub const JWT_ACCESS_LEVEL: u32 = 4;

/// Methods understood by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityMethod {
    /// Sign one or more 32-byte hashes with the user's key.
    #[serde(rename = "signETH")]
    SignEth,
    /// Issue a short-lived API JWT.
    #[serde(rename = "jwt")]
    Jwt,
}

/// Request payload: the caller's sealed credentials plus method arguments.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned_hashes: Option<Vec<String>>,
    pub access_level: u32,
    pub encrypted_seed_hex: String,
    pub access_level_hmac: String,
}

impl fmt::Debug for RequestPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPayload")
            .field("unsigned_hashes", &self.unsigned_hashes)
            .field("access_level", &self.access_level)
            .field("encrypted_seed_hex", &"<redacted>")
            .field("access_level_hmac", &"<redacted>")
            .finish()
    }
}

/// A request to the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub id: String,
    pub service: String,
    pub method: IdentityMethod,
    pub payload: RequestPayload,
}

impl IdentityRequest {
    /// Create a request for the identity service.
    pub fn new(id: impl Into<String>, method: IdentityMethod, payload: RequestPayload) -> Self {
        Self {
            id: id.into(),
            service: IDENTITY_SERVICE.to_string(),
            method,
            payload,
        }
    }
}

/// One signature as returned by `signETH`: hex `r` and `s`, numeric `v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature {
    pub r: String,
    pub s: String,
    pub v: u8,
}

/// Response payload. Absent fields mean the service declined.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<EthSignature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Debug for ResponsePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponsePayload")
            .field("signatures", &self.signatures)
            .field("jwt", &self.jwt.as_ref().map(|_| "<redacted>"))
            .field("error", &self.error)
            .finish()
    }
}

/// A response from the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub id: String,
    #[serde(default)]
    pub payload: ResponsePayload,
}
