//! Request/response client for the identity service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bundledao_core::signature::{self, SignatureParts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::IdentityChannel;
use crate::error::{IdentityError, Result};
use crate::messages::{
    IdentityMethod, IdentityRequest, IdentityResponse, RequestPayload, JWT_ACCESS_LEVEL,
};
use crate::router::ResponseRouter;

/// Default time to wait for the identity service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where requests are addressed unless configured otherwise.
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.deso.org";

/// The sealed credentials the identity service hands out at login.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCredentials {
    /// The user's DeSo public key string.
    pub public_key: String,
    pub encrypted_seed_hex: String,
    pub access_level: u32,
    pub access_level_hmac: String,
}

impl IdentityCredentials {
    /// Names of the fields that are empty or zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.public_key.is_empty() {
            missing.push("publicKey");
        }
        if self.encrypted_seed_hex.is_empty() {
            missing.push("encryptedSeedHex");
        }
        if self.access_level == 0 {
            missing.push("accessLevel");
        }
        if self.access_level_hmac.is_empty() {
            missing.push("accessLevelHmac");
        }
        missing
    }

    fn payload(&self, access_level: u32, unsigned_hashes: Option<Vec<String>>) -> RequestPayload {
        RequestPayload {
            unsigned_hashes,
            access_level,
            encrypted_seed_hex: self.encrypted_seed_hex.clone(),
            access_level_hmac: self.access_level_hmac.clone(),
        }
    }
}

impl fmt::Debug for IdentityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCredentials")
            .field("public_key", &self.public_key)
            .field("encrypted_seed_hex", &"<redacted>")
            .field("access_level", &self.access_level)
            .field("access_level_hmac", &"<redacted>")
            .finish()
    }
}

/// Client for the identity service.
///
/// Every request gets a fresh correlation id and is registered with the
/// router before it is posted, so a fast response cannot be missed.
#[derive(Clone)]
pub struct IdentityClient {
    credentials: IdentityCredentials,
    channel: Arc<dyn IdentityChannel>,
    router: ResponseRouter,
    destination: String,
    timeout: Duration,
}

impl IdentityClient {
    /// Create a client posting through `channel` and receiving via `router`.
    pub fn new(
        credentials: IdentityCredentials,
        channel: Arc<dyn IdentityChannel>,
        router: ResponseRouter,
    ) -> Self {
        Self {
            credentials,
            channel,
            router,
            destination: DEFAULT_IDENTITY_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the identity service URL requests are addressed to.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Set how long to wait for each response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The credentials this client presents.
    pub fn credentials(&self) -> &IdentityCredentials {
        &self.credentials
    }

    /// The response router.
    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    /// The identity service URL.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the service to sign a 32-byte digest.
    ///
    /// The returned parts carry `v` exactly as the service reported it.
    pub async fn sign_hash(&self, digest: &[u8; 32]) -> Result<SignatureParts> {
        let payload = self
            .credentials
            .payload(self.credentials.access_level, Some(vec![hex::encode(digest)]));
        let response = self.request(IdentityMethod::SignEth, payload).await?;

        if let Some(error) = response.payload.error {
            return Err(IdentityError::Rejected(error));
        }
        let sig = response
            .payload
            .signatures
            .and_then(|sigs| sigs.into_iter().next())
            .ok_or_else(|| IdentityError::Rejected("response carried no signature".into()))?;

        let r = signature::scalar_from_hex(&sig.r)
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
        let s = signature::scalar_from_hex(&sig.s)
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
        let encoded = signature::encode(&r, &s, sig.v)
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
        Ok(signature::decode(&encoded)?)
    }

    /// Ask the service for an API JWT.
    pub async fn jwt(&self) -> Result<String> {
        let payload = self.credentials.payload(JWT_ACCESS_LEVEL, None);
        let response = self.request(IdentityMethod::Jwt, payload).await?;

        match response.payload.jwt {
            Some(jwt) if !jwt.is_empty() => Ok(jwt),
            _ => Err(IdentityError::Rejected("could not get jwt".into())),
        }
    }

    async fn request(
        &self,
        method: IdentityMethod,
        payload: RequestPayload,
    ) -> Result<IdentityResponse> {
        let id = Uuid::new_v4().to_string();
        let pending = self.router.register(&id)?;

        tracing::debug!(
            correlation_id = %id,
            ?method,
            destination = %self.destination,
            "posting identity request"
        );
        self.channel
            .post(&self.destination, IdentityRequest::new(id, method, payload))
            .await?;

        pending.wait(self.timeout).await
    }
}

impl fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClient")
            .field("credentials", &self.credentials)
            .field("destination", &self.destination)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::memory::{MockBehavior, MockIdentityService};
    use bundledao_core::crypto::{personal_message_digest, Secp256k1Keypair};

    fn credentials() -> IdentityCredentials {
        IdentityCredentials {
            public_key: "BC1YLhteKe5ASEjeFMC7nkvBnAtSfomQUcrzUsLfZLBVumdk8cmVzBJ".into(),
            encrypted_seed_hex: "sealed".into(),
            access_level: 2,
            access_level_hmac: "mac".into(),
        }
    }

    fn client_with(behavior: MockBehavior, keypair: Secp256k1Keypair) -> IdentityClient {
        let router = ResponseRouter::new();
        let (service, channel) = MockIdentityService::new(keypair, router.clone());
        service.behavior(behavior).spawn();
        IdentityClient::new(credentials(), Arc::new(channel), router)
            .with_timeout(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_sign_hash_recovers_to_key() {
        let keypair = Secp256k1Keypair::from_bytes(&[0x42; 32]).unwrap();
        let client = client_with(MockBehavior::Respond, keypair.clone());

        let digest = personal_message_digest(b"remote");
        let parts = client.sign_hash(&digest).await.unwrap();
        assert!(matches!(parts.v, Some(0) | Some(1)));
        assert!(signature::verify(
            &keypair.public_key().to_uncompressed(),
            &digest,
            &parts.to_compact()
        ));
    }

    #[tokio::test]
    async fn test_jwt() {
        let client = client_with(MockBehavior::Respond, Secp256k1Keypair::generate());
        assert_eq!(client.jwt().await.unwrap(), "mock-jwt-1");
        assert_eq!(client.jwt().await.unwrap(), "mock-jwt-2");
    }

    #[tokio::test]
    async fn test_rejected_response() {
        let client = client_with(MockBehavior::Reject, Secp256k1Keypair::generate());
        assert!(matches!(
            client.sign_hash(&[1u8; 32]).await,
            Err(IdentityError::Rejected(_))
        ));
        assert!(matches!(client.jwt().await, Err(IdentityError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_silent_service_times_out() {
        let client = client_with(MockBehavior::Silent, Secp256k1Keypair::generate())
            .with_timeout(Duration::from_millis(20));
        assert!(matches!(
            client.sign_hash(&[1u8; 32]).await,
            Err(IdentityError::Timeout(_))
        ));
        assert_eq!(client.router().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_requests_addressed_to_destination() {
        let router = ResponseRouter::new();
        let (service, channel) = MockIdentityService::new(Secp256k1Keypair::generate(), router.clone());
        let stats = service.stats();
        service.spawn();

        let client = IdentityClient::new(credentials(), Arc::new(channel), router.clone());
        assert_eq!(client.destination(), DEFAULT_IDENTITY_URL);
        client.jwt().await.unwrap();

        let client = client.with_destination("https://identity.example");
        client.jwt().await.unwrap();
        assert_eq!(
            stats.destinations(),
            [DEFAULT_IDENTITY_URL, "https://identity.example"]
        );
    }

    #[tokio::test]
    async fn test_garbled_signature_is_malformed() {
        let client = client_with(MockBehavior::GarbledSignature, Secp256k1Keypair::generate());
        assert!(matches!(
            client.sign_hash(&[1u8; 32]).await,
            Err(IdentityError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_v_passed_through() {
        let client = client_with(MockBehavior::OutOfRangeV, Secp256k1Keypair::generate());
        let parts = client.sign_hash(&[1u8; 32]).await.unwrap();
        assert_eq!(parts.recovery_id(), None);
    }

    #[test]
    fn test_missing_fields() {
        assert!(credentials().missing_fields().is_empty());
        let empty = IdentityCredentials::default();
        assert_eq!(
            empty.missing_fields(),
            vec!["publicKey", "encryptedSeedHex", "accessLevel", "accessLevelHmac"]
        );
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("BC1YL"));
        assert!(!debug.contains("sealed"));
        assert!(!debug.contains("\"mac\""));
    }
}
