//! Token sources for node API authentication.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bundledao_api::{ApiError, TokenSource};
use bundledao_core::Secp256k1Keypair;
use bundledao_identity::IdentityClient;
use serde::Serialize;
use uuid::Uuid;

/// JOSE header of locally minted tokens.
const JWT_HEADER: &str = r#"{"alg":"ES256","typ":"JWT"}"#;

#[derive(Serialize)]
struct Claims {
    iat: u64,
    exp: u64,
    jti: String,
}

/// Mints JWTs with a local key: ECDSA over SHA-256 of the signing input.
pub struct LocalJwtSource {
    keypair: Secp256k1Keypair,
    lifetime: Duration,
}

impl LocalJwtSource {
    /// Create a source whose tokens expire after `lifetime`.
    pub fn new(keypair: Secp256k1Keypair, lifetime: Duration) -> Self {
        Self { keypair, lifetime }
    }

    /// Mint a token issued at `iat` (seconds since the epoch).
    ///
    /// Each token carries a random `jti`, so two tokens minted in the same
    /// second still differ.
    pub fn mint_at(&self, iat: u64) -> Result<String, ApiError> {
        let claims = Claims {
            iat,
            exp: iat + self.lifetime.as_secs(),
            jti: Uuid::new_v4().to_string(),
        };
        let claims =
            serde_json::to_vec(&claims).map_err(|e| ApiError::AuthRefresh(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self
            .keypair
            .sign_sha256(signing_input.as_bytes())
            .map_err(|e| ApiError::AuthRefresh(e.to_string()))?;

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }
}

#[async_trait]
impl TokenSource for LocalJwtSource {
    async fn fetch(&self) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::AuthRefresh(e.to_string()))?;
        self.mint_at(now.as_secs())
    }
}

/// Fetches JWTs from the identity service.
pub struct IdentityTokenSource {
    client: Arc<IdentityClient>,
}

impl IdentityTokenSource {
    /// Create a source backed by `client`.
    pub fn new(client: Arc<IdentityClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenSource for IdentityTokenSource {
    async fn fetch(&self) -> Result<String, ApiError> {
        self.client
            .jwt()
            .await
            .map_err(|e| ApiError::AuthRefresh(e.to_string()))
    }
}
