//! A [`Signer`] that delegates to the identity service.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bundledao_core::crypto::{personal_message_digest, UNCOMPRESSED_PUBLIC_KEY_LENGTH};
use bundledao_core::signature::{self, ETHEREUM_V_OFFSET};
use bundledao_core::{DesoPublicKey, Secp256k1PublicKey, Signer, SignerError};

use crate::client::IdentityClient;
use crate::error::Result;

/// Signs by sending the message digest to the identity service.
///
/// Holds only the public key. Returned signatures are re-encoded to the
/// 65-byte `r || s || v` form and checked against the owner before they
/// are handed back.
#[derive(Clone)]
pub struct RemoteSigner {
    client: Arc<IdentityClient>,
    owner: [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH],
}

impl RemoteSigner {
    /// Create a signer for the public key in the client's credentials.
    pub fn new(client: Arc<IdentityClient>) -> Result<Self> {
        let key: DesoPublicKey = client.credentials().public_key.parse()?;
        Ok(Self::with_public_key(client, key.public_key()))
    }

    /// Create a signer for an explicit public key.
    pub fn with_public_key(client: Arc<IdentityClient>, key: &Secp256k1PublicKey) -> Self {
        Self {
            client,
            owner: key.to_uncompressed(),
        }
    }

    /// The identity client requests go through.
    pub fn client(&self) -> &Arc<IdentityClient> {
        &self.client
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    fn public_key(&self) -> &[u8] {
        &self.owner
    }

    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
        let digest = personal_message_digest(message);
        let parts = self.client.sign_hash(&digest).await?;

        let recovery_id = parts
            .recovery_id()
            .ok_or_else(|| SignerError::Rejected(format!("invalid v {:?}", parts.v)))?;
        let encoded = signature::encode(&parts.r, &parts.s, ETHEREUM_V_OFFSET + recovery_id)
            .map_err(|e| SignerError::Encoding(e.to_string()))?;

        if !signature::verify(&self.owner, &digest, &encoded) {
            return Err(SignerError::Rejected(
                "signature does not verify against the owner key".into(),
            ));
        }
        Ok(encoded.to_vec())
    }
}

impl fmt::Debug for RemoteSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSigner")
            .field("owner", &hex::encode(&self.owner[..8]))
            .field("client", &self.client)
            .finish()
    }
}
