//! The high-level client.

use std::fmt;
use std::sync::Arc;

use bundledao_api::{Balance, BundleDaoApi, PostBundleResponse, TokenCache, TokenSource};
use bundledao_core::{Bundle, DataItem, DesoPublicKey, LocalSigner, Network, Signer, Tag};
use bundledao_identity::{
    IdentityChannel, IdentityClient, IdentityCredentials, RemoteSigner, ResponseRouter,
};
use tracing::{debug, info};

use crate::auth::{IdentityTokenSource, LocalJwtSource};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// How the client obtains signatures and API tokens.
pub enum ConnectOptions {
    /// Sign with a private key held in memory.
    Local {
        /// Hex-encoded 32-byte private key.
        seed_hex: String,
    },
    /// Delegate signing to the identity service.
    Identity {
        /// Credentials issued by the identity service at login.
        credentials: IdentityCredentials,
        /// Outbound message channel to the service.
        channel: Arc<dyn IdentityChannel>,
        /// Router the host feeds inbound responses into.
        router: ResponseRouter,
    },
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { .. } => f
                .debug_struct("Local")
                .field("seed_hex", &"<redacted>")
                .finish(),
            Self::Identity { credentials, .. } => f
                .debug_struct("Identity")
                .field("credentials", credentials)
                .finish_non_exhaustive(),
        }
    }
}

struct Connection {
    signer: Arc<dyn Signer>,
    api: BundleDaoApi,
    public_key: String,
}

/// Creates, signs, bundles, and submits data items.
///
/// # Example
///
/// ```rust,ignore
/// use bundledao::{BundleDaoClient, ClientConfig, ConnectOptions};
///
/// let mut client = BundleDaoClient::new(ClientConfig::default());
/// client.connect(ConnectOptions::Local { seed_hex }).await?;
///
/// let item = client.create_data(b"hello", &[]).await?;
/// let bundle = client.create_bundle(&[item])?;
/// let response = client.post_bundle(&bundle).await?;
/// println!("txid: {}", response.txid);
/// ```
pub struct BundleDaoClient {
    config: ClientConfig,
    connection: Option<Connection>,
}

impl BundleDaoClient {
    /// Create a disconnected client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether `connect` has succeeded.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The DeSo public key of the connected account.
    pub fn public_key(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.public_key.as_str())
    }

    /// The configured signer.
    pub fn signer(&self) -> Result<&Arc<dyn Signer>> {
        Ok(&self.connection()?.signer)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connection
    // ─────────────────────────────────────────────────────────────────────────

    /// Configure the signer and the authenticated API.
    ///
    /// Replaces any previous connection. On error the client is left as it
    /// was.
    pub async fn connect(&mut self, options: ConnectOptions) -> Result<()> {
        let (signer, tokens, public_key) = match options {
            ConnectOptions::Local { seed_hex } => {
                let signer = LocalSigner::from_seed_hex(&seed_hex)?;
                let public_key =
                    DesoPublicKey::new(signer.secp256k1_public_key(), Network::Mainnet)
                        .to_string();
                let tokens =
                    LocalJwtSource::new(signer.keypair().clone(), self.config.jwt_max_age);
                (
                    Arc::new(signer) as Arc<dyn Signer>,
                    Arc::new(tokens) as Arc<dyn TokenSource>,
                    public_key,
                )
            }
            ConnectOptions::Identity {
                credentials,
                channel,
                router,
            } => {
                let missing = credentials.missing_fields();
                if !missing.is_empty() {
                    return Err(ClientError::MissingCredentials(missing));
                }
                let public_key = credentials.public_key.clone();
                let client = Arc::new(
                    IdentityClient::new(credentials, channel, router)
                        .with_destination(self.config.identity_url.clone())
                        .with_timeout(self.config.sign_timeout),
                );
                let signer = RemoteSigner::new(Arc::clone(&client))?;
                (
                    Arc::new(signer) as Arc<dyn Signer>,
                    Arc::new(IdentityTokenSource::new(client)) as Arc<dyn TokenSource>,
                    public_key,
                )
            }
        };

        let api = BundleDaoApi::new(
            self.config.node_url.clone(),
            public_key.clone(),
            TokenCache::with_max_age(tokens, self.config.jwt_max_age),
            self.config.request_timeout,
        )?;

        info!(
            public_key = %public_key,
            node_url = %self.config.node_url,
            "connected"
        );

        self.connection = Some(Connection {
            signer,
            api,
            public_key,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Data items and bundles
    // ─────────────────────────────────────────────────────────────────────────

    /// Create and sign a data item carrying the SDK's App tags.
    pub async fn create_data(&self, payload: impl AsRef<[u8]>, tags: &[Tag]) -> Result<DataItem> {
        let signer = self.signer()?;
        let item = bundledao_core::create_data_item(payload, signer.as_ref(), tags).await?;
        debug!(id = %item.id(), len = item.len(), "created data item");
        Ok(item)
    }

    /// Pack signed items into a bundle.
    pub fn create_bundle(&self, items: &[DataItem]) -> Result<Bundle> {
        Ok(bundledao_core::create_bundle(items)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node API
    // ─────────────────────────────────────────────────────────────────────────

    /// Submit a bundle to the node.
    pub async fn post_bundle(&self, bundle: &Bundle) -> Result<PostBundleResponse> {
        let connection = self.connection()?;
        let response = connection.api.post_bundle(bundle.as_bytes().clone()).await?;
        debug!(
            txid = %response.txid,
            items = bundle.item_count().unwrap_or_default(),
            bytes = bundle.len(),
            "posted bundle"
        );
        Ok(response)
    }

    /// The connected account's balance.
    pub async fn get_balance(&self) -> Result<Balance> {
        Ok(self.connection()?.api.get_balance().await?)
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(ClientError::SignerNotConfigured)
    }
}
