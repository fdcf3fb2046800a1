//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use bundledao_core::{
    create_data_item, DataItem, DesoPublicKey, LocalSigner, Network, Secp256k1Keypair,
    Secp256k1PublicKey, Signer, Tag,
};
use bundledao_identity::channel::memory::{MockBehavior, MockIdentityService, MockStats};
use bundledao_identity::{IdentityChannel, IdentityCredentials, ResponseRouter};
use tokio::task::JoinHandle;

/// The fixed key used by the reference scenarios.
pub const ALICE_SEED: [u8; 32] = [0x42; 32];

/// A test fixture with a deterministic local signer.
pub struct TestFixture {
    pub seed: [u8; 32],
    pub keypair: Secp256k1Keypair,
    pub signer: Arc<LocalSigner>,
}

impl TestFixture {
    /// The fixture for [`ALICE_SEED`].
    pub fn alice() -> Self {
        Self::with_seed(ALICE_SEED)
    }

    /// Create with a deterministic keypair from seed.
    ///
    /// # Panics
    ///
    /// Panics if the seed is not a valid secp256k1 scalar.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = Secp256k1Keypair::from_bytes(&seed).expect("seed is a valid scalar");
        Self {
            seed,
            signer: Arc::new(LocalSigner::new(keypair.clone())),
            keypair,
        }
    }

    /// The private key as hex, the form `connect` accepts.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }

    /// The secp256k1 public key.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        self.keypair.public_key()
    }

    /// The mainnet DeSo public key string.
    pub fn deso_public_key(&self) -> String {
        DesoPublicKey::new(self.public_key(), Network::Mainnet).to_string()
    }

    /// Identity credentials for this key, with placeholder secrets.
    pub fn credentials(&self) -> IdentityCredentials {
        IdentityCredentials {
            public_key: self.deso_public_key(),
            encrypted_seed_hex: "encrypted-seed".into(),
            access_level: 4,
            access_level_hmac: "access-level-hmac".into(),
        }
    }

    /// Create a signed item the way the client does.
    pub async fn make_item(&self, payload: &[u8], tags: &[Tag]) -> DataItem {
        create_data_item(payload, self.signer.as_ref() as &dyn Signer, tags)
            .await
            .expect("local signing succeeds")
    }

    /// Create `count` signed items with distinct payloads.
    pub async fn make_items(&self, count: usize) -> Vec<DataItem> {
        let mut items = Vec::with_capacity(count);
        for i in 0..count {
            items.push(self.make_item(format!("item {i}").as_bytes(), &[]).await);
        }
        items
    }

    /// Start an in-memory identity service holding this fixture's key.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mock_identity(&self, behavior: MockBehavior) -> MockIdentity {
        let router = ResponseRouter::new();
        let (service, channel) = MockIdentityService::new(self.keypair.clone(), router.clone());
        let service = service.behavior(behavior);
        let stats = service.stats();
        let handle = service.spawn();
        MockIdentity {
            router,
            channel: Arc::new(channel),
            stats,
            handle,
        }
    }
}

/// A running in-memory identity service and the handles to reach it.
pub struct MockIdentity {
    pub router: ResponseRouter,
    pub channel: Arc<dyn IdentityChannel>,
    pub stats: Arc<MockStats>,
    pub handle: JoinHandle<()>,
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0x11u8; 32];
            seed[0] = i as u8 + 1;
            TestFixture::with_seed(seed)
        })
        .collect()
}
