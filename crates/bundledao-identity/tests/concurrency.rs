//! Concurrent remote signing over a shared router.

use std::sync::Arc;
use std::time::Duration;

use bundledao_core::{verify_message, DesoPublicKey, Network, Secp256k1Keypair, Signer, SignerError};
use bundledao_identity::channel::memory::{MockBehavior, MockIdentityService};
use bundledao_identity::{IdentityClient, IdentityCredentials, RemoteSigner, ResponseRouter};

fn remote_signer(behavior: MockBehavior, timeout: Duration) -> (RemoteSigner, ResponseRouter) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let keypair = Secp256k1Keypair::from_bytes(&[0x42; 32]).unwrap();
    let router = ResponseRouter::new();
    let (service, channel) = MockIdentityService::new(keypair.clone(), router.clone());
    service.behavior(behavior).spawn();

    let credentials = IdentityCredentials {
        public_key: DesoPublicKey::new(keypair.public_key(), Network::Mainnet).to_string(),
        encrypted_seed_hex: "sealed".into(),
        access_level: 2,
        access_level_hmac: "mac".into(),
    };
    let client = IdentityClient::new(credentials, Arc::new(channel), router.clone())
        .with_timeout(timeout);
    (RemoteSigner::new(Arc::new(client)).unwrap(), router)
}

#[tokio::test]
async fn test_out_of_order_responses_do_not_cross_resolve() {
    const N: usize = 8;
    let (signer, router) = remote_signer(MockBehavior::Reverse(N), Duration::from_secs(5));
    let signer = Arc::new(signer);

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let signer = Arc::clone(&signer);
            tokio::spawn(async move {
                let message = format!("message {i}").into_bytes();
                let sig = signer.sign(&message).await.unwrap();
                (message, sig)
            })
        })
        .collect();

    for handle in handles {
        let (message, sig) = handle.await.unwrap();
        assert!(verify_message(signer.public_key(), &message, &sig));
    }
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_concurrent_timeouts_leave_no_entries() {
    let (signer, router) = remote_signer(MockBehavior::Silent, Duration::from_millis(50));
    let signer = Arc::new(signer);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let signer = Arc::clone(&signer);
            tokio::spawn(async move { signer.sign(&[i]).await })
        })
        .collect();

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(SignerError::Timeout(_))
        ));
    }
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_cancelled_sign_cleans_up() {
    let (signer, router) = remote_signer(MockBehavior::Silent, Duration::from_secs(60));

    let handle = tokio::spawn(async move { signer.sign(b"never answered").await });
    while router.pending_count() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    assert_eq!(router.pending_count(), 0);
}
