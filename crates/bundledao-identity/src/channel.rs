//! Outbound channel abstraction for identity requests.
//!
//! The channel only sends. Responses come back through whatever inbound
//! path the host has (a message event, a socket) and are handed to a
//! [`ResponseRouter`](crate::router::ResponseRouter).

use async_trait::async_trait;

use crate::error::Result;
use crate::messages::IdentityRequest;

/// Sends requests to the identity service.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait IdentityChannel: Send + Sync {
    /// Deliver a request to the service at `destination`.
    async fn post(&self, destination: &str, request: IdentityRequest) -> Result<()>;
}

/// An in-memory identity service for testing and host substitution.
pub mod memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    use bundledao_core::crypto::Secp256k1Keypair;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    use crate::error::IdentityError;
    use crate::messages::{EthSignature, IdentityMethod, IdentityResponse, ResponsePayload};
    use crate::router::ResponseRouter;

    /// How the mock service answers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockBehavior {
        /// Answer every request.
        Respond,
        /// Never answer.
        Silent,
        /// Answer with an empty payload.
        Reject,
        /// Hold requests until `n` have arrived, then answer newest first.
        Reverse(usize),
        /// Answer signing requests with `r` and `s` that are not hex.
        GarbledSignature,
        /// Answer signing requests with a `v` that is not a recovery id.
        OutOfRangeV,
    }

    /// Channel half held by the client.
    #[derive(Debug, Clone)]
    pub struct MemoryChannel {
        tx: mpsc::Sender<(String, IdentityRequest)>,
    }

    #[async_trait]
    impl IdentityChannel for MemoryChannel {
        async fn post(&self, destination: &str, request: IdentityRequest) -> Result<()> {
            self.tx
                .send((destination.to_string(), request))
                .await
                .map_err(|_| IdentityError::Channel("identity service stopped".into()))
        }
    }

    /// Counters observed by tests.
    #[derive(Debug, Default)]
    pub struct MockStats {
        sign_requests: AtomicUsize,
        jwt_requests: AtomicUsize,
        destinations: Mutex<Vec<String>>,
    }

    impl MockStats {
        /// Number of `signETH` requests received.
        pub fn sign_requests(&self) -> usize {
            self.sign_requests.load(Ordering::SeqCst)
        }

        /// Number of `jwt` requests received.
        pub fn jwt_requests(&self) -> usize {
            self.jwt_requests.load(Ordering::SeqCst)
        }

        /// Destination of every request received, in arrival order.
        pub fn destinations(&self) -> Vec<String> {
            self.destinations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    /// A mock identity service holding the user's key in memory.
    pub struct MockIdentityService {
        keypair: Secp256k1Keypair,
        behavior: MockBehavior,
        router: ResponseRouter,
        rx: mpsc::Receiver<(String, IdentityRequest)>,
        stats: Arc<MockStats>,
    }

    impl MockIdentityService {
        /// Create a service that answers into `router`, and the channel that
        /// reaches it.
        pub fn new(keypair: Secp256k1Keypair, router: ResponseRouter) -> (Self, MemoryChannel) {
            let (tx, rx) = mpsc::channel(1000);
            let service = Self {
                keypair,
                behavior: MockBehavior::Respond,
                router,
                rx,
                stats: Arc::new(MockStats::default()),
            };
            (service, MemoryChannel { tx })
        }

        /// Set how the service answers.
        pub fn behavior(mut self, behavior: MockBehavior) -> Self {
            self.behavior = behavior;
            self
        }

        /// Shared request counters.
        pub fn stats(&self) -> Arc<MockStats> {
            Arc::clone(&self.stats)
        }

        /// Run the service until every channel half is dropped.
        pub fn spawn(self) -> JoinHandle<()> {
            tokio::spawn(self.run())
        }

        async fn run(mut self) {
            let mut held = VecDeque::new();
            while let Some((destination, request)) = self.rx.recv().await {
                self.stats
                    .destinations
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(destination);
                match request.method {
                    IdentityMethod::SignEth => self.stats.sign_requests.fetch_add(1, Ordering::SeqCst),
                    IdentityMethod::Jwt => self.stats.jwt_requests.fetch_add(1, Ordering::SeqCst),
                };

                match self.behavior {
                    MockBehavior::Silent => {}
                    MockBehavior::Reject => {
                        self.router.deliver(IdentityResponse {
                            id: request.id,
                            payload: ResponsePayload::default(),
                        });
                    }
                    MockBehavior::Respond
                    | MockBehavior::GarbledSignature
                    | MockBehavior::OutOfRangeV => {
                        let response = self.answer(request);
                        self.router.deliver(response);
                    }
                    MockBehavior::Reverse(n) => {
                        held.push_front(request);
                        if held.len() >= n {
                            for request in held.drain(..) {
                                let response = self.answer(request);
                                self.router.deliver(response);
                            }
                        }
                    }
                }
            }
        }

        fn answer(&self, request: IdentityRequest) -> IdentityResponse {
            let payload = match request.method {
                IdentityMethod::Jwt => ResponsePayload {
                    jwt: Some(format!("mock-jwt-{}", self.stats.jwt_requests())),
                    ..Default::default()
                },
                IdentityMethod::SignEth => self.sign_hashes(
                    request.payload.unsigned_hashes.as_deref().unwrap_or_default(),
                ),
            };
            IdentityResponse {
                id: request.id,
                payload,
            }
        }

        fn sign_hashes(&self, hashes: &[String]) -> ResponsePayload {
            let mut signatures = Vec::with_capacity(hashes.len());
            for hash in hashes {
                let Some(digest) = hex::decode(hash)
                    .ok()
                    .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
                else {
                    return ResponsePayload {
                        error: Some(format!("cannot sign {hash:?}")),
                        ..Default::default()
                    };
                };
                let Ok(parts) = self.keypair.sign_digest(&digest) else {
                    return ResponsePayload::default();
                };
                // The service reports the bare recovery id.
                let signature = match self.behavior {
                    MockBehavior::GarbledSignature => EthSignature {
                        r: "zz".repeat(32),
                        s: "not hex".into(),
                        v: 0,
                    },
                    MockBehavior::OutOfRangeV => EthSignature {
                        r: hex::encode(parts.r),
                        s: hex::encode(parts.s),
                        v: 9,
                    },
                    _ => EthSignature {
                        r: hex::encode(parts.r),
                        s: hex::encode(parts.s),
                        v: parts.recovery_id().unwrap_or_default(),
                    },
                };
                signatures.push(signature);
            }
            ResponsePayload {
                signatures: Some(signatures),
                ..Default::default()
            }
        }
    }
}
