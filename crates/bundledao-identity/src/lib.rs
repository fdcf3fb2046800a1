//! # BundleDAO Identity
//!
//! Client side of the identity service protocol and the remote signer built
//! on it.
//!
//! The host supplies an outbound [`IdentityChannel`] and feeds inbound
//! responses to a [`ResponseRouter`]. Requests are matched to responses
//! strictly by correlation id; concurrent requests never cross-resolve, and
//! a request that times out removes its routing entry.
//!
//! ```rust,ignore
//! let router = ResponseRouter::new();
//! let client = IdentityClient::new(credentials, channel, router.clone());
//! let signer = RemoteSigner::new(Arc::new(client))?;
//!
//! // elsewhere, on every message from the identity service:
//! router.deliver(serde_json::from_str(&event)?);
//! ```

pub mod channel;
pub mod client;
pub mod error;
pub mod messages;
pub mod remote_signer;
pub mod router;

pub use channel::IdentityChannel;
pub use client::{
    IdentityClient, IdentityCredentials, DEFAULT_IDENTITY_URL, DEFAULT_REQUEST_TIMEOUT,
};
pub use error::{IdentityError, Result};
pub use messages::{IdentityMethod, IdentityRequest, IdentityResponse};
pub use remote_signer::RemoteSigner;
pub use router::{PendingResponse, ResponseRouter};
