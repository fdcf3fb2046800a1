//! # BundleDAO
//!
//! Client SDK for the BundleDAO node: create signed data items, pack them
//! into bundles, and submit them for permanent storage.
//!
//! ## Overview
//!
//! - **Data items**: ANS-104 style signed envelopes around an arbitrary payload
//! - **Bundles**: Length-prefixed concatenations of signed data items
//! - **Signers**: A local secp256k1 key, or the DeSo identity service
//! - **API**: JWT-authenticated submission and balance queries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bundledao::{BundleDaoClient, ClientConfig, ConnectOptions, Tag};
//!
//! async fn example() -> bundledao::Result<()> {
//!     let mut client = BundleDaoClient::new(ClientConfig::default());
//!     client
//!         .connect(ConnectOptions::Local {
//!             seed_hex: "42".repeat(32),
//!         })
//!         .await?;
//!
//!     let item = client
//!         .create_data(b"hello", &[Tag::new("Content-Type", "text/plain")])
//!         .await?;
//!     assert!(item.is_valid());
//!
//!     let bundle = client.create_bundle(&[item])?;
//!     let response = client.post_bundle(&bundle).await?;
//!     println!("submitted {}", response.txid);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `bundledao::core` - Data items, bundles, tags, and signing primitives
//! - `bundledao::identity` - Identity service protocol and remote signer
//! - `bundledao::api` - Node HTTP API and token cache

pub mod auth;
pub mod client;
pub mod config;
pub mod error;

// Re-export component crates
pub use bundledao_api as api;
pub use bundledao_core as core;
pub use bundledao_identity as identity;

pub use auth::{IdentityTokenSource, LocalJwtSource};
pub use client::{BundleDaoClient, ConnectOptions};
pub use config::ClientConfig;
pub use error::{ClientError, Result};

// Re-export commonly used types
pub use bundledao_api::{ApiError, Balance, PostBundleResponse};
pub use bundledao_core::{Bundle, DataItem, DataItemId, Signer, Tag};
pub use bundledao_identity::{IdentityCredentials, ResponseRouter};
