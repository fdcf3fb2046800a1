//! # BundleDAO Core
//!
//! Pure primitives for the BundleDAO SDK: signatures, signers, data items,
//! and bundles.
//!
//! This crate performs no I/O. The only suspension point is
//! [`Signer::sign`], which remote implementations use to wait on an external
//! service.
//!
//! ## Key Types
//!
//! - [`Signer`] - Signing capability, implemented locally by [`LocalSigner`]
//! - [`DataItem`] - A signed, content-addressed unit of payload and tags
//! - [`DataItemId`] - SHA-256 of a data item's signature
//! - [`Bundle`] - Length-prefixed concatenation of signed data items
//!
//! ## Signatures
//!
//! Signatures are secp256k1 ECDSA over the personal-message digest, low-S,
//! serialized as 65 bytes `r || s || v`. See [`signature`].

pub mod bundle;
pub mod crypto;
pub mod data_item;
pub mod deep_hash;
pub mod deso;
pub mod error;
pub mod signature;
pub mod signer;
pub mod tags;
pub mod types;

pub use bundle::{create_bundle, Bundle, BundleHeader};
pub use crypto::{personal_message_digest, Secp256k1Keypair, Secp256k1PublicKey};
pub use data_item::{create_data_item, DataItem, DataItemBuilder, APP_NAME, APP_VERSION};
pub use deso::{DesoPublicKey, Network};
pub use error::{CoreError, Result, SignerError};
pub use signature::SignatureParts;
pub use signer::{verify_message, LocalSigner, SignatureType, Signer};
pub use tags::Tag;
pub use types::DataItemId;
