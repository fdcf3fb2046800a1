//! # BundleDAO Testkit
//!
//! Testing utilities for the BundleDAO SDK.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known hashes, key encodings, and tag encodings
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic signers and an in-memory identity service
//!
//! ## Golden Vectors
//!
//! ```rust
//! use bundledao_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{name}: {actual}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use bundledao_testkit::generators::{data_item_from_params, DataItemParams};
//!
//! proptest! {
//!     #[test]
//!     fn signed_items_verify(params: DataItemParams) {
//!         prop_assert!(data_item_from_params(&params).is_valid());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use bundledao_testkit::fixtures::TestFixture;
//!
//! let alice = TestFixture::alice();
//! let item = alice.make_item(b"hello", &[]).await;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, MockIdentity, TestFixture, ALICE_SEED};
pub use generators::{data_item_from_params, DataItemParams};
pub use vectors::verify_all_vectors;
