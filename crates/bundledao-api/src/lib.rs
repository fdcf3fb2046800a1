//! # BundleDAO API
//!
//! Authenticated HTTP access to the BundleDAO node: bundle submission and
//! balance queries.
//!
//! Auth tokens come from a [`TokenSource`] behind a [`TokenCache`]. The
//! cache coalesces concurrent refreshes, and [`BundleDaoApi`] retries a
//! request exactly once when the node answers 401.

pub mod api;
pub mod error;
pub mod token;

pub use api::{Balance, BundleDaoApi, PostBundleResponse};
pub use error::{ApiError, Result};
pub use token::{TokenCache, TokenSource, DEFAULT_TOKEN_MAX_AGE};
