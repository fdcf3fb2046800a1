//! HTTP client for the BundleDAO node.
//!
//! Every request carries `Authorization: <public key> <jwt>`. A 401 is
//! retried once after a forced token refresh; a second 401 is returned to
//! the caller as [`ApiError::Unauthorized`].

use std::time::Duration;

use bytes::Bytes;
use hyper::ext::ReasonPhrase;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::token::TokenCache;

/// Outcome of a successful bundle submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBundleResponse {
    pub txid: String,
    pub status: u16,
    pub status_text: String,
}

/// Account balance as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub credit: f64,
    pub deso: f64,
}

#[derive(Deserialize)]
struct TxidBody {
    txid: String,
}

/// Authenticated client for the node API.
#[derive(Debug, Clone)]
pub struct BundleDaoApi {
    http: Client,
    base_url: String,
    public_key: String,
    tokens: TokenCache,
}

impl BundleDaoApi {
    /// Create a client for `base_url` that authenticates as `public_key`.
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        tokens: TokenCache,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(http, base_url, public_key, tokens))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        tokens: TokenCache,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_key: public_key.into(),
            tokens,
        }
    }

    /// The node base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token cache used for auth headers.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Submit a serialized bundle.
    ///
    /// Only 200 and 202 count as accepted. 410 means the account cannot pay
    /// for the bundle; every other status is a submission failure.
    pub async fn post_bundle(&self, bundle: Bytes) -> Result<PostBundleResponse> {
        let url = format!("{}/bundle", self.base_url);
        let response = self
            .send(|http| http.post(&url).body(bundle.clone()))
            .await?;

        let status = response.status();
        let status_text = status_text(&response);
        if status == StatusCode::GONE {
            return Err(ApiError::InsufficientFunds(status_text));
        }
        if !matches!(status, StatusCode::OK | StatusCode::ACCEPTED) {
            return Err(ApiError::Submission {
                status: status.as_u16(),
                status_text,
            });
        }

        let body = response.text().await?;
        let txid = parse_txid(&body)?;
        tracing::info!(%txid, status = status.as_u16(), "bundle submitted");

        Ok(PostBundleResponse {
            txid,
            status: status.as_u16(),
            status_text,
        })
    }

    /// Fetch the account balance.
    pub async fn get_balance(&self) -> Result<Balance> {
        let url = format!("{}/balance", self.base_url);
        let response = self.send(|http| http.get(&url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                status_text: status_text(&response),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send with auth, retrying once after a token refresh on 401.
    async fn send(&self, build: impl Fn(&Client) -> RequestBuilder) -> Result<Response> {
        let token = self.tokens.get().await?;
        let response = build(&self.http)
            .header(AUTHORIZATION, self.auth_header(&token))
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("node returned 401, refreshing auth token and retrying");
        let token = self.tokens.refresh(&token).await?;
        let response = build(&self.http)
            .header(AUTHORIZATION, self.auth_header(&token))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    fn auth_header(&self, token: &str) -> String {
        format!("{} {}", self.public_key, token)
    }
}

/// The reason phrase the server sent, or the canonical one if it sent the
/// standard text.
fn status_text(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Accept `{"txid": "..."}`, a JSON string, or a bare text body.
fn parse_txid(body: &str) -> Result<String> {
    if let Ok(TxidBody { txid }) = serde_json::from_str(body) {
        return Ok(txid);
    }
    if let Ok(txid) = serde_json::from_str::<String>(body) {
        return Ok(txid);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Decode("empty submission response".into()));
    }
    Ok(trimmed.to_string())
}
