//! Correlation-id routing of identity responses to waiting requests.
//!
//! Each outstanding request registers a one-shot slot keyed by its
//! correlation id. The slot is removed when the response is delivered or
//! when the [`PendingResponse`] is dropped, whichever comes first, so a
//! timed-out or cancelled request never leaves an entry behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{IdentityError, Result};
use crate::messages::IdentityResponse;

type PendingMap = HashMap<String, oneshot::Sender<IdentityResponse>>;

/// Shared map of correlation ids to waiting requests.
#[derive(Debug, Clone, Default)]
pub struct ResponseRouter {
    pending: Arc<Mutex<PendingMap>>,
}

impl ResponseRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the response with the given id.
    pub fn register(&self, id: &str) -> Result<PendingResponse> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        if pending.contains_key(id) {
            return Err(IdentityError::DuplicateRequest(id.to_string()));
        }
        pending.insert(id.to_string(), tx);

        Ok(PendingResponse {
            id: id.to_string(),
            rx,
            router: self.clone(),
        })
    }

    /// Hand a response to the request waiting on its id.
    ///
    /// Returns `false` if nothing is waiting (unknown, answered, or timed
    /// out).
    pub fn deliver(&self, response: IdentityResponse) -> bool {
        let Some(tx) = self.lock().remove(&response.id) else {
            tracing::debug!(correlation_id = %response.id, "dropping unmatched identity response");
            return false;
        };
        tx.send(response).is_ok()
    }

    /// Number of requests still waiting.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    fn lock(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered request awaiting its response.
#[derive(Debug)]
pub struct PendingResponse {
    id: String,
    rx: oneshot::Receiver<IdentityResponse>,
    router: ResponseRouter,
}

impl PendingResponse {
    /// The correlation id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the response, giving up after `timeout`.
    pub async fn wait(mut self, timeout: Duration) -> Result<IdentityResponse> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(IdentityError::Channel(format!(
                "response slot for {} was dropped",
                self.id
            ))),
            Err(_elapsed) => {
                tracing::warn!(correlation_id = %self.id, ?timeout, "identity request timed out");
                Err(IdentityError::Timeout(timeout))
            }
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.router.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ResponsePayload;

    fn response(id: &str) -> IdentityResponse {
        IdentityResponse {
            id: id.to_string(),
            payload: ResponsePayload {
                jwt: Some(format!("jwt-for-{id}")),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_deliver_to_matching_id() {
        let router = ResponseRouter::new();
        let a = router.register("a").unwrap();
        let b = router.register("b").unwrap();
        assert_eq!(router.pending_count(), 2);

        assert!(router.deliver(response("b")));
        assert!(router.deliver(response("a")));

        let got_a = a.wait(Duration::from_secs(1)).await.unwrap();
        let got_b = b.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(got_a.payload.jwt.as_deref(), Some("jwt-for-a"));
        assert_eq!(got_b.payload.jwt.as_deref(), Some("jwt-for-b"));
        assert_eq!(router.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_response_ignored() {
        let router = ResponseRouter::new();
        let _a = router.register("a").unwrap();
        assert!(!router.deliver(response("other")));
        assert_eq!(router.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_removes_entry() {
        let router = ResponseRouter::new();
        let pending = router.register("slow").unwrap();

        let result = pending.wait(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(IdentityError::Timeout(_))));
        assert_eq!(router.pending_count(), 0);

        // Late response finds nobody waiting
        assert!(!router.deliver(response("slow")));
    }

    #[test]
    fn test_drop_removes_entry() {
        let router = ResponseRouter::new();
        let pending = router.register("x").unwrap();
        assert_eq!(router.pending_count(), 1);
        drop(pending);
        assert_eq!(router.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let router = ResponseRouter::new();
        let _first = router.register("dup").unwrap();
        assert!(matches!(
            router.register("dup"),
            Err(IdentityError::DuplicateRequest(_))
        ));
    }
}
