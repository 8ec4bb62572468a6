//! Attendance dispatcher: the scan-to-submission pipeline.
//!
//! Lifecycle per scan:
//!
//! ```text
//! IDLE --(scan, gate admits)--> PARSING
//! PARSING --(invalid)--> IDLE (error shown)
//! PARSING --(valid, no session)--> PENDING_STORED --> IDLE
//! PARSING --(valid, session present)--> SUBMITTING --(any verdict)--> IDLE
//! ```
//!
//! All states are transient; only the stored pending scan bridges sessions.
//! The gate is released after the work settles in every branch.

use crate::api::ApiClient;
use crate::error::{Result, RollcallError};
use crate::model::PendingScan;
use crate::scan::gate::ScanGate;
use crate::scan::parser;
use crate::store::{epoch_millis, KvStore};
use std::time::Instant;

/// What a single scan amounted to, for user-facing reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Suppressed as a rapid duplicate; nothing happened.
    Debounced,
    /// The payload was malformed; the user may rescan.
    Invalid(String),
    /// No session — the intent was stored for replay after login.
    DeferredPendingLogin,
    /// The server accepted the check-in.
    Submitted(String),
    /// The server rejected the check-in, or the request failed.
    /// No retry is attempted; the user may rescan after the cooldown.
    SubmissionFailed(String),
}

/// Debounced scan handler wiring the parser, store, and API together.
pub struct ScanPipeline<'a> {
    gate: &'a ScanGate,
    api: &'a ApiClient,
    store: &'a KvStore,
}

impl<'a> ScanPipeline<'a> {
    pub fn new(gate: &'a ScanGate, api: &'a ApiClient, store: &'a KvStore) -> Self {
        Self { gate, api, store }
    }

    /// Handle one raw scan callback.
    ///
    /// Errors are only returned for local faults (storage); parse failures
    /// and server verdicts are reported as outcomes since the user handles
    /// them by rescanning.
    pub async fn handle_scan(&self, raw: &str) -> Result<ScanOutcome> {
        if !self.gate.try_acquire(Instant::now()) {
            return Ok(ScanOutcome::Debounced);
        }

        let outcome = self.process(raw).await;
        self.gate.release();
        outcome
    }

    async fn process(&self, raw: &str) -> Result<ScanOutcome> {
        let payload = match parser::parse(raw) {
            Ok(payload) => payload,
            Err(RollcallError::InvalidPayload(reason)) => {
                tracing::debug!(%reason, "rejected scan payload");
                return Ok(ScanOutcome::Invalid(reason));
            }
            Err(other) => return Err(other),
        };

        let Some(user) = self.store.user()? else {
            // Pre-login: defer. A second scan overwrites the first.
            let pending = PendingScan {
                payload,
                scanned_at_epoch_millis: epoch_millis(),
            };
            self.store.set_pending_scan(&pending)?;
            tracing::info!(
                id = %pending.payload.id,
                "no session; stored scan for replay after login"
            );
            return Ok(ScanOutcome::DeferredPendingLogin);
        };

        match self.api.submit_attendance(&payload, user.id).await {
            Ok(message) => {
                tracing::info!(id = %payload.id, "attendance submitted");
                Ok(ScanOutcome::Submitted(message))
            }
            Err(RollcallError::ServerRejected { message, status }) => {
                tracing::warn!(status, "attendance rejected");
                Ok(ScanOutcome::SubmissionFailed(message))
            }
            Err(RollcallError::Network(e)) => {
                tracing::warn!(error = %e, "attendance submission failed");
                Ok(ScanOutcome::SubmissionFailed(e.to_string()))
            }
            Err(other) => Err(other),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanKind, User};
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{any, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION_QR: &str = "https://x/y?sessionId=abc123&expiredAt=1999999999";

    fn test_store() -> (TempDir, KvStore) {
        let tmp = TempDir::new().unwrap();
        let store = KvStore::open(&tmp.path().join("rollcall.db")).unwrap();
        (tmp, store)
    }

    fn open_gate() -> ScanGate {
        // Zero cooldown so sequential test scans are admitted
        ScanGate::new(Duration::ZERO, Duration::from_secs(15))
    }

    fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn user(id: i64) -> User {
        User {
            id,
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn pre_login_scan_is_deferred_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

        let (_tmp, store) = test_store();
        let gate = open_gate();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let outcome = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert_eq!(outcome, ScanOutcome::DeferredPendingLogin);

        let pending = store.pending_scan().unwrap().unwrap();
        assert_eq!(pending.payload.kind, ScanKind::Session);
        assert_eq!(pending.payload.id, "abc123");
        assert_eq!(pending.payload.expires_at_epoch_secs, 1_999_999_999);
    }

    #[tokio::test]
    async fn second_pre_login_scan_replaces_the_first() {
        let server = MockServer::start().await;
        let (_tmp, store) = test_store();
        let gate = open_gate();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        pipeline.handle_scan(SESSION_QR).await.unwrap();
        pipeline
            .handle_scan("eventId=ev9&expiredAt=1800000000")
            .await
            .unwrap();

        let pending = store.pending_scan().unwrap().unwrap();
        assert_eq!(pending.payload.kind, ScanKind::Event);
        assert_eq!(pending.payload.id, "ev9");
    }

    #[tokio::test]
    async fn logged_in_scan_submits_with_stored_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/attendance/abc123"))
            .and(body_json(serde_json::json!({
                "userId": 42,
                "expiresAtEpochSeconds": 1_999_999_999u64,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "message": "Checked in",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_tmp, store) = test_store();
        store.set_session("tok", &user(42)).unwrap();
        let gate = open_gate();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let outcome = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Submitted("Checked in".into()));
        assert!(store.pending_scan().unwrap().is_none());
    }

    #[tokio::test]
    async fn server_rejection_reports_failure_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/attendance/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 410,
                "message": "Session expired",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_tmp, store) = test_store();
        store.set_session("tok", &user(42)).unwrap();
        let gate = open_gate();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let outcome = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::SubmissionFailed("Session expired".into())
        );
    }

    #[tokio::test]
    async fn invalid_payload_reports_and_releases_gate() {
        let server = MockServer::start().await;
        let (_tmp, store) = test_store();
        let gate = open_gate();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let outcome = pipeline.handle_scan("just some text").await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Invalid(_)));
        assert!(store.pending_scan().unwrap().is_none());
        assert!(!gate.in_flight());
    }

    #[tokio::test]
    async fn rapid_duplicate_scan_is_debounced() {
        let server = MockServer::start().await;
        let (_tmp, store) = test_store();
        // Real cooldown: the second scan lands inside the window
        let gate = ScanGate::default();
        let api = api(&server);
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let first = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert_eq!(first, ScanOutcome::DeferredPendingLogin);

        let second = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert_eq!(second, ScanOutcome::Debounced);
    }

    #[tokio::test]
    async fn network_failure_reports_submission_failed() {
        // Point at a server that is not listening
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let (_tmp, store) = test_store();
        store.set_session("tok", &user(42)).unwrap();
        let gate = open_gate();
        let api = ApiClient::new(&uri, Duration::from_millis(500)).unwrap();
        let pipeline = ScanPipeline::new(&gate, &api, &store);

        let outcome = pipeline.handle_scan(SESSION_QR).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::SubmissionFailed(_)));
        assert!(!gate.in_flight());
    }
}
