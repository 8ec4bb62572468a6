//! Pending-scan reconciler.
//!
//! Runs once, immediately after a successful login: replays the stored
//! pre-login scan against the attendance service under the newly
//! authenticated user's id. The `pendingQR` slot is always emptied, but a
//! failed replay is parked in the dead-letter slot for manual resubmission
//! rather than silently dropped. Failures never block the login flow.

use crate::api::ApiClient;
use crate::error::Result;
use crate::store::KvStore;

/// What reconciliation did, for user-facing reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No pending scan was stored.
    Nothing,
    /// The deferred check-in was accepted by the server.
    Submitted(String),
    /// The replay failed; the record moved to the dead-letter slot.
    DeadLettered(String),
}

/// Replays a stored pending scan after login.
pub struct Reconciler<'a> {
    api: &'a ApiClient,
    store: &'a KvStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a ApiClient, store: &'a KvStore) -> Self {
        Self { api, store }
    }

    /// Replay the pending scan, if any, for the given user.
    ///
    /// Exactly one submission is attempted; the pending slot is cleared
    /// regardless of the verdict. Only storage faults are errors.
    pub async fn run(&self, user_id: i64) -> Result<ReconcileOutcome> {
        let Some(pending) = self.store.pending_scan()? else {
            return Ok(ReconcileOutcome::Nothing);
        };

        let verdict = self.api.submit_attendance(&pending.payload, user_id).await;
        self.store.clear_pending_scan()?;

        match verdict {
            Ok(message) => {
                tracing::info!(id = %pending.payload.id, "pending scan reconciled");
                Ok(ReconcileOutcome::Submitted(message))
            }
            Err(e) => {
                tracing::warn!(
                    id = %pending.payload.id,
                    error = %e,
                    "pending scan replay failed; parked in dead letter"
                );
                self.store.set_dead_letter(&pending)?;
                Ok(ReconcileOutcome::DeadLettered(e.to_string()))
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
