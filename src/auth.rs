//! Login and logout flows.
//!
//! The session is an explicit value read from the store and handed to the
//! components that need it — no ambient global auth state. A successful
//! login persists the token and user profile (last write wins) and then
//! triggers the pending-scan reconciler exactly once.

use crate::api::ApiClient;
use crate::error::{Result, RollcallError};
use crate::model::User;
use crate::scan::{ReconcileOutcome, Reconciler};
use crate::store::KvStore;

/// Result of a successful login, including what reconciliation did.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub reconcile: ReconcileOutcome,
}

/// Drives the login/logout flows against the API and local store.
pub struct Authenticator<'a> {
    api: &'a ApiClient,
    store: &'a KvStore,
}

impl<'a> Authenticator<'a> {
    pub fn new(api: &'a ApiClient, store: &'a KvStore) -> Self {
        Self { api, store }
    }

    /// Log in, persist the session, and replay any pending scan.
    ///
    /// A rejected login leaves the store untouched. A failed reconciliation
    /// is reported in the outcome but never fails the login itself.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let resp = self.api.login(email, password).await?;

        if !resp.success {
            return Err(RollcallError::ServerRejected {
                status: 401,
                message: resp
                    .message
                    .unwrap_or_else(|| "invalid email or password".into()),
            });
        }

        let token = resp
            .token
            .ok_or_else(|| RollcallError::MalformedResponse("login success without token".into()))?;
        let user = resp
            .user
            .ok_or_else(|| RollcallError::MalformedResponse("login success without user".into()))?;

        self.store.set_session(&token, &user)?;
        tracing::info!(user_id = user.id, "logged in");

        let reconcile = Reconciler::new(self.api, self.store).run(user.id).await?;

        Ok(LoginOutcome { user, reconcile })
    }

    /// Delete the stored token and user profile.
    pub fn logout(&self) -> Result<()> {
        self.store.clear_session()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// The currently stored user, if any.
    pub fn current_user(&self) -> Result<Option<User>> {
        self.store.user()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
