//! Token Lifecycle Manager
//!
//! Owns the session credential, renews it ahead of expiry in a supervised
//! background task, and hands the current token to every outgoing call.
//!
//! # Renewal Schedule
//!
//! ```text
//!   issued ──────────────── refresh_at ──── expires_at
//!                           (exp - lead)
//!
//!   wait <= 0          → min_delay     (1 s)
//!   wait > max_wait    → ceiling_delay (10 min)
//!   expiry unknown     → ceiling_delay
//!   renewal failed     → retry_delay (30 s), then recompute
//! ```
//!
//! The loop observes cancellation at every sleep and during the auth call.
//! A failed renewal never touches the stored credential; the last good
//! token stays in use until a renewal succeeds.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{GatewayError, TradingGateway};
use crate::domain::credential::{AccessToken, Credential, claims_expiry};
use crate::infrastructure::metrics;

// =============================================================================
// Errors
// =============================================================================

/// Authentication failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The gateway refused the secret or the call failed.
    #[error("auth request failed: {0}")]
    Rejected(#[source] GatewayError),

    /// The auth call did not complete in time.
    #[error("auth request timed out after {0:?}")]
    Timeout(Duration),
}

impl AuthError {
    /// Check whether a later attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected(e) => e.is_retryable(),
            Self::Timeout(_) => true,
        }
    }
}

// =============================================================================
// Refresh Policy
// =============================================================================

/// Timing constants for credential renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// How long before expiry to renew.
    pub lead: Duration,
    /// Delay used when the renewal point has already passed.
    pub min_delay: Duration,
    /// Longest wait trusted from a token's expiry.
    pub max_wait: Duration,
    /// Delay used when the expiry is unknown or beyond `max_wait`.
    pub ceiling_delay: Duration,
    /// Delay after a failed renewal.
    pub retry_delay: Duration,
    /// Lifetime assumed for tokens without readable claims.
    pub fallback_lifetime: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            lead: Duration::from_secs(2 * 60),
            min_delay: Duration::from_secs(1),
            max_wait: Duration::from_secs(10 * 60 * 60),
            ceiling_delay: Duration::from_secs(10 * 60),
            retry_delay: Duration::from_secs(30),
            fallback_lifetime: Duration::from_secs(50 * 60),
        }
    }
}

impl RefreshPolicy {
    /// How long to wait before the next renewal attempt.
    #[must_use]
    pub fn refresh_delay(&self, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        let Some(expires_at) = expires_at else {
            return self.ceiling_delay;
        };

        let refresh_at = expires_at
            .checked_sub_signed(to_time_delta(self.lead))
            .unwrap_or(expires_at);
        let Ok(wait) = (refresh_at - now).to_std() else {
            return self.min_delay;
        };

        if wait.is_zero() {
            self.min_delay
        } else if wait > self.max_wait {
            self.ceiling_delay
        } else {
            wait
        }
    }

    /// Expiry assumed for a token issued at `now` without readable claims.
    #[must_use]
    pub fn fallback_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(to_time_delta(self.fallback_lifetime))
            .unwrap_or(now)
    }
}

/// Delay before the next renewal under the default policy.
#[must_use]
pub fn refresh_delay(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    RefreshPolicy::default().refresh_delay(expires_at, now)
}

fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::zero())
}

// =============================================================================
// Shared State
// =============================================================================

#[derive(Debug, Clone)]
struct Session {
    credential: Credential,
    last_refresh: Option<DateTime<Utc>>,
}

struct TokenState {
    gateway: Arc<dyn TradingGateway>,
    secret: String,
    policy: RefreshPolicy,
    auth_timeout: Duration,
    session: RwLock<Session>,
}

impl TokenState {
    /// Exchange the secret for a fresh credential.
    async fn issue(
        gateway: &dyn TradingGateway,
        secret: &str,
        policy: &RefreshPolicy,
        auth_timeout: Duration,
    ) -> Result<Credential, AuthError> {
        let token = tokio::time::timeout(auth_timeout, gateway.auth(secret))
            .await
            .map_err(|_| AuthError::Timeout(auth_timeout))?
            .map_err(AuthError::Rejected)?;

        let expires_at = match claims_expiry(&token) {
            Ok(expires_at) => expires_at,
            Err(e) => {
                let assumed = policy.fallback_expiry(Utc::now());
                tracing::warn!(
                    error = %e,
                    fallback_secs = policy.fallback_lifetime.as_secs(),
                    "Could not read token expiry, assuming default lifetime"
                );
                assumed
            }
        };

        Ok(Credential::new(AccessToken::new(token), expires_at))
    }

    async fn renew(&self) -> Result<Credential, AuthError> {
        Self::issue(
            self.gateway.as_ref(),
            &self.secret,
            &self.policy,
            self.auth_timeout,
        )
        .await
    }

    fn install(&self, credential: Credential) {
        let mut session = self.session.write();
        session.credential = credential;
        session.last_refresh = Some(Utc::now());
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.session.read().credential.expires_at()
    }
}

// =============================================================================
// Token Manager
// =============================================================================

/// Keeps a valid access token available for the lifetime of a session.
///
/// Reads never block on renewal: the write lock is held only while the new
/// credential is swapped in.
pub struct TokenManager {
    state: Arc<TokenState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.state.expires_at())
            .field("policy", &self.state.policy)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Authenticate and create a manager holding the issued credential.
    ///
    /// The background renewal task is not started; call
    /// [`start_background_refresh`](Self::start_background_refresh).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the gateway rejects the secret or the call
    /// exceeds `auth_timeout`.
    pub async fn authenticate(
        gateway: Arc<dyn TradingGateway>,
        secret: impl Into<String>,
        policy: RefreshPolicy,
        auth_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let secret = secret.into();
        let credential =
            TokenState::issue(gateway.as_ref(), &secret, &policy, auth_timeout).await?;

        tracing::info!(expires_at = %credential.expires_at(), "Authentication successful");

        Ok(Self {
            state: Arc::new(TokenState {
                gateway,
                secret,
                policy,
                auth_timeout,
                session: RwLock::new(Session {
                    credential,
                    last_refresh: None,
                }),
            }),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        })
    }

    /// Spawn the renewal loop. No-op if it is already running.
    pub fn start_background_refresh(&self) {
        let mut task = self.task.lock();
        if task.is_some() || self.cancel.is_cancelled() {
            return;
        }

        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        *task = Some(tokio::spawn(run_refresh_loop(state, cancel)));
    }

    /// Check whether the renewal loop has been started and not shut down.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Current credential.
    #[must_use]
    pub fn current(&self) -> Credential {
        self.state.session.read().credential.clone()
    }

    /// Current access token.
    #[must_use]
    pub fn token(&self) -> AccessToken {
        self.state.session.read().credential.token().clone()
    }

    /// Expiry of the current credential.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.state.expires_at()
    }

    /// Time of the last successful background renewal.
    #[must_use]
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.session.read().last_refresh
    }

    /// Renewal timing in use.
    #[must_use]
    pub fn policy(&self) -> RefreshPolicy {
        self.state.policy
    }

    /// Stop the renewal loop and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self.task.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Token refresh task ended abnormally");
        }
    }
}

impl Drop for TokenManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// Renewal Loop
// =============================================================================

async fn run_refresh_loop(state: Arc<TokenState>, cancel: CancellationToken) {
    tracing::info!("Background token refresh started");

    loop {
        let delay = state
            .policy
            .refresh_delay(Some(state.expires_at()), Utc::now());
        tracing::debug!(delay_secs = delay.as_secs_f64(), "Next token refresh scheduled");

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        let outcome = tokio::select! {
            () = cancel.cancelled() => break,
            outcome = state.renew() => outcome,
        };

        match outcome {
            Ok(credential) => {
                let expires_at = credential.expires_at();
                state.install(credential);
                metrics::record_token_refresh(true);
                tracing::info!(expires_at = %expires_at, "Token refreshed");
            }
            Err(e) => {
                metrics::record_token_refresh(false);
                tracing::error!(
                    error = %e,
                    retry_secs = state.policy.retry_delay.as_secs(),
                    "Token refresh failed, retrying"
                );

                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(state.policy.retry_delay) => {}
                }
            }
        }
    }

    tracing::info!("Background token refresh stopped");
}

// =============================================================================
// Tests
// =============================================================================
