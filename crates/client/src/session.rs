//! Authentication session store.
//!
//! Owns the authenticated-identity lifecycle:
//!
//! ```text
//! Anonymous -> Checking -> Authenticated -> Anonymous
//!                  \________________________/
//!              (verification failure or logout)
//! ```
//!
//! `Checking` is entered once, at startup, when a persisted token exists.
//! Login resolves the account's role before exchanging credentials so a
//! shopper account can never be issued an admin session through the wrong
//! surface (and vice versa). All expected rejections collapse into one
//! uniform failure - callers cannot distinguish a wrong password from a
//! wrong role from an absent account.
//!
//! Logging out never touches the cart; guest carts survive account
//! switches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use peddler_core::{Email, Role};

use crate::api::{ApiError, AuthApi, Registration};
use crate::models::{Area, Redirect, User};
use crate::storage::{KeyValueStorage, keys};

// =============================================================================
// Types
// =============================================================================

/// Login/registration credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Bundle an email and password.
    #[must_use]
    pub fn new(email: Email, password: impl Into<SecretString>) -> Self {
        Self {
            email,
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Current session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No user, no token.
    #[default]
    Anonymous,
    /// A persisted token exists and its verification is in flight.
    Checking,
    /// A verified user with a believed-valid token.
    Authenticated(User),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: User,
    /// Where the caller should navigate, based on the user's role.
    pub redirect: Redirect,
}

/// Result of the startup session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The persisted token is valid; the session is live.
    Authenticated(User),
    /// The token was rejected or unverifiable; the session was torn down
    /// and the caller should navigate to the given login surface.
    SignedOut(Redirect),
    /// There was no persisted token (or the check was superseded by a
    /// logout); nothing to do.
    NoSession,
}

/// Session operation failures, typed for inline rendering.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Uniform rejection for wrong password, wrong role, or absent account.
    /// Deliberately indistinct so login surfaces cannot be used to probe
    /// which emails exist under which role.
    #[error("account not found")]
    AccountNotFound,

    /// The caller's input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The backend was unreachable or failed; details are logged, the
    /// message stays generic.
    #[error("something went wrong, please try again")]
    Network(#[source] ApiError),
}

// =============================================================================
// SessionStore
// =============================================================================

/// The session state container.
///
/// Cheaply cloneable; clones share the same session. Construct one at
/// application start alongside the cart store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStorage>,
    cell: Mutex<StateCell>,
    /// Bumped by every session writer (login, logout). A `check_session`
    /// response that arrives after the generation moved on is discarded, so
    /// logout is always the last writer.
    generation: AtomicU64,
}

#[derive(Default)]
struct StateCell {
    state: SessionState,
    error: Option<String>,
}

impl SessionStore {
    /// Create a session store. The state starts `Anonymous`; call
    /// [`Self::check_session`] once at startup to verify a persisted token.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                api,
                storage,
                cell: Mutex::new(StateCell::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        match &self.lock().state {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Whether the startup verification is still in flight.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.lock().state == SessionState::Checking
    }

    /// Cheap token-presence check, for surfaces that only need "probably
    /// logged in" before the verification settles.
    #[must_use]
    pub fn has_persisted_token(&self) -> bool {
        matches!(self.inner.storage.get(keys::AUTH_TOKEN), Ok(Some(_)))
    }

    /// The last authentication failure message, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Clear the stored failure message.
    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Log in through the given surface (`Role::User` for the shop,
    /// `Role::Admin` for the back office).
    ///
    /// The account's registered role is resolved first; a cross-surface
    /// attempt fails without the credentials ever reaching the login
    /// endpoint and without a token being issued.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AccountNotFound`] for any expected rejection
    /// and [`SessionError::Network`] for transport or server failures.
    #[instrument(skip(self, credentials), fields(surface = %surface))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        surface: Role,
    ) -> Result<LoginOutcome, SessionError> {
        self.clear_error();

        let role = self
            .resolve_role(&credentials.email)
            .await
            .inspect_err(|e| self.record_error(e))?;

        if role != surface {
            // Uniform failure: do not reveal that the account exists under
            // another role.
            debug!("Login surface does not match account role");
            let err = SessionError::AccountNotFound;
            self.record_error(&err);
            return Err(err);
        }

        let password = credentials.password.expose_secret();
        let response = match surface {
            Role::User => self.inner.api.login(&credentials.email, password).await,
            Role::Admin => {
                self.inner
                    .api
                    .admin_login(&credentials.email, password)
                    .await
            }
        }
        .map_err(map_auth_failure)
        .inspect_err(|e| self.record_error(e))?;

        self.open_session(&response.token, response.user.clone());

        debug!(user_id = %response.user.id, "Login succeeded");
        Ok(LoginOutcome {
            redirect: Redirect::after_login(response.user.role),
            user: response.user,
        })
    }

    /// Verify a persisted token at startup.
    ///
    /// On any failure - expired, revoked, or unreachable backend - the
    /// session is torn down fully and the outcome carries the login surface
    /// for the area the caller is in. Never leaves the `Checking` state
    /// dangling.
    #[instrument(skip(self))]
    pub async fn check_session(&self, area: Area) -> CheckOutcome {
        // Token presence, the generation snapshot and the `Checking` write
        // share one critical section. Writers bump the generation and write
        // their state under the same lock, so a logout can never land between
        // the snapshot and the transition and leave `Checking` dangling.
        let generation = {
            let mut cell = self.lock();
            if !self.has_persisted_token() {
                return CheckOutcome::NoSession;
            }
            cell.state = SessionState::Checking;
            self.inner.generation.load(Ordering::SeqCst)
        };

        let result = self.inner.api.check().await;

        let mut cell = self.lock();
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            // A login or logout settled while the check was in flight; that
            // writer owns the state now.
            debug!("Session check superseded, discarding result");
            return match &cell.state {
                SessionState::Authenticated(user) => CheckOutcome::Authenticated(user.clone()),
                _ => CheckOutcome::NoSession,
            };
        }

        match result {
            Ok(user) => {
                debug!(user_id = %user.id, "Session check succeeded");
                cell.state = SessionState::Authenticated(user.clone());
                CheckOutcome::Authenticated(user)
            }
            Err(e) => {
                if e.is_rejection() {
                    debug!(error = %e, "Persisted token rejected, tearing down session");
                } else {
                    warn!(error = %e, "Session check failed, tearing down session");
                }
                cell.state = SessionState::Anonymous;
                drop(cell);
                self.clear_persisted_session();
                CheckOutcome::SignedOut(Redirect::login_for(area))
            }
        }
    }

    /// Log out unconditionally.
    ///
    /// Never blocks on the network. Clears the persisted token and auth
    /// type, resets the state to `Anonymous`, and fences off any in-flight
    /// session check. The cart is deliberately left untouched.
    pub fn logout(&self) -> Redirect {
        // Bump, state write and storage teardown form one critical section;
        // an interleaved session check sees either the full session or none
        // of it.
        let mut cell = self.lock();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        // Resolve the redirect before the role information is gone.
        let role = match &cell.state {
            SessionState::Authenticated(user) => Some(user.role),
            _ => None,
        }
        .or_else(|| self.persisted_auth_type())
        .unwrap_or(Role::User);

        cell.state = SessionState::Anonymous;
        cell.error = None;
        self.clear_persisted_session();
        drop(cell);

        debug!(%role, "Logged out");
        Redirect::after_logout(role)
    }

    /// Register a shopper account through the public surface.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for an admin self-registration
    /// attempt or a backend rejection (e.g. email already registered), and
    /// [`SessionError::Network`] for transport or server failures.
    #[instrument(skip(self, registration, password), fields(email = %registration.email))]
    pub async fn register(
        &self,
        registration: &Registration,
        password: &SecretString,
    ) -> Result<(), SessionError> {
        self.clear_error();

        if registration.role == Role::Admin {
            let err = SessionError::Validation(
                "admin accounts cannot be registered through this surface".to_owned(),
            );
            self.record_error(&err);
            return Err(err);
        }

        self.inner
            .api
            .register(registration, password.expose_secret())
            .await
            .map_err(|e| {
                if e.is_rejection() {
                    SessionError::Validation(rejection_message(&e))
                } else {
                    warn!(error = %e, "Registration failed");
                    SessionError::Network(e)
                }
            })
            .inspect_err(|e| self.record_error(e))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, StateCell> {
        self.inner
            .cell
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn resolve_role(&self, email: &Email) -> Result<Role, SessionError> {
        self.inner
            .api
            .check_role(email)
            .await
            .map_err(map_auth_failure)
    }

    /// Persist the token and auth type and transition to `Authenticated`,
    /// in one synchronous step so no partial session is observable.
    fn open_session(&self, token: &str, user: User) {
        let mut cell = self.lock();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        // Memory stays authoritative: a failed persist is logged, and the
        // next startup verification surfaces the missing token.
        if let Err(e) = self.inner.storage.set(keys::AUTH_TOKEN, token) {
            tracing::error!(error = %e, "Failed to persist auth token");
        }
        if let Err(e) = self
            .inner
            .storage
            .set(keys::AUTH_TYPE, &user.role.to_string())
        {
            tracing::error!(error = %e, "Failed to persist auth type");
        }

        cell.state = SessionState::Authenticated(user);
        cell.error = None;
    }

    fn clear_persisted_session(&self) {
        if let Err(e) = self.inner.storage.remove(keys::AUTH_TOKEN) {
            tracing::error!(error = %e, "Failed to clear persisted auth token");
        }
        if let Err(e) = self.inner.storage.remove(keys::AUTH_TYPE) {
            tracing::error!(error = %e, "Failed to clear persisted auth type");
        }
    }

    fn persisted_auth_type(&self) -> Option<Role> {
        self.inner
            .storage
            .get(keys::AUTH_TYPE)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
    }

    fn record_error(&self, error: &SessionError) {
        self.lock().error = Some(error.to_string());
    }
}

/// Fold an API failure into the session taxonomy: expected rejections become
/// the uniform not-found failure, everything else is a logged generic
/// network failure.
fn map_auth_failure(error: ApiError) -> SessionError {
    if error.is_rejection() {
        SessionError::AccountNotFound
    } else {
        warn!(error = %error, "Authentication request failed");
        SessionError::Network(error)
    }
}

fn rejection_message(error: &ApiError) -> String {
    match error {
        ApiError::NotFound(message)
        | ApiError::Rejected(message)
        | ApiError::Status { message, .. } => message.clone(),
        _ => "request was not accepted".to_owned(),
    }
}
