//! Backend REST API collaborator.
//!
//! The backend is a black box to the state core; this module defines the
//! slice of it the stores consume. [`AuthApi`] is the seam: production code
//! uses the reqwest-backed [`HttpAuthApi`], tests substitute a scripted fake.
//!
//! # Endpoints
//!
//! - `GET /auth/check` - verify the current token, returns the user
//! - `POST /auth/login` - shopper credential exchange, returns token + user
//! - `POST /auth/admin-login` - back-office credential exchange
//! - `POST /auth/check-role` - resolve the role registered for an email
//! - `POST /auth/register` - create a shopper account
//!
//! Authenticated requests carry `Authorization: Bearer <token>`, attached
//! uniformly by the HTTP implementation, never per-call.

mod http;

pub use http::HttpAuthApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peddler_core::{Email, Role};

use crate::models::User;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: unreachable host, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape this client expects.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The token was rejected (401/403). Terminal for the current session.
    #[error("unauthorized")]
    Unauthorized,

    /// The resource or account does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend understood the request and declined it inside a success
    /// envelope (e.g. registration with an email already taken).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, or the raw body.
        message: String,
    },
}

impl ApiError {
    /// Whether this is an expected rejection (the backend understood the
    /// request and said no) rather than a transport or server failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::Unauthorized | Self::NotFound(_) | Self::Rejected(_) => true,
            Self::Status { status, .. } => *status >= 400 && *status < 500,
            Self::Http(_) | Self::Parse(_) => false,
        }
    }
}

/// Successful credential exchange: the bearer token and the user it
/// identifies.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token to persist and attach to later requests.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Data for creating a shopper account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: Email,
    pub role: Role,
}

/// The authentication slice of the backend API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Verify the persisted token and return the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an expired or revoked token,
    /// [`ApiError::Http`] when the backend is unreachable.
    async fn check(&self) -> Result<User, ApiError>;

    /// Exchange shopper credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] or [`ApiError::NotFound`] for
    /// rejected credentials.
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError>;

    /// Exchange back-office credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] or [`ApiError::NotFound`] for
    /// rejected credentials.
    async fn admin_login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError>;

    /// Resolve which role an email is registered under.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when no account exists for the email.
    async fn check_role(&self, email: &Email) -> Result<Role, ApiError>;

    /// Create a shopper account.
    ///
    /// # Errors
    ///
    /// Returns an expected rejection when the email is already registered.
    async fn register(&self, registration: &Registration, password: &str)
    -> Result<(), ApiError>;
}
