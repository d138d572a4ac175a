//! Reqwest-backed implementation of the backend API client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use peddler_core::{Email, Role};

use crate::config::ClientConfig;
use crate::models::User;
use crate::storage::{KeyValueStorage, keys};

use super::{ApiError, AuthApi, LoginResponse, Registration};

// =============================================================================
// Request / Response bodies
// =============================================================================

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckRoleBody<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckRoleResponse {
    role: Role,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    #[serde(flatten)]
    registration: &'a Registration,
    password: &'a str,
}

/// Error payload the backend attaches to non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// =============================================================================
// HttpAuthApi
// =============================================================================

/// HTTP client for the backend authentication API.
///
/// The bearer token is read from persisted storage and attached to every
/// request that carries one - a single place, so no call site can forget
/// it.
#[derive(Clone)]
pub struct HttpAuthApi {
    inner: Arc<HttpAuthApiInner>,
}

struct HttpAuthApiInner {
    client: reqwest::Client,
    base_url: String,
    storage: Arc<dyn KeyValueStorage>,
}

impl HttpAuthApi {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpAuthApiInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_owned(),
                storage,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach the persisted bearer token, if one is held.
    ///
    /// A storage read failure downgrades the request to anonymous rather
    /// than failing it; the backend's 401 then drives the normal teardown.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.storage.get(keys::AUTH_TOKEN) {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted token, sending anonymous request");
                request
            }
        }
    }

    /// Send a request and decode the JSON response, mapping non-success
    /// statuses onto the error taxonomy.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_status(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Fold a non-success status and body into an [`ApiError`].
fn map_status(status: reqwest::StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ApiError::Unauthorized
        }
        reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            }
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self))]
    async fn check(&self) -> Result<User, ApiError> {
        let request = self.authorize(self.inner.client.get(self.endpoint("/auth/check")));
        let response: CheckResponse = self.execute(request).await?;
        debug!(user_id = %response.user.id, "Token verified");
        Ok(response.user)
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/login"))
            .json(&CredentialsBody {
                email: email.as_str(),
                password,
            });
        self.execute(request).await
    }

    #[instrument(skip(self, password))]
    async fn admin_login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/admin-login"))
            .json(&CredentialsBody {
                email: email.as_str(),
                password,
            });
        self.execute(request).await
    }

    #[instrument(skip(self))]
    async fn check_role(&self, email: &Email) -> Result<Role, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/check-role"))
            .json(&CheckRoleBody {
                email: email.as_str(),
            });
        let response: CheckRoleResponse = self.execute(request).await?;
        Ok(response.role)
    }

    #[instrument(skip(self, password))]
    async fn register(
        &self,
        registration: &Registration,
        password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/register"))
            .json(&RegisterBody {
                registration,
                password,
            });
        let response: RegisterResponse = self.execute(request).await?;

        if response.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                "registration was not accepted".to_owned(),
            ))
        }
    }
}
