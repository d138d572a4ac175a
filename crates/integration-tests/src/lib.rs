//! Integration tests for Peddler.
//!
//! The scenarios here compose both state containers the way the running
//! front-end does: one storage scope shared by the cart and session stores,
//! with the backend played by a scripted fake.
//!
//! # Test Categories
//!
//! - `cart_persistence` - cart durability across store instances
//! - `session_flows` - login surfaces, session verification, logout fencing
//! - `checkout_and_logout` - cross-store behavior around checkout and logout

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use peddler_client::api::{ApiError, AuthApi, LoginResponse, Registration};
use peddler_client::cart::CartStore;
use peddler_client::models::{ProductSnapshot, User};
use peddler_client::session::SessionStore;
use peddler_client::storage::MemoryStorage;
use peddler_core::{Email, ProductId, Role, UserId};

/// Scripted stand-in for the backend authentication API.
///
/// Holds one account. Credential checks compare against the scripted
/// password; the fake deliberately accepts either login surface so tests can
/// prove the state layer - not the backend - enforces role gating.
pub struct FakeAuthApi {
    user: User,
    password: String,
    token: String,
    /// When set, `check` responses wait on this gate.
    pub check_gate: Option<Arc<Notify>>,
    /// When true, every call fails with a 500.
    pub server_down: bool,
    registrations: Mutex<Vec<Registration>>,
}

impl FakeAuthApi {
    /// An account registered under `role` with the given password.
    #[must_use]
    pub fn account(role: Role, password: &str) -> Self {
        Self {
            user: User {
                id: UserId::new("u1"),
                full_name: "Sam Shopper".to_owned(),
                email: email("sam@example.com"),
                role,
            },
            password: password.to_owned(),
            token: format!("tok-{role}"),
            check_gate: None,
            server_down: false,
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// The registrations the fake accepted, in call order.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn guard(&self) -> Result<(), ApiError> {
        if self.server_down {
            return Err(ApiError::Status {
                status: 500,
                message: "internal server error".to_owned(),
            });
        }
        Ok(())
    }

    fn exchange(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        self.guard()?;
        if *email == self.user.email && password == self.password {
            Ok(LoginResponse {
                token: self.token.clone(),
                user: self.user.clone(),
            })
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn check(&self) -> Result<User, ApiError> {
        if let Some(gate) = &self.check_gate {
            gate.notified().await;
        }
        self.guard()?;
        Ok(self.user.clone())
    }

    async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        self.exchange(email, password)
    }

    async fn admin_login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        self.exchange(email, password)
    }

    async fn check_role(&self, email: &Email) -> Result<Role, ApiError> {
        self.guard()?;
        if *email == self.user.email {
            Ok(self.user.role)
        } else {
            Err(ApiError::NotFound("no such account".to_owned()))
        }
    }

    async fn register(&self, registration: &Registration, _password: &str) -> Result<(), ApiError> {
        self.guard()?;
        self.registrations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(registration.clone());
        Ok(())
    }
}

/// Install a subscriber so store tracing lands in captured test output.
///
/// Idempotent: only the first caller installs, later calls are no-ops, so
/// every test can call this unconditionally. Filter defaults to `debug` and
/// can be overridden through `RUST_LOG`.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// One storage scope with both stores attached, as the application wires it.
pub struct TestContext {
    pub cart: CartStore,
    pub session: SessionStore,
    pub storage: Arc<MemoryStorage>,
    pub api: Arc<FakeAuthApi>,
}

impl TestContext {
    #[must_use]
    pub fn new(api: FakeAuthApi) -> Self {
        init_tracing();
        let storage = Arc::new(MemoryStorage::new());
        let api = Arc::new(api);
        Self {
            cart: CartStore::new(storage.clone()),
            session: SessionStore::new(api.clone(), storage.clone()),
            storage,
            api,
        }
    }
}

/// Parse a known-good email.
///
/// # Panics
///
/// Panics if the literal is not a valid address (test bug).
#[must_use]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).expect("valid email literal")
}

/// A camera product snapshot in the given color.
#[must_use]
pub fn camera(color: Option<&str>) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new("p1"),
        name: "Camera".to_owned(),
        price: Decimal::from(699),
        image: Some("camera.jpg".to_owned()),
        selected_color: color.map(str::to_owned),
    }
}
