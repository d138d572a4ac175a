//! Session lifecycle scenarios: role-gated login, startup verification,
//! logout fencing.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Notify;

use peddler_client::models::{Area, Redirect};
use peddler_client::session::{CheckOutcome, Credentials, SessionError, SessionState};
use peddler_client::storage::{KeyValueStorage, keys};
use peddler_core::Role;
use peddler_integration_tests::{FakeAuthApi, TestContext, email};

fn sam() -> Credentials {
    Credentials::new(email("sam@example.com"), "hunter2".to_owned())
}

#[tokio::test]
async fn user_login_round_trip() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));

    let outcome = ctx
        .session
        .login(&sam(), Role::User)
        .await
        .expect("login succeeds");
    assert_eq!(outcome.redirect, Redirect::UserDashboard);
    assert_eq!(outcome.user.role, Role::User);
    assert_eq!(
        ctx.storage.get(keys::AUTH_TOKEN).expect("read token"),
        Some("tok-user".to_owned())
    );
    assert_eq!(
        ctx.storage.get(keys::AUTH_TYPE).expect("read auth type"),
        Some("user".to_owned())
    );
}

#[tokio::test]
async fn admin_account_cannot_use_shopper_surface() {
    // The fake backend would happily exchange the credentials; only the
    // role resolution in the store stands in the way.
    let ctx = TestContext::new(FakeAuthApi::account(Role::Admin, "hunter2"));

    let err = ctx
        .session
        .login(&sam(), Role::User)
        .await
        .expect_err("cross-surface login must fail");
    assert!(matches!(err, SessionError::AccountNotFound));
    assert_eq!(ctx.storage.get(keys::AUTH_TOKEN).expect("read token"), None);
}

#[tokio::test]
async fn shopper_account_cannot_use_admin_surface() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));

    let err = ctx
        .session
        .login(&sam(), Role::Admin)
        .await
        .expect_err("cross-surface login must fail");
    // Identical failure in both directions: nothing to enumerate.
    assert_eq!(err.to_string(), "account not found");
}

#[tokio::test]
async fn wrong_password_is_indistinguishable_from_absent_account() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));

    let wrong_password = Credentials::new(email("sam@example.com"), "wrong".to_owned());
    let err1 = ctx
        .session
        .login(&wrong_password, Role::User)
        .await
        .expect_err("wrong password");

    let absent = Credentials::new(email("nobody@example.com"), "hunter2".to_owned());
    let err2 = ctx
        .session
        .login(&absent, Role::User)
        .await
        .expect_err("absent account");

    assert_eq!(err1.to_string(), err2.to_string());
}

#[tokio::test]
async fn backend_outage_surfaces_generic_network_error() {
    let mut api = FakeAuthApi::account(Role::User, "hunter2");
    api.server_down = true;
    let ctx = TestContext::new(api);

    let err = ctx
        .session
        .login(&sam(), Role::User)
        .await
        .expect_err("login against downed backend");
    assert!(matches!(err, SessionError::Network(_)));
    assert_eq!(err.to_string(), "something went wrong, please try again");
}

#[tokio::test]
async fn startup_check_restores_session_from_persisted_token() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));
    ctx.storage
        .set(keys::AUTH_TOKEN, "tok-user")
        .expect("seed token");

    let outcome = ctx.session.check_session(Area::Storefront).await;
    assert!(matches!(outcome, CheckOutcome::Authenticated(_)));
    assert!(ctx.session.current_user().is_some());
    assert!(!ctx.session.is_checking());
}

#[tokio::test]
async fn failed_check_redirects_to_the_area_login() {
    let mut api = FakeAuthApi::account(Role::Admin, "hunter2");
    api.server_down = true;
    let ctx = TestContext::new(api);
    ctx.storage
        .set(keys::AUTH_TOKEN, "tok-admin")
        .expect("seed token");

    let outcome = ctx.session.check_session(Area::Admin).await;
    assert_eq!(outcome, CheckOutcome::SignedOut(Redirect::AdminLogin));
    assert_eq!(ctx.storage.get(keys::AUTH_TOKEN).expect("read token"), None);
}

#[tokio::test]
async fn logout_is_the_last_writer() {
    let gate = Arc::new(Notify::new());
    let mut api = FakeAuthApi::account(Role::User, "hunter2");
    api.check_gate = Some(gate.clone());
    let ctx = TestContext::new(api);
    ctx.storage
        .set(keys::AUTH_TOKEN, "tok-user")
        .expect("seed token");
    ctx.storage
        .set(keys::AUTH_TYPE, "user")
        .expect("seed auth type");

    let session = ctx.session.clone();
    let check = tokio::spawn(async move { session.check_session(Area::Storefront).await });

    // Let the check reach the gated backend response, then log out.
    tokio::task::yield_now().await;
    ctx.session.logout();

    // The verify response lands after logout and must be discarded.
    gate.notify_one();
    let outcome = check.await.expect("check task");

    assert_eq!(outcome, CheckOutcome::NoSession);
    assert_eq!(ctx.session.state(), SessionState::Anonymous);
    assert_eq!(ctx.storage.get(keys::AUTH_TOKEN).expect("read token"), None);
    assert_eq!(
        ctx.storage.get(keys::AUTH_TYPE).expect("read auth type"),
        None
    );
}

#[tokio::test]
async fn public_registration_cannot_create_admins() {
    let api = FakeAuthApi::account(Role::User, "hunter2");
    let ctx = TestContext::new(api);

    let registration = peddler_client::api::Registration {
        full_name: "Wannabe Admin".to_owned(),
        email: email("wannabe@example.com"),
        role: Role::Admin,
    };
    let err = ctx
        .session
        .register(&registration, &SecretString::from("hunter2".to_owned()))
        .await
        .expect_err("admin self-registration must fail");
    assert!(matches!(err, SessionError::Validation(_)));
    assert!(ctx.api.registrations().is_empty(), "no network call made");
}

#[tokio::test]
async fn shopper_registration_reaches_the_backend() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));

    let registration = peddler_client::api::Registration {
        full_name: "New Shopper".to_owned(),
        email: email("new@example.com"),
        role: Role::User,
    };
    ctx.session
        .register(&registration, &SecretString::from("hunter2".to_owned()))
        .await
        .expect("registration succeeds");

    let recorded = ctx.api.registrations();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded.first().expect("one registration").email,
        email("new@example.com")
    );
}
