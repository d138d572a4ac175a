//! Cross-store behavior: checkout clears the cart, logout does not.

use peddler_client::session::Credentials;
use peddler_client::storage::{KeyValueStorage, keys};
use peddler_core::{ProductId, Role};
use peddler_integration_tests::{FakeAuthApi, TestContext, camera, email};

#[tokio::test]
async fn checkout_success_clears_cart_but_keeps_session() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));
    let credentials = Credentials::new(email("sam@example.com"), "hunter2".to_owned());
    ctx.session
        .login(&credentials, Role::User)
        .await
        .expect("login succeeds");

    ctx.cart.add_line(camera(Some("black")), 2);
    ctx.cart.add_line(camera(Some("silver")), 1);
    assert_eq!(ctx.cart.count(), 3);

    // Checkout succeeded upstream; the UI resets the cart.
    ctx.cart.clear();

    assert!(ctx.cart.is_empty());
    assert_eq!(
        ctx.storage.get(keys::CART).expect("read cart"),
        Some("[]".to_owned())
    );
    assert!(ctx.session.current_user().is_some(), "session untouched");
}

#[tokio::test]
async fn logout_keeps_cart() {
    // Logout leaves the cart intact so a guest cart survives account
    // switches. A product decision; this test pins the behavior down.
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));
    let credentials = Credentials::new(email("sam@example.com"), "hunter2".to_owned());
    ctx.session
        .login(&credentials, Role::User)
        .await
        .expect("login succeeds");

    ctx.cart.add_line(camera(Some("black")), 2);
    ctx.session.logout();

    assert_eq!(ctx.cart.count(), 2);
    assert!(
        ctx.storage
            .get(keys::CART)
            .expect("read cart")
            .is_some(),
        "persisted cart survives logout"
    );
    assert_eq!(ctx.storage.get(keys::AUTH_TOKEN).expect("read token"), None);
}

#[tokio::test]
async fn badge_subscription_tracks_cart_across_surfaces() {
    let ctx = TestContext::new(FakeAuthApi::account(Role::User, "hunter2"));
    let mut badge = ctx.cart.subscribe_count();

    // Product listing adds, cart page edits, checkout clears; the nav badge
    // sees each step without polling.
    ctx.cart.add_line(camera(None), 1);
    assert_eq!(*badge.borrow_and_update(), 1);

    ctx.cart.set_quantity(&ProductId::new("p1"), None, 4);
    assert_eq!(*badge.borrow_and_update(), 4);

    ctx.cart.clear();
    assert_eq!(*badge.borrow_and_update(), 0);
}
