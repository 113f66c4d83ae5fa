//! Account, checkout, order history and payment over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::SecretString;
use shopfront_client::api::{Address, ApiError, Registration};
use shopfront_client::checkout::{CheckoutError, place_order};
use shopfront_core::{CustomerId, Email, OrderId, OrderStatus, Price};
use shopfront_integration_tests::{CUSTOMER, EMAIL, FakeBackend, PASSWORD};

fn email(raw: &str) -> Email {
    Email::parse(raw).unwrap()
}

#[tokio::test]
async fn test_login_with_bad_password_is_unauthorized() {
    let backend = FakeBackend::spawn().await;
    let api = backend.client();

    let err = api
        .login(&email(EMAIL), &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(api.session().current().is_none());
}

#[tokio::test]
async fn test_register_then_login() {
    let backend = FakeBackend::spawn().await;
    let api = backend.client();
    let registration = Registration {
        name: "Grace Hopper".to_string(),
        email: email("grace@example.com"),
        password: SecretString::from("cobol-1959"),
        phone_number: "555-0100".to_string(),
        address: Address {
            street: "1 Navy Yard".to_string(),
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            zip_code: "22202".to_string(),
        },
    };

    api.register(&registration).await.unwrap();
    let err = api.register(&registration).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 409, .. }));

    let session = api
        .login(&email("grace@example.com"), &SecretString::from("cobol-1959"))
        .await
        .unwrap();
    assert_eq!(api.session().current().unwrap().customer_id, session.customer_id);
}

#[tokio::test]
async fn test_logout_returns_to_anonymous() {
    let backend = FakeBackend::spawn().await;
    let api = backend.client();
    api.login(&email(EMAIL), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    let ended = api.logout().unwrap();
    assert_eq!(ended.customer_id, CustomerId::new(CUSTOMER));
    assert!(api.logout().is_none());
    assert!(api.session().bearer_token().is_none());
}

#[tokio::test]
async fn test_checkout_sends_idempotency_key_and_clears_cart() {
    let backend = FakeBackend::spawn().await;
    backend.seed_cart(CUSTOMER, "p-mug", 2);
    backend.seed_cart(CUSTOMER, "p-towel", 1);
    let (api, cart) = backend.cart();
    api.login(&email(EMAIL), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    let order = place_order(&cart, &api).await.unwrap();

    assert_eq!(order.total_price, Price::from_cents(850 * 2 + 600));
    assert_eq!(order.order_items.len(), 2);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(cart.is_empty());
    assert_eq!(backend.cart_quantity(CUSTOMER, "p-mug"), 0);

    let order_requests = backend.requests_to(&format!("order/{CUSTOMER}"));
    assert_eq!(order_requests.len(), 1);
    let key = order_requests[0].idempotency_key.as_deref().unwrap();
    assert_eq!(uuid::Uuid::parse_str(key).unwrap().get_version_num(), 4);
}

#[tokio::test]
async fn test_checkout_refuses_empty_cart() {
    let backend = FakeBackend::spawn().await;
    let (api, cart) = backend.cart();
    api.login(&email(EMAIL), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    let err = place_order(&cart, &api).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(backend.order_count(), 0);
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let backend = FakeBackend::spawn().await;
    let (api, cart) = backend.cart();
    let mug = api
        .get_product(&shopfront_core::ProductId::new("p-mug"))
        .await
        .unwrap();
    cart.add_one(&mug).await.unwrap();

    let err = place_order(&cart, &api).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NotSignedIn));
    assert!(!cart.is_empty());
    assert!(backend.requests_to("order").is_empty());
}

#[tokio::test]
async fn test_order_history_and_payment() {
    let backend = FakeBackend::spawn().await;
    let (api, cart) = backend.cart();
    api.login(&email(EMAIL), &SecretString::from(PASSWORD))
        .await
        .unwrap();
    let customer = CustomerId::new(CUSTOMER);

    backend.seed_cart(CUSTOMER, "p-mug", 1);
    let first = place_order(&cart, &api).await.unwrap();
    backend.seed_cart(CUSTOMER, "p-teapot", 1);
    let second = place_order(&cart, &api).await.unwrap();

    let page = api.order_history(&customer, 0).await.unwrap();
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.number, 0);
    assert!(page.last);
    assert_eq!(page.content[0].id, second.id);
    assert_eq!(page.content[1].id, first.id);
    let history = backend.requests_to("order/customer");
    assert_eq!(history[0].query.as_deref(), Some("page=0"));

    api.pay(&first.id).await.unwrap();
    let page = api.order_history(&customer, 0).await.unwrap();
    assert_eq!(page.content[1].status, OrderStatus::Paid);
    assert_eq!(page.content[0].status, OrderStatus::Pending);

    let err = api.pay(&OrderId::new("ord-404")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
