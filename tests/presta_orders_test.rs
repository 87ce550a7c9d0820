//! The manager-only feed of today's web shop orders.

mod common;

use assert_matches::assert_matches;
use common::TestBackend;
use orderflow::{
    auth::{ensure_access, Page},
    errors::ClientError,
    models::{OrderStatus, Participant, Role},
};
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

fn feed() -> serde_json::Value {
    json!([
        {
            "id": 1204, "reference": "QWERTYUIO", "date": "2024-05-02 09:14:00",
            "status": "5", "customer_name": "Jeanne Roux", "total_paid": "84.000000",
            "payment_method": "Carte bancaire",
            "products": [
                {"product_name": "Lampe de bureau", "quantity": "2", "price": "24.500000"},
                {"product_name": "Ampoule", "quantity": 5, "price": 7}
            ],
            "internal_order_id": 31, "internal_order_status": "CONTROLLED",
            "handlers": {
                "creator": {
                    "user": {"id": 2, "username": "lea", "full_name": "Léa Petit", "role": "AGENT"},
                    "timestamp": "2024-05-02T09:20:00+00:00"
                },
                "preparer": {
                    "user": {"id": 3, "username": "paul", "full_name": "", "role": "AGENT"},
                    "timestamp": "2024-05-02T09:41:00+00:00"
                },
                "controller": {
                    "user": {"id": 7, "username": "marie", "full_name": "Marie Noël", "role": "MANAGER"},
                    "timestamp": "2024-05-02T10:02:00+00:00"
                },
                "packer": {"user": null, "timestamp": null}
            }
        },
        {
            "id": "1205", "reference": "ZXCVBNMLK", "date": "2024-05-02 11:30:00",
            "status": "1", "customer_name": "N/A", "total_paid": "12.9",
            "payment_method": "Virement", "products": [],
            "internal_order_id": null, "internal_order_status": null, "handlers": {}
        }
    ])
}

#[tokio::test]
async fn managers_see_todays_shop_orders_with_their_handlers() {
    let backend = TestBackend::logged_in(Role::Manager).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/presta-orders/"))
        .and(header("authorization", "Bearer access-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
        .expect(1)
        .mount(&backend.server)
        .await;

    let orders = backend.presta().todays_orders().await.unwrap();

    assert_eq!(orders.len(), 2);
    let tracked = &orders[0];
    assert_eq!(tracked.id, "1204");
    assert_eq!(tracked.status_label(), "Contrôlée");
    assert_eq!(tracked.total_display(), "84.00 €");
    assert_eq!(tracked.products[1].quantity, "5");
    assert_eq!(tracked.internal_order_status, Some(OrderStatus::Controlled));

    let preparer = tracked.handler(Participant::Preparer).unwrap();
    assert_eq!(preparer.user.as_ref().unwrap().display_name(), "paul");
    let controller = tracked.handler(Participant::Controller).unwrap();
    assert_eq!(controller.user.as_ref().unwrap().role, Role::Manager);
    assert!(tracked.handler(Participant::Packer).unwrap().user.is_none());

    let untracked = &orders[1];
    assert!(!untracked.is_tracked());
    assert_eq!(untracked.status_label(), "En attente");
    assert!(untracked.handler(Participant::Creator).is_none());
}

#[tokio::test]
async fn an_empty_day_is_an_empty_list() {
    let backend = TestBackend::logged_in(Role::Manager).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/presta-orders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend.server)
        .await;

    assert!(backend.presta().todays_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn shop_outage_surfaces_the_backend_message() {
    let backend = TestBackend::logged_in(Role::Manager).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/presta-orders/"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": "Erreur lors de la connexion à l'API PrestaShop: 503"
        })))
        .mount(&backend.server)
        .await;

    let err = backend.presta().todays_orders().await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "Erreur lors de la connexion à l'API PrestaShop: 503"
    );
}

#[tokio::test]
async fn backend_refusal_for_non_managers_is_reported() {
    let backend = TestBackend::logged_in(Role::SuperAgent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/presta-orders/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": "Accès restreint aux managers"})),
        )
        .mount(&backend.server)
        .await;

    let err = backend.presta().todays_orders().await.unwrap_err();
    assert_eq!(err.user_message(), "Accès restreint aux managers");
}

#[test]
fn the_page_is_manager_only() {
    assert_matches!(
        ensure_access(Role::SuperAgent, Page::PrestaOrders),
        Err(ClientError::Forbidden(_))
    );
    assert_matches!(
        ensure_access(Role::Agent, Page::PrestaOrders),
        Err(ClientError::Forbidden(_))
    );
    assert!(ensure_access(Role::Manager, Page::PrestaOrders).is_ok());
}
