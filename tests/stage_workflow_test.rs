//! Stage boards, transitions and order administration against a mock backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{order_json, TestBackend};
use orderflow::{
    config::AppConfig,
    errors::ClientError,
    models::{DateFilter, NewOrder, Role, Stage, TransitionPayload},
    queries::order_queries::EMPTY_REFERENCE_MESSAGE,
    views::{StageBoard, TransitionOutcome},
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, ResponseTemplate,
};

fn board(backend: &TestBackend, stage: Stage) -> StageBoard {
    StageBoard::from_config(stage, backend.orders(), &AppConfig::default()).unwrap()
}

#[tokio::test]
async fn reload_then_filter_by_reference() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/control/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            order_json(1, "A1", "CREATED"),
            order_json(2, "B2", "PREPARED"),
        ])))
        .mount(&backend.server)
        .await;

    let board = board(&backend, Stage::Control);
    assert_eq!(board.reload().await.unwrap(), 2);

    board.set_query("a");
    let snapshot = board.snapshot();
    let refs: Vec<&str> = snapshot.rows.iter().map(|o| o.reference.as_str()).collect();
    assert_eq!(refs, vec!["A1"]);
    assert!(snapshot.notice.is_none());
    assert!(snapshot.last_updated.is_some());

    board.set_query("zz");
    let snapshot = board.snapshot();
    assert!(snapshot.rows.is_empty());
    assert_eq!(
        snapshot.notice.as_deref(),
        Some("Aucune commande ne contient \"zz\" dans sa référence.")
    );
}

#[tokio::test]
async fn empty_queue_still_reports_an_unmatched_query() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/packing/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let board = board(&backend, Stage::Packing);
    assert_eq!(board.reload().await.unwrap(), 0);

    board.set_query(" CMD ");
    let snapshot = board.snapshot();
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.query, "CMD");
    assert_eq!(
        snapshot.notice.as_deref(),
        Some("Aucune commande ne contient \"CMD\" dans sa référence.")
    );
}

#[tokio::test]
async fn failed_transition_shows_backend_message_and_keeps_rows() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/preparation/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            order_json(1, "A1", "CREATED"),
            order_json(2, "B2", "CREATED"),
        ])))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/1/prepare/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "line_count required"})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let board = board(&backend, Stage::Preparation);
    board.reload().await.unwrap();
    let before = board.snapshot().rows;

    let outcome = board.transition(1, TransitionPayload::default()).await;

    assert_eq!(outcome.message(), Some("line_count required"));
    let after = board.snapshot();
    assert_eq!(after.alert.as_deref(), Some("line_count required"));
    assert_eq!(after.rows, before);
}

#[tokio::test]
async fn successful_transition_reloads_the_queue() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/preparation/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            order_json(1, "A1", "CREATED"),
            order_json(2, "B2", "CREATED"),
        ])))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/preparation/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([order_json(2, "B2", "CREATED")])),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/1/prepare/"))
        .and(body_json(json!({"line_count": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json(1, "A1", "PREPARED")))
        .expect(1)
        .mount(&backend.server)
        .await;

    let board = board(&backend, Stage::Preparation);
    board.reload().await.unwrap();

    let outcome = board.transition(1, TransitionPayload::with_line_count(4)).await;

    assert_matches!(outcome, TransitionOutcome::Completed(ref order) if order.id == 1);
    let snapshot = board.snapshot();
    assert_eq!(snapshot.loaded, 1);
    assert!(snapshot.alert.is_none());
}

#[tokio::test]
async fn line_count_is_refused_outside_preparation_without_a_request() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let board = board(&backend, Stage::Packing);
    let outcome = board.transition(3, TransitionPayload::with_line_count(2)).await;

    assert!(!outcome.is_completed());
    assert!(board.snapshot().alert.is_some());
}

#[tokio::test]
async fn newest_reload_wins_over_a_slow_older_one() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/control/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([order_json(1, "OLD-1", "PREPARED")]))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/control/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            order_json(2, "NEW-2", "PREPARED"),
            order_json(3, "NEW-3", "PREPARED"),
        ])))
        .mount(&backend.server)
        .await;

    let board = Arc::new(board(&backend, Stage::Control));
    let slow = {
        let board = board.clone();
        tokio::spawn(async move { board.reload().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(board.reload().await.unwrap(), 2);
    assert_matches!(slow.await.unwrap(), Err(ClientError::Superseded));

    tokio::time::sleep(Duration::from_millis(600)).await;
    let snapshot = board.snapshot();
    let refs: Vec<&str> = snapshot.rows.iter().map(|o| o.reference.as_str()).collect();
    assert_eq!(refs, vec!["NEW-2", "NEW-3"]);
    assert!(snapshot.alert.is_none());
}

#[tokio::test]
async fn creator_only_and_date_scope_the_preparation_list() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/preparation/"))
        .and(query_param("creator_only", "true"))
        .and(query_param("date", "2024-01-05"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([order_json(9, "MINE", "CREATED")])),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let board = board(&backend, Stage::Preparation)
        .with_creator_only(true)
        .with_date(Some(DateFilter::Day(day)));

    assert_eq!(board.reload().await.unwrap(), 1);
}

#[tokio::test]
async fn bulk_delete_posts_the_selected_ids() {
    let backend = TestBackend::logged_in(Role::Manager).await;
    Mock::given(method("POST"))
        .and(path("/api/orders/delete/"))
        .and(body_json(json!({"order_ids": [4, 5]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "2 commandes supprimées",
            "deleted_count": 2
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let result = backend.orders().delete_orders(vec![4, 5]).await.unwrap();
    assert_eq!(result.deleted_count, 2);

    let err = backend.orders().delete_orders(Vec::new()).await.unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
}

#[tokio::test]
async fn lookup_by_reference_trims_and_rejects_blank_input() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/reference/CMD-42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json(42, "CMD-42", "PACKED")))
        .expect(1)
        .mount(&backend.server)
        .await;

    let order = backend.orders().find_by_reference("  CMD-42 ").await.unwrap();
    assert_eq!(order.id, 42);

    let err = backend.orders().find_by_reference("   ").await.unwrap_err();
    assert_eq!(err.user_message(), EMPTY_REFERENCE_MESSAGE);
}

#[tokio::test]
async fn invalid_new_order_is_not_sent() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&backend.server)
        .await;

    let err = backend
        .orders()
        .create_order(NewOrder::new("", "C-1"))
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
}

#[tokio::test]
async fn field_errors_on_create_surface_with_the_field_name() {
    let backend = TestBackend::logged_in(Role::Agent).await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "reference": ["order with this reference already exists."]
        })))
        .mount(&backend.server)
        .await;

    let err = backend
        .orders()
        .create_order(NewOrder::new("CMD-1", "C-1"))
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "reference: order with this reference already exists."
    );
}
