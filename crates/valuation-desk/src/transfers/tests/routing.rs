use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::api::ApiPath;
use crate::identity::Caller;
use crate::store::MemoryStore;
use crate::transfers::router::approve_handler;
use crate::transfers::{
    transfer_router, TransferFilter, TransferRepository, TransferRequest, TransferService,
};

fn app(
    service: TransferService<MemoryStore, RecordingNotifier>,
    caller: Caller,
) -> Router {
    transfer_router(Arc::new(service)).layer(Extension(caller))
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn request_route_returns_created_envelope() {
    let (service, _, _) = build_service();

    let response = app(service, owner())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/valuations/42/transfers",
            json!({ "to_user_id": 7, "reason": "moved to new team", "priority": "high" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "high");
    assert_eq!(body["data"]["to_user_id"], 7);
    assert_eq!(
        body["message"],
        "transfer request submitted and awaiting approval"
    );
}

#[tokio::test]
async fn request_route_reports_field_errors() {
    let (service, _, _) = build_service();

    let response = app(service, owner())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/valuations/42/transfers",
            json!({ "to_user_id": 7, "reason": "short" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], "validation_failed");
    assert!(body["errors"]["reason"].is_array());
}

#[tokio::test]
async fn missing_valuation_maps_to_not_found() {
    let (service, _, _) = build_service();

    let response = app(service, owner())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/valuations/9000/transfers",
            json!({ "to_user_id": 7, "reason": "moved to new team" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["code"], "not_found");
}

#[tokio::test]
async fn approve_handler_conflicts_on_second_call() {
    let (service, store, _) = build_service();
    let transfer = service
        .request(&owner(), VALUATION, TransferRequest::to(RECEIVER, "moved to new team"))
        .expect("transfer requested");
    let service = Arc::new(service);

    let first = approve_handler::<MemoryStore, RecordingNotifier>(
        State(service.clone()),
        Extension(receiver()),
        ApiPath(transfer.id.0),
        None,
    )
    .await
    .into_response();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(stored_valuation(&store, VALUATION).prepared_by, RECEIVER);

    let second = approve_handler::<MemoryStore, RecordingNotifier>(
        State(service),
        Extension(receiver()),
        ApiPath(transfer.id.0),
        None,
    )
    .await
    .into_response();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = read_json_body(second).await;
    assert_eq!(body["message"], "this transfer has already been handled");
}

#[tokio::test]
async fn valuation_log_requires_read_permission() {
    let (service, _, _) = build_service();
    let no_read = caller(OWNER, &["valuations.transfer"]);

    let response = app(service, no_read)
        .oneshot(
            Request::builder()
                .uri("/api/v1/valuations/42/transfers")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json_body(response).await["code"], "forbidden");
}

#[tokio::test]
async fn history_route_paginates() {
    let (service, _, _) = build_service();
    service
        .request(&owner(), VALUATION, TransferRequest::to(RECEIVER, "moved to new team"))
        .expect("transfer requested");

    let response = app(service, receiver())
        .oneshot(
            Request::builder()
                .uri("/api/v1/transfers/history?status=pending&per_page=5")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["per_page"], 5);
    assert_eq!(body["data"]["data"][0]["valuation_id"], 42);
}

#[tokio::test]
async fn unknown_priority_is_an_enveloped_validation_error() {
    let (service, store, _) = build_service();

    let response = app(service, owner())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/valuations/42/transfers",
            json!({ "to_user_id": 7, "reason": "moved to new team", "priority": "extreme" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(body["errors"]["priority"][0], "the selected priority is invalid");
    assert!(!body.to_string().contains("extreme"));
    assert!(store
        .transfers(&TransferFilter::default())
        .expect("store available")
        .is_empty());
}

#[tokio::test]
async fn history_rejects_unknown_status_filter() {
    let (service, _, _) = build_service();

    let response = app(service, receiver())
        .oneshot(
            Request::builder()
                .uri("/api/v1/transfers/history?status=lost")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["errors"]["query"].is_array());
}

#[tokio::test]
async fn history_page_far_beyond_the_end_is_empty() {
    let (service, _, _) = build_service();
    service
        .request(&owner(), VALUATION, TransferRequest::to(RECEIVER, "moved to new team"))
        .expect("transfer requested");

    let response = app(service, receiver())
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/transfers/history?page={}", usize::MAX))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"], json!([]));
}

#[tokio::test]
async fn non_numeric_transfer_id_is_not_found() {
    let (service, _, _) = build_service();

    let response = app(service, receiver())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/transfers/latest/approve",
            json!({}),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["code"], "not_found");
}
