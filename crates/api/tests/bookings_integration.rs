//! Integration tests for attendee booking endpoints.
//!
//! Run with: cargo test --test bookings_integration

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    delete_request_with_auth, get_request_with_auth, json_request_with_auth, TestContext,
};
use domain::services::BookingNotificationKind;
use serde_json::json;
use tower::ServiceExt;

// ============================================================================
// Reserve
// ============================================================================

#[tokio::test]
async fn test_reserve_then_sold_out() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let first = ctx.attendee().await;
    let second = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 2).await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 2 }),
            &first.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "pending");
    assert!(body["booking_id"].as_i64().is_some());

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 1 }),
            &second.token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_capacity");
    assert_eq!(body["free"], 0);
}

#[tokio::test]
async fn test_reserve_without_body_books_one_unit() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/event/{}/book", event_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", attendee.token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, bookings) = ctx
        .send(get_request_with_auth("/api/my-bookings", &attendee.token))
        .await;
    assert_eq!(bookings[0]["qty"], 1);
}

#[tokio::test]
async fn test_reserve_rejects_non_positive_quantity() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;

    for qty in [0, -1] {
        let (status, body) = ctx
            .send(json_request_with_auth(
                Method::POST,
                &format!("/api/event/{}/book", event_id),
                json!({ "qty": qty }),
                &attendee.token,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_reserve_rejects_malformed_body() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/event/{}/book", event_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", attendee.token))
        .body(Body::from("{\"qty\": "))
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reserve_unknown_event() {
    let ctx = TestContext::new();
    let attendee = ctx.attendee().await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            "/api/event/424242/book",
            json!({ "qty": 1 }),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_second_active_booking_is_rejected() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;

    ctx.reserve(&attendee, event_id, 1).await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 1 }),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_booked");
}

#[tokio::test]
async fn test_organizer_cannot_book() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 1 }),
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "organizer_cannot_book");

    let (status, _) = ctx
        .send(delete_request_with_auth(
            &format!("/api/event/{}/book", event_id),
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reserve_requires_auth() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/event/{}/book", event_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send(json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 1 }),
            "not-a-token",
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_oversell() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let first = ctx.attendee().await;
    let second = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;

    let requests = [first.token.clone(), second.token.clone()].map(|token| {
        let app = ctx.app.clone();
        let request = json_request_with_auth(
            Method::POST,
            &format!("/api/event/{}/book", event_id),
            json!({ "qty": 3 }),
            &token,
        );
        tokio::spawn(async move { app.oneshot(request).await.unwrap().status() })
    });

    let mut statuses = Vec::new();
    for handle in requests {
        statuses.push(handle.await.unwrap());
    }
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
}

// ============================================================================
// Cancel
// ============================================================================

#[tokio::test]
async fn test_cancel_is_idempotent_failure_after_first() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 3).await;
    ctx.reserve(&attendee, event_id, 2).await;

    let uri = format!("/api/event/{}/book", event_id);
    let (status, body) = ctx
        .send(delete_request_with_auth(&uri, &attendee.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "cancelled": 1 }));

    let (status, body) = ctx
        .send(delete_request_with_auth(&uri, &attendee.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "booking_already_paid_or_not_found");
}

#[tokio::test]
async fn test_cancel_frees_capacity_and_allows_rebooking() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let other = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 2).await;
    ctx.reserve(&attendee, event_id, 2).await;

    let (status, _) = ctx
        .send(delete_request_with_auth(
            &format!("/api/event/{}/book", event_id),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.reserve(&other, event_id, 2).await;
}

#[tokio::test]
async fn test_cancel_after_payment_is_refused() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 3).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;
    let (status, _) = ctx.approve(&organizer, booking_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(delete_request_with_auth(
            &format!("/api/event/{}/book", event_id),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "booking_already_paid_or_not_found");
}

// ============================================================================
// My bookings & notifications
// ============================================================================

#[tokio::test]
async fn test_my_bookings_lists_own_bookings_only() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let other = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;
    let booking_id = ctx.reserve(&attendee, event_id, 2).await;
    ctx.reserve(&other, event_id, 1).await;

    let (status, body) = ctx
        .send(get_request_with_auth("/api/my-bookings", &attendee.token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["booking_id"], booking_id);
    assert_eq!(items[0]["event_id"], event_id);
    assert_eq!(items[0]["title"], "Test Event");
    assert_eq!(items[0]["status"], "pending");
    assert_eq!(items[0]["qty"], 2);
    assert!(items[0]["my_rating"].is_null());
}

#[tokio::test]
async fn test_state_changes_are_notified() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;

    ctx.send(delete_request_with_auth(
        &format!("/api/event/{}/book", event_id),
        &attendee.token,
    ))
    .await;

    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].kind, BookingNotificationKind::Requested);
    assert_eq!(sent[0].booking_id, booking_id);
    assert_eq!(sent[1].kind, BookingNotificationKind::Cancelled);
    assert_eq!(sent[1].user_id, attendee.id);
}
