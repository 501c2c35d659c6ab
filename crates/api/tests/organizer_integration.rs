//! Integration tests for organizer booking endpoints.
//!
//! Run with: cargo test --test organizer_integration

mod common;

use axum::http::StatusCode;
use common::{get_request_with_auth, post_request_with_auth, TestContext};
use domain::services::BookingNotificationKind;

#[tokio::test]
async fn test_approve_moves_booking_to_paid() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 2).await;

    let (status, body) = ctx.approve(&organizer, booking_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["updated"], 1);

    let (_, paid) = ctx
        .send(get_request_with_auth(
            "/api/organizer/bookings?status=paid",
            &organizer.token,
        ))
        .await;
    let paid = paid.as_array().unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0]["booking_id"], booking_id);
    assert_eq!(paid[0]["user_id"], attendee.id);
    assert_eq!(paid[0]["user_email"], attendee.email.as_str());
    assert_eq!(paid[0]["event_title"], "Test Event");

    let notification = ctx.notifier.sent().pop().unwrap();
    assert_eq!(notification.kind, BookingNotificationKind::Approved);
    assert_eq!(notification.actor_id, Some(organizer.id));
}

#[tokio::test]
async fn test_paid_bookings_keep_holding_capacity() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let big = ctx.attendee().await;
    let small = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;

    let first = ctx.reserve(&big, event_id, 8).await;
    let (status, _) = ctx.approve(&organizer, first).await;
    assert_eq!(status, StatusCode::OK);

    let second = ctx.reserve(&small, event_id, 2).await;
    let (status, _) = ctx.approve(&organizer, second).await;
    assert_eq!(status, StatusCode::OK);

    // Reservation counts pending and paid units alike.
    let third = ctx.attendee().await;
    let (status, body) = ctx
        .send(common::json_request_with_auth(
            axum::http::Method::POST,
            &format!("/api/event/{}/book", event_id),
            serde_json::json!({ "qty": 1 }),
            &third.token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["free"], 0);
}

#[tokio::test]
async fn test_reject_then_approve_is_not_pending() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;

    let (status, body) = ctx
        .send(post_request_with_auth(
            &format!("/api/organizer/booking/{}/reject", booking_id),
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (status, body) = ctx.approve(&organizer, booking_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_pending");
    assert!(body.get("free").is_none());

    let (_, rejected) = ctx
        .send(get_request_with_auth(
            "/api/organizer/bookings?status=rejected",
            &organizer.token,
        ))
        .await;
    assert_eq!(rejected.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reject_after_approve_is_not_pending() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;
    ctx.approve(&organizer, booking_id).await;

    let (status, body) = ctx
        .send(post_request_with_auth(
            &format!("/api/organizer/booking/{}/reject", booking_id),
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_pending");
}

#[tokio::test]
async fn test_foreign_and_unknown_bookings() {
    let ctx = TestContext::new();
    let owner = ctx.organizer().await;
    let stranger = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&owner, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;

    let (status, _) = ctx.approve(&stranger, booking_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.approve(&owner, 987_654).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.approve(&attendee, booking_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_bookings_status_handling() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    ctx.reserve(&attendee, event_id, 1).await;

    // Missing status means pending.
    let (status, body) = ctx
        .send(get_request_with_auth("/api/organizer/bookings", &organizer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "pending");

    let (status, body) = ctx
        .send(get_request_with_auth(
            "/api/organizer/bookings?status=refunded",
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_status");

    // Another organizer sees nothing.
    let other = ctx.organizer().await;
    let (_, body) = ctx
        .send(get_request_with_auth("/api/organizer/bookings", &other.token))
        .await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_audit_trail_records_actor() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;
    ctx.approve(&organizer, booking_id).await;

    let (status, body) = ctx
        .send(get_request_with_auth(
            &format!("/api/organizer/booking/{}/audit", booking_id),
            &organizer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["old_status"], "pending");
    assert_eq!(entries[0]["new_status"], "paid");
    assert_eq!(entries[0]["actor_id"], organizer.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_transition_once() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 5).await;
    let booking_id = ctx.reserve(&attendee, event_id, 1).await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let app = ctx.app.clone();
            let request = post_request_with_auth(
                &format!("/api/organizer/booking/{}/approve", booking_id),
                &organizer.token,
            );
            tokio::spawn(async move {
                use tower::ServiceExt;
                let response = app.oneshot(request).await.unwrap();
                let status = response.status();
                (status, common::parse_response_body(response).await)
            })
        })
        .collect();

    let mut transitions = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::OK => transitions += body["updated"].as_u64().unwrap(),
            StatusCode::CONFLICT => assert_eq!(body["error"], "not_pending"),
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(transitions, 1);

    let (_, trail) = ctx
        .send(get_request_with_auth(
            &format!("/api/organizer/booking/{}/audit", booking_id),
            &organizer.token,
        ))
        .await;
    assert_eq!(trail.as_array().unwrap().len(), 1);
}
