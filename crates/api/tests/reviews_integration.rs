//! Integration tests for review endpoints.
//!
//! Run with: cargo test --test reviews_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{get_request_with_auth, json_request_with_auth, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_review_is_upserted_and_shown_in_my_bookings() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;
    ctx.reserve(&attendee, event_id, 1).await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            "/api/reviews",
            json!({ "event_id": event_id, "rating": 3, "comment": "Decent" }),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            "/api/reviews",
            json!({ "event_id": event_id, "rating": 5, "comment": "Great after all" }),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["rating"], 5);

    let (_, bookings) = ctx
        .send(get_request_with_auth("/api/my-bookings", &attendee.token))
        .await;
    assert_eq!(bookings[0]["my_rating"], 5);
    assert_eq!(bookings[0]["my_comment"], "Great after all");
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let attendee = ctx.attendee().await;
    let event_id = ctx.event_with_capacity(&organizer, 10).await;

    for rating in [0, 6] {
        let (status, body) = ctx
            .send(json_request_with_auth(
                Method::POST,
                "/api/reviews",
                json!({ "event_id": event_id, "rating": rating }),
                &attendee.token,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_review_unknown_event() {
    let ctx = TestContext::new();
    let attendee = ctx.attendee().await;

    let (status, body) = ctx
        .send(json_request_with_auth(
            Method::POST,
            "/api/reviews",
            json!({ "event_id": 777_777, "rating": 4 }),
            &attendee.token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
