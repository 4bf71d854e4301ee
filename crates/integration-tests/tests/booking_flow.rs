//! End-to-end booking flows over HTTP.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use slot_booking_integration_tests::TestContext;

#[tokio::test]
async fn test_full_session_scenario() {
    let ctx = TestContext::new().await;
    let token = ctx.login("a@x.com").await;

    let booked = ctx
        .post(
            "/api/book",
            &json!({
                "date": "2024-01-01",
                "updatedSlot": { "time": "10:00" },
                "authToken": token,
            }),
        )
        .await;
    assert_eq!(booked.status(), StatusCode::OK);
    assert_eq!(
        booked.json::<Value>().await.unwrap(),
        json!({ "message": "Booking successful" })
    );

    let listed: Value = ctx
        .post("/api/bookings", &json!({ "authToken": token }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed, json!({ "2024-01-01": [{ "time": "10:00" }] }));

    let cancelled = ctx.delete("/api/cancel/2024-01-01/10:00").await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    assert_eq!(
        cancelled.json::<Value>().await.unwrap(),
        json!({ "message": "Booking cancelled successfully" })
    );

    let listed: Value = ctx
        .post("/api/bookings", &json!({ "authToken": token }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed, json!({}));
}

#[tokio::test]
async fn test_all_bookings_spans_users_and_keeps_metadata() {
    let ctx = TestContext::new().await;
    let alice = ctx.login("alice@x.com").await;
    let bob = ctx.login("bob@x.com").await;

    for (token, time) in [(&alice, "09:00"), (&bob, "10:00"), (&alice, "11:00")] {
        let response = ctx
            .post(
                "/api/book",
                &json!({
                    "date": "2024-03-05",
                    "updatedSlot": { "time": time, "duration": 30 },
                    "authToken": token,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let all: Value = ctx.get("/api/allbookings").await.json().await.unwrap();
    assert_eq!(
        all,
        json!({
            "2024-03-05": [
                { "time": "09:00", "duration": 30 },
                { "time": "10:00", "duration": 30 },
                { "time": "11:00", "duration": 30 },
            ]
        })
    );

    let bobs: Value = ctx
        .post("/api/bookings", &json!({ "authToken": bob }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(
        bobs,
        json!({ "2024-03-05": [{ "time": "10:00", "duration": 30 }] })
    );
}

#[tokio::test]
async fn test_cancel_unknown_slot_is_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx.delete("/api/cancel/2024-01-01/10:00").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "message": "Booking not found" })
    );
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let live = ctx.get("/health").await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(live.text().await.unwrap(), "ok");

    assert_eq!(ctx.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .get(ctx.url("/api/allbookings"))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-123"
    );
}
