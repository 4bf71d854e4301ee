//! OTP login handlers.
//!
//! `send-otp` stores a fresh code before attempting delivery, so a failed
//! send still replaces any earlier code for that address.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use slot_booking_core::{Email, OtpCode};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Body of `POST /api/send-otp`.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /api/verify-otp`.
///
/// `otp` is kept as raw JSON; clients send it both as a number and a string.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Value,
}

/// Issue a code for `email` and mail it.
#[tracing::instrument(skip_all)]
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendOtpRequest>,
) -> Result<Response> {
    let raw = request
        .email
        .ok_or_else(|| AppError::Validation("email is required".to_string()))?;
    let email = Email::parse(&raw).map_err(|e| AppError::Validation(e.to_string()))?;

    let code = state.otp().issue(&email).await;
    add_breadcrumb("auth", "OTP issued", Some(&[("domain", email.domain())]));

    match state.notifier().send_otp(&email, code).await {
        Ok(()) => {
            tracing::info!(email = %email, "OTP sent");
            Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
        }
        Err(e) => {
            AppError::from(e).report();
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false })),
            )
                .into_response())
        }
    }
}

/// Exchange a valid code for a session token.
#[tracing::instrument(skip_all)]
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyOtpRequest>,
) -> Result<Response> {
    let email = request.email.as_deref().and_then(|raw| Email::parse(raw).ok());
    let code = OtpCode::coerce_json(&request.otp).ok();

    let (Some(email), Some(code)) = (email, code) else {
        return Ok(not_verified());
    };

    if !state.otp().verify(&email, code).await {
        tracing::info!(email = %email, "OTP rejected");
        return Ok(not_verified());
    }

    let auth_token = state.tokens().issue(&email)?;
    tracing::info!(email = %email, "OTP verified, session token issued");

    Ok(Json(json!({
        "verified": true,
        "authToken": auth_token,
        "email": email,
    }))
    .into_response())
}

fn not_verified() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "verified": false }))).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::Method;
    use chrono::TimeDelta;

    use super::*;
    use crate::test_support::{RecordingNotifier, TestApp};

    #[tokio::test]
    async fn test_send_otp_mails_a_four_digit_code() {
        let app = TestApp::new();
        let (status, body) = app
            .request(
                Method::POST,
                "/api/send-otp",
                Some(json!({ "email": "a@x.com" })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        let code = app.notifier.last_code_for("a@x.com").unwrap();
        assert!((1000..=9999).contains(&code.value()));
    }

    #[tokio::test]
    async fn test_send_otp_failure_still_stores_code() {
        let app = TestApp::with_notifier(RecordingNotifier::failing());

        let (status, body) = app
            .request(
                Method::POST,
                "/api/send-otp",
                Some(json!({ "email": "a@x.com" })),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "success": false }));

        let attempted = app.notifier.last_code_for("a@x.com").unwrap();
        let email = Email::parse("a@x.com").unwrap();
        assert!(app.state.otp().verify(&email, attempted).await);
    }

    #[tokio::test]
    async fn test_send_otp_requires_email() {
        let app = TestApp::new();
        for body in [json!({}), json!({ "email": "" }), json!({ "email": "nope" })] {
            let (status, _) = app
                .request(Method::POST, "/api/send-otp", Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        }
        assert_eq!(app.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_verify_otp_issues_token() {
        let app = TestApp::new();
        app.request(
            Method::POST,
            "/api/send-otp",
            Some(json!({ "email": "a@x.com" })),
        )
        .await;
        let code = app.notifier.last_code_for("a@x.com").unwrap();

        let (status, body) = app
            .request(
                Method::POST,
                "/api/verify-otp",
                Some(json!({ "email": "a@x.com", "otp": code.value() })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verified"], json!(true));
        assert_eq!(body["email"], json!("a@x.com"));

        let token = body["authToken"].as_str().unwrap();
        let claims = app.state.tokens().verify(token).unwrap();
        assert_eq!(claims.email().as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_verify_otp_accepts_string_code() {
        let app = TestApp::new();
        let code = app
            .state
            .otp()
            .issue(&Email::parse("a@x.com").unwrap())
            .await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/verify-otp",
                Some(json!({ "email": "a@x.com", "otp": format!(" {code} ") })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_code_is_reusable_until_replaced() {
        let app = TestApp::new();
        let email = Email::parse("a@x.com").unwrap();
        let code = app.state.otp().issue(&email).await;
        let body = json!({ "email": "a@x.com", "otp": code.value() });

        for _ in 0..2 {
            let (status, _) = app
                .request(Method::POST, "/api/verify-otp", Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_verify_otp_rejections() {
        let app = TestApp::new();
        let code = app
            .state
            .otp()
            .issue(&Email::parse("a@x.com").unwrap())
            .await;
        let wrong = if code.value() == 9999 { 1000 } else { code.value() + 1 };

        for body in [
            json!({ "email": "a@x.com", "otp": wrong }),
            json!({ "email": "b@x.com", "otp": code.value() }),
            json!({ "email": "a@x.com", "otp": "abcd" }),
            json!({ "email": "a@x.com", "otp": null }),
            json!({ "email": "a@x.com" }),
            json!({ "otp": code.value() }),
        ] {
            let (status, response) = app
                .request(Method::POST, "/api/verify-otp", Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response, json!({ "verified": false }));
        }
    }

    #[tokio::test]
    async fn test_verify_otp_respects_ttl() {
        let app = TestApp::with_otp_ttl(Duration::from_secs(300));
        let code = app
            .state
            .otp()
            .issue(&Email::parse("a@x.com").unwrap())
            .await;
        let body = json!({ "email": "a@x.com", "otp": code.value() });

        app.clock.advance(TimeDelta::seconds(301));
        let (status, _) = app
            .request(Method::POST, "/api/verify-otp", Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_full_session_scenario() {
        let app = TestApp::new();
        let notifier = Arc::clone(&app.notifier);

        app.request(
            Method::POST,
            "/api/send-otp",
            Some(json!({ "email": "a@x.com" })),
        )
        .await;
        let code = notifier.last_code_for("a@x.com").unwrap();

        let (_, verified) = app
            .request(
                Method::POST,
                "/api/verify-otp",
                Some(json!({ "email": "a@x.com", "otp": code.value() })),
            )
            .await;
        let token = verified["authToken"].as_str().unwrap().to_string();

        let (status, _) = app
            .request(
                Method::POST,
                "/api/book",
                Some(json!({
                    "date": "2024-01-01",
                    "updatedSlot": { "time": "10:00" },
                    "authToken": token,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(json!({ "authToken": token })),
            )
            .await;
        assert_eq!(listed, json!({ "2024-01-01": [{ "time": "10:00" }] }));

        let (status, _) = app
            .request(Method::DELETE, "/api/cancel/2024-01-01/10:00", None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(json!({ "authToken": token })),
            )
            .await;
        assert_eq!(listed, json!({}));
    }
}
