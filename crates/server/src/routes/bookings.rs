//! Booking route handlers.
//!
//! `bookings` and `book` carry the session token in the JSON body as
//! `authToken`; a missing or bad token answers 401. `allbookings` and
//! `cancel` are open.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use slot_booking_core::{BookingRecord, BookingsByDate, Email, Slot};

use crate::error::{AppError, INTERNAL_ERROR_MESSAGE, Result, add_breadcrumb, set_sentry_user};
use crate::extract::ApiJson;
use crate::services::{TokenError, group_by_date};
use crate::state::AppState;

/// Body of `POST /api/bookings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnBookingsRequest {
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Body of `POST /api/book`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub updated_slot: Option<Slot>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Resolve the caller's identity from a body token.
fn authenticate(state: &AppState, token: Option<&str>) -> Result<Email> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(TokenError::Missing)?;

    let claims = state.tokens().verify(token)?;
    set_sentry_user(claims.email());
    Ok(claims.user.email)
}

/// List the caller's bookings grouped by date.
#[tracing::instrument(skip_all)]
pub async fn list_own(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OwnBookingsRequest>,
) -> Result<Json<BookingsByDate>> {
    let email = authenticate(&state, request.auth_token.as_deref())?;

    let records = state.bookings().find_by_user_email(&email).await?;
    tracing::debug!(email = %email, count = records.len(), "Listed own bookings");

    Ok(Json(group_by_date(records)))
}

/// List every booking grouped by date.
///
/// Dates are keyed in lexical order, not storage order; slots within a date
/// keep booking order.
#[tracing::instrument(skip_all)]
pub async fn list_all(State(state): State<AppState>) -> Result<Json<BookingsByDate>> {
    let records = state.bookings().find_all().await?;
    Ok(Json(group_by_date(records)))
}

/// Book a slot for the caller. Double bookings are not rejected.
#[tracing::instrument(skip_all)]
pub async fn book(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookRequest>,
) -> Result<Json<serde_json::Value>> {
    let email = authenticate(&state, request.auth_token.as_deref())?;

    let date = request
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("date is required".to_string()))?;
    let slot = request
        .updated_slot
        .ok_or_else(|| AppError::Validation("updatedSlot is required".to_string()))?;

    add_breadcrumb(
        "booking",
        "Slot booked",
        Some(&[("date", date.as_str()), ("time", slot.time.as_str())]),
    );
    tracing::info!(email = %email, date = %date, time = %slot.time, "Booking created");

    state
        .bookings()
        .insert(&BookingRecord::new(email, date, slot))
        .await?;

    Ok(Json(json!({ "message": "Booking successful" })))
}

/// Remove one booking for `(date, time)`, whoever owns it.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    Path((date, time)): Path<(String, String)>,
) -> Response {
    match state.bookings().delete_one(&date, &time).await {
        Ok(1) => {
            tracing::info!("Booking cancelled");
            (
                StatusCode::OK,
                Json(json!({ "message": "Booking cancelled successfully" })),
            )
                .into_response()
        }
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Booking not found" })),
        )
            .into_response(),
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": INTERNAL_ERROR_MESSAGE,
                    "error": err.public_message(),
                })),
            )
                .into_response()
        }
    }
}
