//! Reservation workflow endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{
        ApproveReservation, CheckinReservation, CreateReservation, RejectReservation,
        ReservationDetails, ReservationQuery,
    },
    policy::Action,
};

use super::AuthenticatedUser;

/// Request a reservation
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation requested", body = ReservationDetails),
        (status = 400, description = "Insufficient quantity, missing training or invalid input"),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ReservationDetails>)> {
    let reservation = state.services.reservations.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// List reservations (students see only their own)
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list(&claims, &query).await?;
    Ok(Json(reservations))
}

/// List pending reservations awaiting review
#[utoipa::path(
    get,
    path = "/reservations/pending",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending reservations", body = Vec<ReservationDetails>),
        (status = 403, description = "Not permitted")
    )
)]
pub async fn list_pending_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.authorize(Action::ListPendingReservations)?;
    let reservations = state.services.reservations.list_pending().await?;
    Ok(Json(reservations))
}

/// Approve a pending reservation
#[utoipa::path(
    put,
    path = "/reservations/{id}/approve",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = ApproveReservation,
    responses(
        (status = 200, description = "Reservation approved", body = ReservationDetails),
        (status = 400, description = "Equipment no longer available"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not pending")
    )
)]
pub async fn approve_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ApproveReservation>,
) -> AppResult<Json<ReservationDetails>> {
    claims.authorize(Action::ApproveReservation)?;
    let reservation = state
        .services
        .reservations
        .approve(id, &claims, request.approval_comments)
        .await?;
    Ok(Json(reservation))
}

/// Reject a pending reservation
#[utoipa::path(
    put,
    path = "/reservations/{id}/reject",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = RejectReservation,
    responses(
        (status = 200, description = "Reservation rejected", body = ReservationDetails),
        (status = 400, description = "Rejection reason missing"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not pending")
    )
)]
pub async fn reject_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RejectReservation>,
) -> AppResult<Json<ReservationDetails>> {
    claims.authorize(Action::RejectReservation)?;
    let reservation = state
        .services
        .reservations
        .reject(id, request.rejection_reason)
        .await?;
    Ok(Json(reservation))
}

/// Check out an approved reservation
#[utoipa::path(
    put,
    path = "/reservations/{id}/checkout",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Equipment checked out", body = ReservationDetails),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not approved")
    )
)]
pub async fn checkout_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReservationDetails>> {
    claims.authorize(Action::CheckoutReservation)?;
    let reservation = state.services.reservations.checkout(id).await?;
    Ok(Json(reservation))
}

/// Check in equipment, completing the reservation
#[utoipa::path(
    put,
    path = "/reservations/{id}/checkin",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = CheckinReservation,
    responses(
        (status = 200, description = "Equipment checked in", body = ReservationDetails),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not checked out")
    )
)]
pub async fn checkin_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CheckinReservation>,
) -> AppResult<Json<ReservationDetails>> {
    claims.authorize(Action::CheckinReservation)?;
    let reservation = state
        .services
        .reservations
        .checkin(id, request.condition_after_use, request.usage_notes)
        .await?;
    Ok(Json(reservation))
}
