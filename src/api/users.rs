//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{error::AppResult, models::user::RecordTraining, policy::Action};

use super::AuthenticatedUser;

/// Record completed training for a user on a piece of equipment
#[utoipa::path(
    post,
    path = "/users/{id}/training",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = RecordTraining,
    responses(
        (status = 204, description = "Training recorded"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "User or equipment not found")
    )
)]
pub async fn record_training(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(request): Json<RecordTraining>,
) -> AppResult<StatusCode> {
    claims.authorize(Action::RecordTraining)?;
    state
        .services
        .users
        .record_training(user_id, request.equipment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
