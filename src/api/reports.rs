//! Reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    policy::Action,
    services::reports::{EquipmentStatusEntry, UsageQuery, UsageReport},
};

use super::AuthenticatedUser;

/// Usage report: completed/in-use reservations with per-equipment summary
#[utoipa::path(
    get,
    path = "/reports/usage",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(UsageQuery),
    responses(
        (status = 200, description = "Usage report", body = UsageReport),
        (status = 403, description = "Not permitted")
    )
)]
pub async fn usage_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UsageQuery>,
) -> AppResult<Json<UsageReport>> {
    claims.authorize(Action::ViewReports)?;
    let report = state.services.reports.usage(&query).await?;
    Ok(Json(report))
}

/// Equipment status report with utilization rates
#[utoipa::path(
    get,
    path = "/reports/equipment-status",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Per-equipment status", body = Vec<EquipmentStatusEntry>),
        (status = 403, description = "Not permitted")
    )
)]
pub async fn equipment_status_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<EquipmentStatusEntry>>> {
    claims.authorize(Action::ViewReports)?;
    let report = state.services.reports.equipment_status().await?;
    Ok(Json(report))
}
