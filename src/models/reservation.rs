//! Reservation model and workflow state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::equipment::EquipmentShort;
use super::user::UserShort;

/// Reservation lifecycle status
///
/// `Overdue` is a reportable value (an in-use reservation past its requested
/// end time); the workflow itself never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    InUse,
    Completed,
    Overdue,
}

/// Workflow steps that move a reservation between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Approve,
    Reject,
    Checkout,
    Checkin,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Approve => "approve",
            WorkflowStep::Reject => "reject",
            WorkflowStep::Checkout => "checkout",
            WorkflowStep::Checkin => "checkin",
        }
    }
}

/// A workflow step applied to a reservation in a status that does not accept it
#[derive(Debug, Clone, thiserror::Error)]
#[error("Cannot {step} a reservation in '{from}' status")]
pub struct IllegalTransition {
    pub from: ReservationStatus,
    pub step: &'static str,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::InUse => "in_use",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Overdue => "overdue",
        }
    }

    /// Total transition function for the reservation workflow.
    ///
    /// pending -> approved | rejected, approved -> in_use,
    /// in_use -> completed; everything else is illegal.
    pub fn apply(self, step: WorkflowStep) -> Result<ReservationStatus, IllegalTransition> {
        match (self, step) {
            (ReservationStatus::Pending, WorkflowStep::Approve) => Ok(ReservationStatus::Approved),
            (ReservationStatus::Pending, WorkflowStep::Reject) => Ok(ReservationStatus::Rejected),
            (ReservationStatus::Approved, WorkflowStep::Checkout) => Ok(ReservationStatus::InUse),
            (ReservationStatus::InUse, WorkflowStep::Checkin) => Ok(ReservationStatus::Completed),
            (from, step) => Err(IllegalTransition {
                from,
                step: step.as_str(),
            }),
        }
    }

    /// Whether a reservation in this status still holds reserved units
    pub fn holds_capacity(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Approved | ReservationStatus::InUse | ReservationStatus::Overdue
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "approved" => Ok(ReservationStatus::Approved),
            "rejected" => Ok(ReservationStatus::Rejected),
            "in_use" => Ok(ReservationStatus::InUse),
            "completed" => Ok(ReservationStatus::Completed),
            "overdue" => Ok(ReservationStatus::Overdue),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

// SQLx conversion for ReservationStatus (stored as text)
impl sqlx::Type<Postgres> for ReservationStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ReservationStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ReservationStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Reservation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Priority {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Priority {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Priority {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Equipment condition recorded at check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCondition {
    Excellent,
    Good,
    Fair,
    NeedsMaintenance,
    Damaged,
}

impl EquipmentCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCondition::Excellent => "excellent",
            EquipmentCondition::Good => "good",
            EquipmentCondition::Fair => "fair",
            EquipmentCondition::NeedsMaintenance => "needs_maintenance",
            EquipmentCondition::Damaged => "damaged",
        }
    }
}

impl std::str::FromStr for EquipmentCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(EquipmentCondition::Excellent),
            "good" => Ok(EquipmentCondition::Good),
            "fair" => Ok(EquipmentCondition::Fair),
            "needs_maintenance" => Ok(EquipmentCondition::NeedsMaintenance),
            "damaged" => Ok(EquipmentCondition::Damaged),
            _ => Err(format!("Invalid equipment condition: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for EquipmentCondition {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for EquipmentCondition {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for EquipmentCondition {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Project details attached to a reservation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProjectDetails {
    #[validate(length(min = 1, message = "Project title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Project description is required"))]
    pub description: String,
    pub supervisor: Option<String>,
}

/// Reservation row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub equipment_id: i32,
    pub project_title: String,
    pub project_description: String,
    pub project_supervisor: Option<String>,
    pub requested_start_time: DateTime<Utc>,
    pub requested_end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub quantity: i32,
    pub status: ReservationStatus,
    pub approved_by: Option<i32>,
    pub approval_comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub priority: Priority,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub usage_notes: Option<String>,
    pub condition_after_use: Option<EquipmentCondition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation with joined user and equipment details for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub status: ReservationStatus,
    pub project: ProjectDetails,
    pub requested_start_time: DateTime<Utc>,
    pub requested_end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub quantity: i32,
    pub priority: Priority,
    pub approval_comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub usage_notes: Option<String>,
    pub condition_after_use: Option<EquipmentCondition>,
    pub user: UserShort,
    pub equipment: EquipmentShort,
    /// In use and past the requested end time
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
}

/// Create reservation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    pub equipment_id: i32,
    #[validate(nested)]
    pub project: ProjectDetails,
    pub requested_start_time: DateTime<Utc>,
    pub requested_end_time: DateTime<Utc>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub priority: Option<Priority>,
}

/// Approve reservation request body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveReservation {
    pub approval_comments: Option<String>,
}

/// Reject reservation request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectReservation {
    pub rejection_reason: Option<String>,
}

/// Check-in request body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckinReservation {
    pub condition_after_use: Option<EquipmentCondition>,
    pub usage_notes: Option<String>,
}

/// Reservation listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    /// Ignored for students, who always see their own reservations
    pub user_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(
            ReservationStatus::Pending.apply(WorkflowStep::Approve).unwrap(),
            ReservationStatus::Approved
        );
        assert_eq!(
            ReservationStatus::Pending.apply(WorkflowStep::Reject).unwrap(),
            ReservationStatus::Rejected
        );
        assert_eq!(
            ReservationStatus::Approved.apply(WorkflowStep::Checkout).unwrap(),
            ReservationStatus::InUse
        );
        assert_eq!(
            ReservationStatus::InUse.apply(WorkflowStep::Checkin).unwrap(),
            ReservationStatus::Completed
        );
    }

    #[test]
    fn approve_requires_pending() {
        for status in [
            ReservationStatus::Approved,
            ReservationStatus::Rejected,
            ReservationStatus::InUse,
            ReservationStatus::Completed,
            ReservationStatus::Overdue,
        ] {
            assert!(status.apply(WorkflowStep::Approve).is_err());
            assert!(status.apply(WorkflowStep::Reject).is_err());
        }
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for status in [ReservationStatus::Rejected, ReservationStatus::Completed] {
            for step in [
                WorkflowStep::Approve,
                WorkflowStep::Reject,
                WorkflowStep::Checkout,
                WorkflowStep::Checkin,
            ] {
                assert!(status.apply(step).is_err());
            }
        }
    }

    #[test]
    fn checkout_and_checkin_ordering() {
        assert!(ReservationStatus::Pending.apply(WorkflowStep::Checkout).is_err());
        assert!(ReservationStatus::Pending.apply(WorkflowStep::Checkin).is_err());
        assert!(ReservationStatus::Approved.apply(WorkflowStep::Checkin).is_err());
        assert!(ReservationStatus::InUse.apply(WorkflowStep::Checkout).is_err());
    }

    #[test]
    fn illegal_transition_message_names_step_and_status() {
        let err = ReservationStatus::Completed
            .apply(WorkflowStep::Approve)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot approve a reservation in 'completed' status");
    }

    #[test]
    fn status_parses_from_wire_form() {
        assert_eq!(
            "in_use".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::InUse
        );
        assert!("cancelled".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn capacity_held_while_approved_or_out() {
        assert!(!ReservationStatus::Pending.holds_capacity());
        assert!(ReservationStatus::Approved.holds_capacity());
        assert!(ReservationStatus::InUse.holds_capacity());
        assert!(!ReservationStatus::Completed.holds_capacity());
        assert!(!ReservationStatus::Rejected.holds_capacity());
    }
}
