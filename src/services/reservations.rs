//! Reservation workflow service
//!
//! The only stateful process in the system: create, approve, reject,
//! checkout and checkin, driven by the explicit status machine and the
//! transactional capacity updates in the repository. Notifications are
//! enqueued after a transition commits.

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        reservation::{
            CreateReservation, EquipmentCondition, ReservationDetails, ReservationQuery,
            WorkflowStep,
        },
        user::UserClaims,
    },
    repository::Repository,
    services::{email::Notification, notifications::NotificationDispatcher},
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    dispatcher: NotificationDispatcher,
}

impl ReservationsService {
    pub fn new(repository: Repository, dispatcher: NotificationDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Create a reservation request (-> pending) and notify approvers
    pub async fn create(
        &self,
        claims: &UserClaims,
        req: CreateReservation,
    ) -> AppResult<ReservationDetails> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if req.requested_end_time <= req.requested_start_time {
            return Err(AppError::Validation(
                "Requested end time must be after start time".to_string(),
            ));
        }

        let equipment = self.repository.equipment.get_by_id(req.equipment_id).await?;
        if !equipment.is_active {
            return Err(AppError::Validation(
                "Equipment is not available for reservation".to_string(),
            ));
        }
        if equipment.available_quantity < req.quantity {
            return Err(AppError::Validation(
                "Insufficient equipment available".to_string(),
            ));
        }
        if equipment.requires_training
            && !self
                .repository
                .users
                .has_completed_training(claims.user_id, req.equipment_id)
                .await?
        {
            return Err(AppError::Validation(
                "Training required for this equipment".to_string(),
            ));
        }

        let requester = self.repository.users.get_by_id(claims.user_id).await?;
        let reservation = self.repository.reservations.create(claims.user_id, &req).await?;

        tracing::info!(
            reservation_id = reservation.id,
            equipment_id = equipment.id,
            user_id = requester.id,
            "Reservation requested"
        );

        // Fan out to everyone who can review the request
        let approvers = self.repository.users.list_approvers().await?;
        for approver in approvers {
            self.dispatcher.enqueue(Notification {
                to: approver.email,
                subject: "New Equipment Reservation Request".to_string(),
                body: format!(
                    "New reservation request\n\n\
                     Requested by: {}\n\
                     Equipment: {}\n\
                     Project: {}\n\
                     Duration: {} - {}\n\
                     Quantity: {}\n\n\
                     Please review and approve or reject this request.",
                    requester.name,
                    equipment.name,
                    req.project.title,
                    req.requested_start_time,
                    req.requested_end_time,
                    req.quantity
                ),
            });
        }

        self.repository.reservations.get_details(reservation.id).await
    }

    /// List reservations; students only ever see their own
    pub async fn list(
        &self,
        claims: &UserClaims,
        query: &ReservationQuery,
    ) -> AppResult<Vec<ReservationDetails>> {
        let restrict_to_user = if claims.role.is_approver() {
            query.user_id
        } else {
            Some(claims.user_id)
        };
        self.repository.reservations.list(restrict_to_user, query).await
    }

    /// Pending reservations awaiting review
    pub async fn list_pending(&self) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.list_pending().await
    }

    /// pending -> approved; reserves capacity and notifies the requester
    pub async fn approve(
        &self,
        id: i32,
        approver: &UserClaims,
        comments: Option<String>,
    ) -> AppResult<ReservationDetails> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        reservation
            .status
            .apply(WorkflowStep::Approve)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        let approved = self
            .repository
            .reservations
            .approve(id, approver.user_id, comments.as_deref())
            .await?;

        tracing::info!(
            reservation_id = approved.id,
            approver_id = approver.user_id,
            "Reservation approved"
        );

        let details = self.repository.reservations.get_details(approved.id).await?;
        self.dispatcher.enqueue(Notification {
            to: details.user.email.clone(),
            subject: "Reservation Approved".to_string(),
            body: format!(
                "Your reservation for {} has been approved.\n\n\
                 Comments: {}\n\n\
                 Please collect the equipment at the scheduled time.",
                details.equipment.name,
                details.approval_comments.as_deref().unwrap_or("None")
            ),
        });

        Ok(details)
    }

    /// pending -> rejected; a reason is required
    pub async fn reject(
        &self,
        id: i32,
        reason: Option<String>,
    ) -> AppResult<ReservationDetails> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Rejection reason is required".to_string()))?;

        let reservation = self.repository.reservations.get_by_id(id).await?;
        reservation
            .status
            .apply(WorkflowStep::Reject)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        let rejected = self.repository.reservations.reject(id, &reason).await?;

        tracing::info!(reservation_id = rejected.id, "Reservation rejected");

        let details = self.repository.reservations.get_details(rejected.id).await?;
        self.dispatcher.enqueue(Notification {
            to: details.user.email.clone(),
            subject: "Reservation Rejected".to_string(),
            body: format!(
                "Your reservation for {} has been rejected.\n\n\
                 Reason: {}\n\n\
                 Please contact the lab administrator for more information.",
                details.equipment.name, reason
            ),
        });

        Ok(details)
    }

    /// approved -> in_use
    pub async fn checkout(&self, id: i32) -> AppResult<ReservationDetails> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        reservation
            .status
            .apply(WorkflowStep::Checkout)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        let checked_out = self.repository.reservations.checkout(id).await?;

        tracing::info!(reservation_id = checked_out.id, "Equipment checked out");

        self.repository.reservations.get_details(checked_out.id).await
    }

    /// in_use -> completed; restores capacity
    pub async fn checkin(
        &self,
        id: i32,
        condition: Option<EquipmentCondition>,
        usage_notes: Option<String>,
    ) -> AppResult<ReservationDetails> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        reservation
            .status
            .apply(WorkflowStep::Checkin)
            .map_err(|e| AppError::Conflict(e.to_string()))?;

        let checked_in = self
            .repository
            .reservations
            .checkin(id, condition, usage_notes.as_deref())
            .await?;

        tracing::info!(reservation_id = checked_in.id, "Equipment checked in");

        self.repository.reservations.get_details(checked_in.id).await
    }
}
