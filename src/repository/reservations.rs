//! Reservations repository for database operations
//!
//! Workflow transitions are guarded updates (`WHERE status = '<expected>'`)
//! so a transition raced by a concurrent request affects zero rows instead
//! of silently overwriting state. Approve and checkin also move the
//! equipment capacity counter, inside the same transaction.

use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::EquipmentShort,
        reservation::{
            CreateReservation, EquipmentCondition, Priority, ProjectDetails, Reservation,
            ReservationDetails, ReservationQuery, ReservationStatus,
        },
        user::UserShort,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.status, r.project_title, r.project_description, r.project_supervisor,
           r.requested_start_time, r.requested_end_time, r.actual_start_time, r.actual_end_time,
           r.quantity, r.priority, r.approval_comments, r.rejection_reason, r.usage_notes,
           r.condition_after_use, r.created_at,
           u.id as user_id, u.name as user_name, u.email as user_email,
           u.department as user_department, u.roll_number as user_roll_number,
           e.id as equipment_id, e.name as equipment_name,
           e.category as equipment_category, e.location as equipment_location
    FROM reservations r
    JOIN users u ON r.user_id = u.id
    JOIN equipment e ON r.equipment_id = e.id
"#;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Get reservation with user and equipment details
    pub async fn get_details(&self, id: i32) -> AppResult<ReservationDetails> {
        let sql = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;
        Ok(details_from_row(&row))
    }

    /// Create a new pending reservation
    pub async fn create(&self, user_id: i32, req: &CreateReservation) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                user_id, equipment_id, project_title, project_description, project_supervisor,
                requested_start_time, requested_end_time, quantity, status, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(req.equipment_id)
        .bind(&req.project.title)
        .bind(&req.project.description)
        .bind(&req.project.supervisor)
        .bind(req.requested_start_time)
        .bind(req.requested_end_time)
        .bind(req.quantity)
        .bind(req.priority.unwrap_or(Priority::Medium))
        .fetch_one(&self.pool)
        .await?;
        Ok(reservation)
    }

    /// List reservations, newest first.
    ///
    /// `restrict_to_user` pins the listing to one requester (the
    /// students-see-their-own rule, resolved by the service layer).
    pub async fn list(
        &self,
        restrict_to_user: Option<i32>,
        query: &ReservationQuery,
    ) -> AppResult<Vec<ReservationDetails>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if restrict_to_user.is_some() {
            conditions.push(format!("r.user_id = ${}", idx));
            idx += 1;
        }
        if query.status.is_some() {
            conditions.push(format!("r.status = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("{}{} ORDER BY r.created_at DESC", DETAILS_SELECT, where_clause);

        let mut builder = sqlx::query(&sql);
        if let Some(user_id) = restrict_to_user {
            builder = builder.bind(user_id);
        }
        if let Some(status) = query.status {
            builder = builder.bind(status);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect())
    }

    /// Pending reservations awaiting review, newest first
    pub async fn list_pending(&self) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!(
            "{} WHERE r.status = 'pending' ORDER BY r.created_at DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect())
    }

    /// pending -> approved, reserving capacity.
    ///
    /// The status flip and the counter decrement commit together; the
    /// decrement only applies while it keeps the counter non-negative, so
    /// of two racing approvals for the last units at most one commits.
    pub async fn approve(
        &self,
        id: i32,
        approver_id: i32,
        comments: Option<&str>,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'approved', approved_by = $2, approval_comments = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approver_id)
        .bind(comments)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("Reservation is no longer pending".to_string()))?;

        let decremented = sqlx::query(
            r#"
            UPDATE equipment
            SET available_quantity = available_quantity - $1, updated_at = NOW()
            WHERE id = $2 AND available_quantity >= $1
            "#,
        )
        .bind(reservation.quantity)
        .bind(reservation.equipment_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Validation(
                "Equipment no longer available".to_string(),
            ));
        }

        tx.commit().await?;
        Ok(reservation)
    }

    /// pending -> rejected
    pub async fn reject(&self, id: i32, reason: &str) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'rejected', rejection_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Reservation is no longer pending".to_string()))
    }

    /// approved -> in_use, stamping the observed start of usage
    pub async fn checkout(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'in_use', actual_start_time = NOW(), checked_out_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Reservation is not approved".to_string()))
    }

    /// in_use -> completed, restoring capacity.
    ///
    /// The restore is clamped to total_quantity: if capacity was reduced
    /// while units were out, the counter settles at the new total instead
    /// of tripping the CHECK constraint.
    pub async fn checkin(
        &self,
        id: i32,
        condition: Option<EquipmentCondition>,
        usage_notes: Option<&str>,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'completed', actual_end_time = NOW(), checked_in_at = NOW(),
                condition_after_use = $2, usage_notes = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'in_use'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(condition)
        .bind(usage_notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("Reservation is not checked out".to_string()))?;

        sqlx::query(
            r#"
            UPDATE equipment
            SET available_quantity = LEAST(total_quantity, available_quantity + $1),
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(reservation.quantity)
        .bind(reservation.equipment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }
}

/// Build a details view from a joined row
pub(crate) fn details_from_row(row: &PgRow) -> ReservationDetails {
    let status: ReservationStatus = row.get("status");
    let requested_end_time = row.get("requested_end_time");

    ReservationDetails {
        id: row.get("id"),
        status,
        project: ProjectDetails {
            title: row.get("project_title"),
            description: row.get("project_description"),
            supervisor: row.get("project_supervisor"),
        },
        requested_start_time: row.get("requested_start_time"),
        requested_end_time,
        actual_start_time: row.get("actual_start_time"),
        actual_end_time: row.get("actual_end_time"),
        quantity: row.get("quantity"),
        priority: row.get("priority"),
        approval_comments: row.get("approval_comments"),
        rejection_reason: row.get("rejection_reason"),
        usage_notes: row.get("usage_notes"),
        condition_after_use: row.get("condition_after_use"),
        user: UserShort {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
            department: row.get("user_department"),
            roll_number: row.get("user_roll_number"),
        },
        equipment: EquipmentShort {
            id: row.get("equipment_id"),
            name: row.get("equipment_name"),
            category: row.get("equipment_category"),
            location: row.get("equipment_location"),
        },
        is_overdue: status == ReservationStatus::InUse && requested_end_time < Utc::now(),
        created_at: row.get("created_at"),
    }
}
