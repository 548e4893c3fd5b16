//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterRequest, Role, User, APPROVER_ROLES},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether a user with this email or roll number already exists
    pub async fn email_or_roll_number_exists(
        &self,
        email: &str,
        roll_number: &str,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR roll_number = $2)",
        )
        .bind(email)
        .bind(roll_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a user with an already-hashed password
    pub async fn create(&self, req: &RegisterRequest, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, department, roll_number, phone, role)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.email)
        .bind(password_hash)
        .bind(&req.department)
        .bind(&req.roll_number)
        .bind(&req.phone)
        .bind(req.role.unwrap_or(Role::Student))
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// All users holding an approver role, for notification fan-out
    pub async fn list_approvers(&self) -> AppResult<Vec<User>> {
        let roles: Vec<String> = APPROVER_ROLES.iter().map(|r| r.as_str().to_string()).collect();
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = ANY($1) ORDER BY name",
        )
        .bind(&roles)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Equipment ids for which the user has completed training
    pub async fn training_equipment_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT equipment_id FROM user_training WHERE user_id = $1 ORDER BY equipment_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Whether the user has completed training for the given equipment
    pub async fn has_completed_training(&self, user_id: i32, equipment_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_training WHERE user_id = $1 AND equipment_id = $2)",
        )
        .bind(user_id)
        .bind(equipment_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Record completed training (idempotent)
    pub async fn record_training(&self, user_id: i32, equipment_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_training (user_id, equipment_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, equipment_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(equipment_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
