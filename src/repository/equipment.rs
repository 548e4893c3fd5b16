//! Equipment catalog repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::equipment::{CreateEquipment, Equipment, EquipmentQuery, UpdateEquipment},
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List active equipment with optional category / search / availability filters
    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<Vec<Equipment>> {
        let mut conditions = vec!["is_active".to_string()];
        let mut idx = 1;

        if query.category.is_some() {
            conditions.push(format!("category = ${}", idx));
            idx += 1;
        }
        if query.search.is_some() {
            conditions.push(format!(
                "(name ILIKE ${} OR description ILIKE ${})",
                idx, idx
            ));
            idx += 1;
        }
        if query.available == Some(true) {
            conditions.push("available_quantity > 0".to_string());
        }
        let _ = idx;

        let sql = format!(
            "SELECT * FROM equipment WHERE {} ORDER BY name",
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&sql);
        if let Some(category) = query.category {
            builder = builder.bind(category);
        }
        if let Some(ref search) = query.search {
            builder = builder.bind(format!("%{}%", search));
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Get equipment by ID (active or not)
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Create equipment; available quantity starts equal to capacity
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (
                name, description, category, location,
                total_quantity, available_quantity,
                specifications, requires_training, max_booking_duration_hours
            )
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category)
        .bind(&data.location)
        .bind(data.total_quantity)
        .bind(&data.specifications)
        .bind(data.requires_training)
        .bind(data.max_booking_duration_hours.unwrap_or(24))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Partial update
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.description, "description");
        add_field!(data.category, "category");
        add_field!(data.location, "location");
        add_field!(data.total_quantity, "total_quantity");
        add_field!(data.available_quantity, "available_quantity");
        add_field!(data.specifications, "specifications");
        add_field!(data.requires_training, "requires_training");
        add_field!(data.max_booking_duration_hours, "max_booking_duration_hours");

        let query = format!(
            "UPDATE equipment SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.description);
        bind_field!(data.category);
        bind_field!(data.location);
        bind_field!(data.total_quantity);
        bind_field!(data.available_quantity);
        bind_field!(data.specifications);
        bind_field!(data.requires_training);
        bind_field!(data.max_booking_duration_hours);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Soft delete: the record stays, the catalog stops listing it
    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE equipment SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }
}
