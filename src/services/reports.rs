//! Usage reporting service
//!
//! Pure read side: aggregates reservation and equipment records per
//! request, nothing is cached or mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{equipment::EquipmentCategory, reservation::ReservationDetails},
    repository::Repository,
};

/// Query parameters for GET /reports/usage
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UsageQuery {
    /// Restrict to reservations created on or after this instant
    pub start_date: Option<DateTime<Utc>>,
    /// Restrict to reservations created on or before this instant
    pub end_date: Option<DateTime<Utc>>,
    pub equipment_id: Option<i32>,
}

/// Per-equipment usage summary
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageSummary {
    pub equipment_id: i32,
    pub equipment_name: String,
    pub category: EquipmentCategory,
    pub total_bookings: i64,
    /// Hours of observed usage, from actual (not requested) times
    pub total_hours: f64,
}

/// Usage report response
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageReport {
    pub usage_data: Vec<ReservationDetails>,
    pub summary: Vec<UsageSummary>,
}

/// Per-equipment status line for GET /reports/equipment-status
#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentStatusEntry {
    pub id: i32,
    pub name: String,
    pub category: EquipmentCategory,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub total_reservations: i64,
    pub active_reservations: i64,
    pub pending_reservations: i64,
    pub utilization_rate: f64,
}

/// Share of capacity currently reserved or out, as a percentage
pub fn utilization_rate(total_quantity: i32, available_quantity: i32) -> f64 {
    if total_quantity <= 0 {
        return 0.0;
    }
    f64::from(total_quantity - available_quantity) / f64::from(total_quantity) * 100.0
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Usage report: completed and in-use reservations plus a per-equipment
    /// summary of booking counts and observed usage hours
    pub async fn usage(&self, query: &UsageQuery) -> AppResult<UsageReport> {
        let pool = &self.repository.pool;

        let mut conditions = vec!["r.status IN ('completed', 'in_use')".to_string()];
        let mut idx = 1;

        if query.start_date.is_some() {
            conditions.push(format!("r.created_at >= ${}", idx));
            idx += 1;
        }
        if query.end_date.is_some() {
            conditions.push(format!("r.created_at <= ${}", idx));
            idx += 1;
        }
        if query.equipment_id.is_some() {
            conditions.push(format!("r.equipment_id = ${}", idx));
        }
        let where_clause = conditions.join(" AND ");

        let usage_data = {
            let sql = format!(
                r#"
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
                WHERE {}
                ORDER BY r.created_at DESC
                "#,
                where_clause
            );
            let mut builder = sqlx::query(&sql);
            if let Some(start) = query.start_date {
                builder = builder.bind(start);
            }
            if let Some(end) = query.end_date {
                builder = builder.bind(end);
            }
            if let Some(equipment_id) = query.equipment_id {
                builder = builder.bind(equipment_id);
            }
            builder
                .fetch_all(pool)
                .await?
                .iter()
                .map(crate::repository::reservations::details_from_row)
                .collect()
        };

        let summary = {
            let sql = format!(
                r#"
                SELECT e.id as equipment_id, e.name as equipment_name, e.category,
                       COUNT(*) as total_bookings,
                       COALESCE(SUM(
                           EXTRACT(EPOCH FROM (r.actual_end_time - r.actual_start_time)) / 3600.0
                       ), 0)::float8 as total_hours
                FROM reservations r
                JOIN equipment e ON r.equipment_id = e.id
                WHERE {}
                GROUP BY e.id, e.name, e.category
                ORDER BY total_bookings DESC
                "#,
                where_clause
            );
            let mut builder = sqlx::query(&sql);
            if let Some(start) = query.start_date {
                builder = builder.bind(start);
            }
            if let Some(end) = query.end_date {
                builder = builder.bind(end);
            }
            if let Some(equipment_id) = query.equipment_id {
                builder = builder.bind(equipment_id);
            }
            builder
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(|row| UsageSummary {
                    equipment_id: row.get("equipment_id"),
                    equipment_name: row.get("equipment_name"),
                    category: row.get("category"),
                    total_bookings: row.get("total_bookings"),
                    total_hours: row.get("total_hours"),
                })
                .collect()
        };

        Ok(UsageReport {
            usage_data,
            summary,
        })
    }

    /// Per-equipment reservation counts and utilization
    pub async fn equipment_status(&self) -> AppResult<Vec<EquipmentStatusEntry>> {
        let pool = &self.repository.pool;

        let rows = sqlx::query(
            r#"
            SELECT e.id, e.name, e.category, e.total_quantity, e.available_quantity,
                   COUNT(r.id) as total_reservations,
                   COUNT(r.id) FILTER (WHERE r.status = 'in_use') as active_reservations,
                   COUNT(r.id) FILTER (WHERE r.status = 'pending') as pending_reservations
            FROM equipment e
            LEFT JOIN reservations r ON r.equipment_id = e.id
            WHERE e.is_active
            GROUP BY e.id, e.name, e.category, e.total_quantity, e.available_quantity
            ORDER BY e.name
            "#,
        )
        .fetch_all(pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| {
                let total_quantity: i32 = row.get("total_quantity");
                let available_quantity: i32 = row.get("available_quantity");
                EquipmentStatusEntry {
                    id: row.get("id"),
                    name: row.get("name"),
                    category: row.get("category"),
                    total_quantity,
                    available_quantity,
                    total_reservations: row.get("total_reservations"),
                    active_reservations: row.get("active_reservations"),
                    pending_reservations: row.get("pending_reservations"),
                    utilization_rate: utilization_rate(total_quantity, available_quantity),
                }
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_of_partially_reserved_equipment() {
        assert_eq!(utilization_rate(10, 4), 60.0);
    }

    #[test]
    fn utilization_bounds() {
        assert_eq!(utilization_rate(5, 5), 0.0);
        assert_eq!(utilization_rate(5, 0), 100.0);
    }

    #[test]
    fn zero_capacity_is_not_a_division() {
        assert_eq!(utilization_rate(0, 0), 0.0);
    }
}
