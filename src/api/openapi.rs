//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, equipment, health, reports, reservations, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LabDesk API",
        version = "0.9.0",
        description = "Lab Equipment Reservation System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "LabDesk Team", email = "contact@labdesk.org")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::profile,
        // Users
        users::record_training,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Reservations
        reservations::create_reservation,
        reservations::list_reservations,
        reservations::list_pending_reservations,
        reservations::approve_reservation,
        reservations::reject_reservation,
        reservations::checkout_reservation,
        reservations::checkin_reservation,
        // Reports
        reports::usage_report,
        reports::equipment_status_report,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::UserInfo,
            crate::models::user::UserProfile,
            crate::models::user::UserShort,
            crate::models::user::Role,
            crate::models::user::RecordTraining,
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentShort,
            crate::models::equipment::EquipmentCategory,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::EquipmentQuery,
            equipment::DeleteEquipmentResponse,
            // Reservations
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::Priority,
            crate::models::reservation::EquipmentCondition,
            crate::models::reservation::ProjectDetails,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::ApproveReservation,
            crate::models::reservation::RejectReservation,
            crate::models::reservation::CheckinReservation,
            crate::models::reservation::ReservationQuery,
            // Reports
            crate::services::reports::UsageReport,
            crate::services::reports::UsageSummary,
            crate::services::reports::EquipmentStatusEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "equipment", description = "Equipment catalog"),
        (name = "reservations", description = "Reservation workflow"),
        (name = "reports", description = "Usage reporting")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
