//! Business logic services

pub mod email;
pub mod equipment;
pub mod notifications;
pub mod reports;
pub mod reservations;
pub mod users;

use crate::{
    config::{AuthConfig, EmailConfig, NotificationsConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub equipment: equipment::EquipmentService,
    pub reservations: reservations::ReservationsService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        notifications_config: NotificationsConfig,
    ) -> AppResult<Self> {
        let email = email::EmailService::new(email_config);
        let dispatcher =
            notifications::NotificationDispatcher::start(email, notifications_config);

        Ok(Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            equipment: equipment::EquipmentService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone(), dispatcher),
            reports: reports::ReportsService::new(repository),
        })
    }
}
