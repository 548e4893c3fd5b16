//! LabDesk Lab Equipment Reservation System
//!
//! A Rust REST API server for managing a catalog of shared lab equipment
//! and the request/approve/checkout/checkin workflow that books it.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
