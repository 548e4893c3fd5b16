//! Identity and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterRequest, User, UserClaims, UserInfo, UserProfile},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user and return a token with the user payload
    pub async fn register(&self, req: RegisterRequest) -> AppResult<(String, User)> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let email = req.email.to_lowercase();
        if self
            .repository
            .users
            .email_or_roll_number_exists(&email, &req.roll_number)
            .await?
        {
            return Err(AppError::Conflict(
                "User with this email or roll number already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(&req.password)?;
        let user = self.repository.users.create(&req, &password_hash).await?;

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Authenticate by email and password, returning a token with the user
    pub async fn authenticate(&self, req: &LoginRequest) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(&req.email.to_lowercase())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !self.verify_password(&user, &req.password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Profile of the authenticated user, with completed-training equipment ids
    pub async fn get_profile(&self, user_id: i32) -> AppResult<UserProfile> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let completed_training = self.repository.users.training_equipment_ids(user_id).await?;
        Ok(UserProfile {
            user: UserInfo::from(&user),
            completed_training,
        })
    }

    /// Record completed training for a user on a piece of equipment
    pub async fn record_training(&self, user_id: i32, equipment_id: i32) -> AppResult<()> {
        // Both sides must exist; equipment may be training-gated later
        self.repository.users.get_by_id(user_id).await?;
        self.repository.equipment.get_by_id(equipment_id).await?;
        self.repository
            .users
            .record_training(user_id, equipment_id)
            .await
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
