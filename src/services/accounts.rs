use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::AppError,
    models::{CreateUser, LoginRequest, TokenResponse, User},
    repository::UserRepository,
    utils::{create_token, hash_password, verify_password, verify_token},
};

const MAX_EMAIL_LENGTH: usize = 255;

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    auth: AuthConfig,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, auth: AuthConfig) -> Self {
        Self { users, auth }
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub async fn register(&self, request: CreateUser) -> Result<User, AppError> {
        let email = normalize_email(&request.email);
        if !is_plausible_email(&email) {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(AppError::Validation(format!(
                "Email must be at most {} characters",
                MAX_EMAIL_LENGTH
            )));
        }
        if request.password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }

        let password_hash = hash_password(&request.password, self.auth.bcrypt_cost)?;
        let user = self.users.insert(&email, &password_hash).await?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(invalid_credentials());
        }

        let access_token = create_token(&self.auth, user.id, user.email.clone())?;
        Ok(TokenResponse {
            id: user.id,
            email: user.email,
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn resolve_user(&self, token: &str) -> Result<User, AppError> {
        let claims = verify_token(&self.auth, token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }

    pub async fn delete_account(&self, user_id: i32) -> Result<(), AppError> {
        self.users.delete(user_id).await?;
        log::info!("Deleted user {} and their products", user_id);
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
