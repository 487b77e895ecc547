use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LoginResponse, NewUser, RegisteredUser, UserProfile, USER_EXISTS};
use crate::store::Datastore;
use crate::validation;

/// Work factor for password hashing, used as the argon2 time cost.
pub const PASSWORD_HASH_COST: u32 = 10;

const TOKEN_TTL_HOURS: i64 = 24;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Datastore>,
    jwt_secret: String,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Datastore>, jwt_secret: String) -> Self {
        Self {
            store,
            jwt_secret,
            hash_cost: PASSWORD_HASH_COST,
        }
    }

    /// Overrides the argon2 time cost for newly hashed passwords.
    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            self.hash_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Password hash params error: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password hash task failed: {}", e)))?
    }

    async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|_| AppError::Internal("Invalid password hash in database".to_string()))?;
            Ok::<_, AppError>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verify task failed: {}", e)))?
    }

    pub async fn register(&self, body: &Value) -> AppResult<RegisteredUser> {
        let req = validation::register(body)?;

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict(USER_EXISTS.to_string()));
        }

        let password_hash = self.hash_password(req.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                email: req.email,
                password_hash,
                name: req.name,
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(RegisteredUser {
            email: user.email,
            name: user.name,
        })
    }

    /// Checks credentials. Unknown email and wrong password fail identically.
    pub async fn validate_user(&self, body: &Value) -> AppResult<UserProfile> {
        let req = validation::login(body)?;

        let Some(user) = self.store.find_user_by_email(&req.email).await? else {
            tracing::warn!("Login attempt for unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !Self::verify_password(req.password, user.password.clone()).await? {
            tracing::warn!("Invalid password for user {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(UserProfile::from(user))
    }

    pub fn jwt_sign(&self, user: &UserProfile) -> AppResult<LoginResponse> {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("JWT error: {}", e)))?;
        Ok(LoginResponse { access_token })
    }

    pub async fn login(&self, body: &Value) -> AppResult<LoginResponse> {
        let user = self.validate_user(body).await?;
        tracing::info!("User {} logged in", user.id);
        self.jwt_sign(&user)
    }

    pub async fn update_profile(&self, user_id: Uuid, body: &Value) -> AppResult<UserProfile> {
        let req = validation::update_profile(body)?;

        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!("Updating profile for user {}", user_id);
        self.store
            .update_user_name(user_id, &req.name)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
