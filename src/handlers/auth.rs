use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::{Data, JsonBody};
use crate::error::AppResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{LoginResponse, RegisteredUser, UserProfile};
use crate::services::AuthService;

/// Routes reachable without a token.
pub fn public_router(service: AuthService) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .with_state(service)
}

pub fn protected_router(service: AuthService) -> Router {
    Router::new()
        .route("/api/auth/profile", get(profile).put(update_profile))
        .with_state(service)
}

async fn register(
    State(service): State<AuthService>,
    JsonBody(body): JsonBody,
) -> AppResult<(StatusCode, Json<Data<RegisteredUser>>)> {
    let user = service.register(&body).await?;
    Ok((StatusCode::CREATED, Data::new(user)))
}

async fn login(
    State(service): State<AuthService>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<Data<LoginResponse>>> {
    let token = service.login(&body).await?;
    Ok(Data::new(token))
}

/// Echoes the identity carried by the token.
async fn profile(user: AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "id": user.user_id,
        "email": user.email,
        "name": user.name,
    }))
}

async fn update_profile(
    State(service): State<AuthService>,
    user: AuthenticatedUser,
    JsonBody(body): JsonBody,
) -> AppResult<Json<Data<UserProfile>>> {
    let profile = service.update_profile(user.user_id, &body).await?;
    Ok(Data::new(profile))
}
