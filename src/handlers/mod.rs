//! HTTP handlers. Each resource module exposes a `router` carrying the
//! service it drives as state.

pub mod auth;
pub mod items;
pub mod locations;
pub mod lookups;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult, ValidationIssue};

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

/// Wraps a list under its resource key: `{"data": {"items": [...]}}`.
pub fn list_response<T: Serialize>(key: &str, rows: Vec<T>) -> AppResult<Json<Value>> {
    let rows = serde_json::to_value(rows)
        .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
    let mut inner = Map::new();
    inner.insert(key.to_string(), rows);
    Ok(Json(json!({ "data": Value::Object(inner) })))
}

/// Raw JSON body. Malformed JSON is reported as a validation failure at the
/// root path instead of axum's plain-text rejection.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::Validation(vec![ValidationIssue::new(
                "",
                rejection.body_text(),
            )])),
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
