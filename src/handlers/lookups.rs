use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::{list_response, Data, JsonBody};
use crate::error::AppResult;
use crate::middleware::AuthenticatedUser;
use crate::models::LookupModel;
use crate::services::LookupService;
use crate::validation::parse_id;

/// CRUD routes for one lookup kind, mounted under its collection path.
pub fn router(service: LookupService) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(destroy))
        .with_state(service)
}

async fn create(
    State(service): State<LookupService>,
    user: AuthenticatedUser,
    JsonBody(body): JsonBody,
) -> AppResult<(StatusCode, Json<Data<LookupModel>>)> {
    let model = service.create(user.user_id, &body).await?;
    Ok((StatusCode::CREATED, Data::new(model)))
}

async fn list(
    State(service): State<LookupService>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let rows = service.list(user.user_id).await?;
    list_response(service.kind().list_key(), rows)
}

async fn show(
    State(service): State<LookupService>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<LookupModel>>> {
    let id = parse_id(&id, service.kind().label())?;
    Ok(Data::new(service.get(id).await?))
}

async fn update(
    State(service): State<LookupService>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<Data<LookupModel>>> {
    let id = parse_id(&id, service.kind().label())?;
    Ok(Data::new(service.update(user.user_id, id, &body).await?))
}

async fn destroy(
    State(service): State<LookupService>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, service.kind().label())?;
    service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
