use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::{list_response, Data, JsonBody};
use crate::error::AppResult;
use crate::middleware::AuthenticatedUser;
use crate::models::LocationModel;
use crate::services::LocationService;
use crate::validation::parse_id;

const LABEL: &str = "Location";

pub fn router(service: LocationService) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(destroy))
        .with_state(service)
}

async fn create(
    State(service): State<LocationService>,
    user: AuthenticatedUser,
    JsonBody(body): JsonBody,
) -> AppResult<(StatusCode, Json<Data<LocationModel>>)> {
    let model = service.create(user.user_id, &body).await?;
    Ok((StatusCode::CREATED, Data::new(model)))
}

async fn list(
    State(service): State<LocationService>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    list_response("locations", service.list(user.user_id).await?)
}

async fn show(
    State(service): State<LocationService>,
    Path(id): Path<String>,
) -> AppResult<Json<Data<LocationModel>>> {
    let id = parse_id(&id, LABEL)?;
    Ok(Data::new(service.get(id).await?))
}

async fn update(
    State(service): State<LocationService>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<Data<LocationModel>>> {
    let id = parse_id(&id, LABEL)?;
    Ok(Data::new(service.update(user.user_id, id, &body).await?))
}

async fn destroy(
    State(service): State<LocationService>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, LABEL)?;
    service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
