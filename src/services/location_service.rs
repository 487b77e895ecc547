use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LocationModel, ReferenceKind};
use crate::store::{Datastore, DeleteOutcome};
use crate::validation;

const NOT_FOUND: &str = "Location not found";

#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn Datastore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, body: &Value) -> AppResult<LocationModel> {
        let input = validation::create_location(body)?;
        tracing::info!("Creating location for user {}", user_id);
        self.store.create_location(user_id, input).await
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<LocationModel>> {
        self.store.list_locations(user_id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<LocationModel> {
        self.store
            .find_location(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, body: &Value) -> AppResult<LocationModel> {
        let patch = validation::update_location(body)?;
        self.get(id).await?;

        tracing::info!("Updating location {} for user {}", id, user_id);
        self.store
            .update_location(id, user_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        if existing.user_id != user_id {
            tracing::warn!("User {} attempted to delete location {}", user_id, id);
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }

        match self
            .store
            .delete_unreferenced(ReferenceKind::Location, id)
            .await?
        {
            DeleteOutcome::Deleted => {
                tracing::info!("Deleted location {}", id);
                Ok(())
            }
            DeleteOutcome::InUse(_) => Err(AppError::Conflict(ReferenceKind::Location.in_use())),
            DeleteOutcome::Missing => Err(AppError::NotFound(NOT_FOUND.to_string())),
        }
    }
}
