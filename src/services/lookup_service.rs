use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LookupKind, LookupModel};
use crate::store::{Datastore, DeleteOutcome};
use crate::validation;

/// CRUD for the `{name, description}` entities: categories, conditions,
/// statuses and actions. The first three are guarded against deletion while
/// items reference them.
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn Datastore>,
    kind: LookupKind,
}

impl LookupService {
    pub fn new(store: Arc<dyn Datastore>, kind: LookupKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> LookupKind {
        self.kind
    }

    pub async fn create(&self, user_id: Uuid, body: &Value) -> AppResult<LookupModel> {
        let input = validation::create_lookup(body)?;
        tracing::info!("Creating {} for user {}", self.kind.label(), user_id);
        self.store.create_lookup(self.kind, user_id, input).await
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<LookupModel>> {
        self.store.list_lookups(self.kind, user_id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<LookupModel> {
        self.store
            .find_lookup(self.kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(self.kind.not_found()))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, body: &Value) -> AppResult<LookupModel> {
        let patch = validation::update_lookup(body)?;
        self.get(id).await?;

        tracing::info!("Updating {} {} for user {}", self.kind.label(), id, user_id);
        self.store
            .update_lookup(self.kind, id, user_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(self.kind.not_found()))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        if existing.user_id != user_id {
            tracing::warn!(
                "User {} attempted to delete {} {} owned by {}",
                user_id,
                self.kind.label(),
                id,
                existing.user_id
            );
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }

        let Some(reference) = self.kind.reference() else {
            tracing::info!("Deleting {} {}", self.kind.label(), id);
            return self.store.delete_lookup(self.kind, id).await;
        };

        match self.store.delete_unreferenced(reference, id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Deleted {} {}", self.kind.label(), id);
                Ok(())
            }
            DeleteOutcome::InUse(count) => {
                tracing::info!(
                    "{} {} still referenced by {} item(s)",
                    self.kind.label(),
                    id,
                    count
                );
                Err(AppError::Conflict(reference.in_use()))
            }
            DeleteOutcome::Missing => Err(AppError::NotFound(self.kind.not_found())),
        }
    }
}
