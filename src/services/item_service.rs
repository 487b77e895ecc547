use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ItemModel, ItemReferences, ReferenceKind};
use crate::store::Datastore;
use crate::validation;

const NOT_FOUND: &str = "Item not found";

#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn Datastore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Looks up every provided reference id concurrently and reports the
    /// first missing one in category, condition, location, status order.
    async fn check_references(&self, refs: ItemReferences) -> AppResult<()> {
        let (category, condition, location, status) = tokio::join!(
            self.reference_exists(ReferenceKind::Category, refs.category_id),
            self.reference_exists(ReferenceKind::Condition, refs.condition_id),
            self.reference_exists(ReferenceKind::Location, refs.location_id),
            self.reference_exists(ReferenceKind::Status, refs.status_id),
        );

        for (kind, found) in ReferenceKind::ALL
            .into_iter()
            .zip([category, condition, location, status])
        {
            if !found? {
                return Err(AppError::NotFound(kind.not_found()));
            }
        }
        Ok(())
    }

    async fn reference_exists(&self, kind: ReferenceKind, id: Option<Uuid>) -> AppResult<bool> {
        match id {
            Some(id) => self.store.reference_exists(kind, id).await,
            None => Ok(true),
        }
    }

    pub async fn create(&self, user_id: Uuid, body: &Value) -> AppResult<ItemModel> {
        let input = validation::create_item(body)?;
        self.check_references(input.references()).await?;

        tracing::info!("Creating item for user {}", user_id);
        self.store.create_item(user_id, input).await
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<ItemModel>> {
        self.store.list_items(user_id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ItemModel> {
        self.store
            .find_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, body: &Value) -> AppResult<ItemModel> {
        let patch = validation::update_item(body)?;
        self.get(id).await?;
        self.check_references(patch.references()).await?;

        tracing::info!("Updating item {} for user {}", id, user_id);
        self.store
            .update_item(id, user_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        if existing.owner_id != user_id {
            tracing::warn!("User {} attempted to delete item {}", user_id, id);
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }

        tracing::info!("Deleting item {}", id);
        self.store.delete_item(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LookupKind, NewLocation, NewLookup};
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ItemService,
        user: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            Self {
                service: ItemService::new(store.clone()),
                store,
                user: Uuid::new_v4(),
            }
        }

        async fn lookup(&self, kind: LookupKind, name: &str) -> Uuid {
            self.store
                .create_lookup(
                    kind,
                    self.user,
                    NewLookup {
                        name: name.to_string(),
                        description: None,
                    },
                )
                .await
                .unwrap()
                .id
        }

        async fn location(&self, name: &str) -> Uuid {
            self.store
                .create_location(
                    self.user,
                    NewLocation {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
                .id
        }
    }

    #[tokio::test]
    async fn test_create_denormalizes_reference_names() {
        let fx = Fixture::new();
        let category = fx.lookup(LookupKind::Category, "Books").await;
        let status = fx.lookup(LookupKind::Status, "Owned").await;
        let location = fx.location("Shelf").await;

        let item = fx
            .service
            .create(
                fx.user,
                &json!({
                    "name": "Dune",
                    "purchasePrice": "9.99",
                    "purchaseDate": "2024-03-01",
                    "categoryId": category.to_string(),
                    "locationId": location.to_string(),
                    "statusId": status.to_string(),
                }),
            )
            .await
            .unwrap();

        assert_eq!(item.owner_id, fx.user);
        assert_eq!(item.purchase_price, Some(9.99));
        assert_eq!(item.category.as_deref(), Some("Books"));
        assert_eq!(item.location.as_deref(), Some("Shelf"));
        assert_eq!(item.status.as_deref(), Some("Owned"));
        assert_eq!(item.condition, None);
    }

    #[tokio::test]
    async fn test_get_returns_created_item() {
        let fx = Fixture::new();
        let condition = fx.lookup(LookupKind::Condition, "Worn").await;
        let location = fx.location("Garage").await;
        let created = fx
            .service
            .create(
                fx.user,
                &json!({
                    "name": "Drill",
                    "description": "Cordless",
                    "estimatedValue": 40,
                    "expiredDate": "2030-01-01T00:00:00Z",
                    "conditionId": condition.to_string(),
                    "locationId": location.to_string(),
                }),
            )
            .await
            .unwrap();

        assert_eq!(fx.service.get(created.id).await.unwrap(), created);
        assert_eq!(fx.service.list(fx.user).await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_create_reports_first_missing_reference_in_fixed_order() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create(
                fx.user,
                &json!({
                    "name": "Ghost",
                    "statusId": Uuid::new_v4().to_string(),
                    "conditionId": Uuid::new_v4().to_string(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Condition not found"));
        assert!(fx.service.list(fx.user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_all_references_missing_names_category() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create(
                fx.user,
                &json!({
                    "name": "Ghost",
                    "categoryId": Uuid::new_v4().to_string(),
                    "conditionId": Uuid::new_v4().to_string(),
                    "locationId": Uuid::new_v4().to_string(),
                    "statusId": Uuid::new_v4().to_string(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Category not found"));
    }

    #[tokio::test]
    async fn test_list_is_scoped_but_get_is_not() {
        let fx = Fixture::new();
        let other = Uuid::new_v4();
        let item = fx
            .service
            .create(other, &json!({"name": "Lamp"}))
            .await
            .unwrap();

        assert!(fx.service.list(fx.user).await.unwrap().is_empty());
        assert_eq!(fx.service.list(other).await.unwrap().len(), 1);
        assert_eq!(fx.service.get(item.id).await.unwrap().name, "Lamp");
    }

    #[tokio::test]
    async fn test_update_checks_new_references() {
        let fx = Fixture::new();
        let item = fx
            .service
            .create(fx.user, &json!({"name": "Lamp"}))
            .await
            .unwrap();

        let err = fx
            .service
            .update(
                fx.user,
                item.id,
                &json!({"locationId": Uuid::new_v4().to_string()}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Location not found"));

        let shelf = fx.location("Shelf").await;
        let moved = fx
            .service
            .update(fx.user, item.id, &json!({"locationId": shelf.to_string()}))
            .await
            .unwrap();
        assert_eq!(moved.location.as_deref(), Some("Shelf"));
        assert_eq!(moved.name, "Lamp");
    }

    #[tokio::test]
    async fn test_update_name_only_leaves_other_fields() {
        let fx = Fixture::new();
        let condition = fx.lookup(LookupKind::Condition, "Mint").await;
        let created = fx
            .service
            .create(
                fx.user,
                &json!({
                    "name": "Camera",
                    "description": "35mm",
                    "sellPrice": 120,
                    "image": "https://example.com/camera.jpg",
                    "conditionId": condition.to_string(),
                }),
            )
            .await
            .unwrap();

        let updated = fx
            .service
            .update(fx.user, created.id, &json!({"name": "Film camera"}))
            .await
            .unwrap();
        assert_eq!(updated.name, "Film camera");
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.sell_price, Some(120.0));
        assert_eq!(updated.image, created.image);
        assert_eq!(updated.condition_id, Some(condition));
        assert_eq!(updated.condition.as_deref(), Some("Mint"));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_null_reference_clears_it() {
        let fx = Fixture::new();
        let category = fx.lookup(LookupKind::Category, "Books").await;
        let item = fx
            .service
            .create(
                fx.user,
                &json!({"name": "Dune", "categoryId": category.to_string()}),
            )
            .await
            .unwrap();

        let updated = fx
            .service
            .update(fx.user, item.id, &json!({"categoryId": null}))
            .await
            .unwrap();
        assert_eq!(updated.category_id, None);
        assert_eq!(updated.category, None);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_not_found_and_leaves_item() {
        let fx = Fixture::new();
        let item = fx
            .service
            .create(fx.user, &json!({"name": "Lamp"}))
            .await
            .unwrap();

        let err = fx
            .service
            .update(Uuid::new_v4(), item.id, &json!({"name": "Stolen"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Item not found"));
        assert_eq!(fx.service.get(item.id).await.unwrap().name, "Lamp");
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let fx = Fixture::new();
        let item = fx
            .service
            .create(fx.user, &json!({"name": "Lamp"}))
            .await
            .unwrap();

        let err = fx
            .service
            .delete(Uuid::new_v4(), item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        fx.service.delete(fx.user, item.id).await.unwrap();
        assert!(matches!(
            fx.service.get(item.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
