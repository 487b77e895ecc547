use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Datastore, DeleteOutcome};
use crate::error::{AppError, AppResult};
use crate::models::{
    ItemModel, ItemPatch, LocationModel, LocationPatch, LookupKind, LookupModel, LookupPatch,
    NewItem, NewLocation, NewLookup, NewUser, ReferenceKind, UserModel, USER_EXISTS,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserModel>,
    lookups: HashMap<LookupKind, Vec<LookupModel>>,
    locations: Vec<LocationModel>,
    items: Vec<ItemModel>,
}

impl Tables {
    fn reference_name(&self, kind: ReferenceKind, id: Option<Uuid>) -> Option<String> {
        let id = id?;
        match kind {
            ReferenceKind::Location => self
                .locations
                .iter()
                .find(|l| l.id == id)
                .map(|l| l.name.clone()),
            ReferenceKind::Category => self.lookup_name(LookupKind::Category, id),
            ReferenceKind::Condition => self.lookup_name(LookupKind::Condition, id),
            ReferenceKind::Status => self.lookup_name(LookupKind::Status, id),
        }
    }

    fn lookup_name(&self, kind: LookupKind, id: Uuid) -> Option<String> {
        self.lookups
            .get(&kind)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .map(|r| r.name.clone())
    }

    fn joined(&self, item: &ItemModel) -> ItemModel {
        ItemModel {
            category: self.reference_name(ReferenceKind::Category, item.category_id),
            condition: self.reference_name(ReferenceKind::Condition, item.condition_id),
            location: self.reference_name(ReferenceKind::Location, item.location_id),
            status: self.reference_name(ReferenceKind::Status, item.status_id),
            ..item.clone()
        }
    }

    fn exists(&self, kind: ReferenceKind, id: Uuid) -> bool {
        self.reference_name(kind, Some(id)).is_some()
    }
}

/// In-memory datastore for service and router tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserModel>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<UserModel> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(USER_EXISTS.to_string()));
        }

        let now = Utc::now();
        let model = UserModel {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(model.clone());
        Ok(model)
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> AppResult<Option<UserModel>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.name = name.to_string();
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn create_lookup(
        &self,
        kind: LookupKind,
        user_id: Uuid,
        input: NewLookup,
    ) -> AppResult<LookupModel> {
        let now = Utc::now();
        let model = LookupModel {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            user_id,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.tables.write().await;
        tables.lookups.entry(kind).or_default().push(model.clone());
        Ok(model)
    }

    async fn list_lookups(&self, kind: LookupKind, user_id: Uuid) -> AppResult<Vec<LookupModel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .lookups
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| r.user_id == user_id).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<Option<LookupModel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .lookups
            .get(&kind)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn update_lookup(
        &self,
        kind: LookupKind,
        id: Uuid,
        user_id: Uuid,
        patch: LookupPatch,
    ) -> AppResult<Option<LookupModel>> {
        let mut tables = self.tables.write().await;
        let row = tables
            .lookups
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id && r.user_id == user_id));
        Ok(row.map(|r| {
            if let Some(name) = patch.name {
                r.name = name;
            }
            if let Some(description) = patch.description {
                r.description = description;
            }
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn delete_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.lookups.get_mut(&kind) {
            rows.retain(|r| r.id != id);
        }
        Ok(())
    }

    async fn create_location(&self, user_id: Uuid, input: NewLocation) -> AppResult<LocationModel> {
        let now = Utc::now();
        let model = LocationModel {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.locations.push(model.clone());
        Ok(model)
    }

    async fn list_locations(&self, user_id: Uuid) -> AppResult<Vec<LocationModel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_location(&self, id: Uuid) -> AppResult<Option<LocationModel>> {
        let tables = self.tables.read().await;
        Ok(tables.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn update_location(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: LocationPatch,
    ) -> AppResult<Option<LocationModel>> {
        let mut tables = self.tables.write().await;
        let row = tables
            .locations
            .iter_mut()
            .find(|l| l.id == id && l.user_id == user_id);
        Ok(row.map(|l| {
            if let Some(name) = patch.name {
                l.name = name;
            }
            if let Some(address) = patch.address {
                l.address = address;
            }
            if let Some(latitude) = patch.latitude {
                l.latitude = latitude;
            }
            if let Some(longitude) = patch.longitude {
                l.longitude = longitude;
            }
            l.updated_at = Utc::now();
            l.clone()
        }))
    }

    async fn reference_exists(&self, kind: ReferenceKind, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.read().await.exists(kind, id))
    }

    async fn delete_unreferenced(&self, kind: ReferenceKind, id: Uuid) -> AppResult<DeleteOutcome> {
        // A single write guard covers the count and the delete.
        let mut tables = self.tables.write().await;
        if !tables.exists(kind, id) {
            return Ok(DeleteOutcome::Missing);
        }

        let in_use = tables
            .items
            .iter()
            .filter(|item| item.references().get(kind) == Some(id))
            .count() as i64;
        if in_use > 0 {
            return Ok(DeleteOutcome::InUse(in_use));
        }

        match kind {
            ReferenceKind::Location => tables.locations.retain(|l| l.id != id),
            ReferenceKind::Category => remove_lookup(&mut tables, LookupKind::Category, id),
            ReferenceKind::Condition => remove_lookup(&mut tables, LookupKind::Condition, id),
            ReferenceKind::Status => remove_lookup(&mut tables, LookupKind::Status, id),
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn create_item(&self, owner_id: Uuid, input: NewItem) -> AppResult<ItemModel> {
        let now = Utc::now();
        let model = ItemModel {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            purchase_price: input.purchase_price,
            sell_price: input.sell_price,
            estimated_value: input.estimated_value,
            purchase_date: input.purchase_date,
            expired_date: input.expired_date,
            image: input.image,
            category_id: input.category_id,
            condition_id: input.condition_id,
            location_id: input.location_id,
            status_id: input.status_id,
            owner_id,
            created_at: now,
            updated_at: now,
            category: None,
            condition: None,
            location: None,
            status: None,
        };
        let mut tables = self.tables.write().await;
        tables.items.push(model.clone());
        Ok(tables.joined(&model))
    }

    async fn list_items(&self, owner_id: Uuid) -> AppResult<Vec<ItemModel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .map(|i| tables.joined(i))
            .collect())
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<ItemModel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|i| tables.joined(i)))
    }

    async fn update_item(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: ItemPatch,
    ) -> AppResult<Option<ItemModel>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .items
            .iter_mut()
            .find(|i| i.id == id && i.owner_id == owner_id)
        else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(v) = patch.description {
            item.description = v;
        }
        if let Some(v) = patch.purchase_price {
            item.purchase_price = v;
        }
        if let Some(v) = patch.sell_price {
            item.sell_price = v;
        }
        if let Some(v) = patch.estimated_value {
            item.estimated_value = v;
        }
        if let Some(v) = patch.purchase_date {
            item.purchase_date = v;
        }
        if let Some(v) = patch.expired_date {
            item.expired_date = v;
        }
        if let Some(v) = patch.image {
            item.image = v;
        }
        if let Some(v) = patch.category_id {
            item.category_id = v;
        }
        if let Some(v) = patch.condition_id {
            item.condition_id = v;
        }
        if let Some(v) = patch.location_id {
            item.location_id = v;
        }
        if let Some(v) = patch.status_id {
            item.status_id = v;
        }
        item.updated_at = Utc::now();

        let updated = item.clone();
        Ok(Some(tables.joined(&updated)))
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.items.retain(|i| i.id != id);
        Ok(())
    }
}

fn remove_lookup(tables: &mut Tables, kind: LookupKind, id: Uuid) {
    if let Some(rows) = tables.lookups.get_mut(&kind) {
        rows.retain(|r| r.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_email() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice@example.com")).await.unwrap();

        let err = store
            .create_user(new_user("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == USER_EXISTS));

        store.create_user(new_user("bob@example.com")).await.unwrap();
        assert_eq!(store.tables.read().await.users.len(), 2);
    }
}
