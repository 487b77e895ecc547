// Datastore abstraction shared by every service

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    ItemModel, ItemPatch, LocationModel, LocationPatch, LookupKind, LookupModel, LookupPatch,
    NewItem, NewLocation, NewLookup, NewUser, ReferenceKind, UserModel,
};

/// Result of a guarded delete of a reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The row is still referenced by this many items and was kept.
    InUse(i64),
    /// The row disappeared before the delete ran.
    Missing,
}

/// Persistence operations used by the services.
///
/// Scoped writes (`update_*` with an owner id) return `None` when no row
/// matches both the id and the owner.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>>;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserModel>>;

    async fn create_user(&self, user: NewUser) -> AppResult<UserModel>;

    async fn update_user_name(&self, id: Uuid, name: &str) -> AppResult<Option<UserModel>>;

    async fn create_lookup(
        &self,
        kind: LookupKind,
        user_id: Uuid,
        input: NewLookup,
    ) -> AppResult<LookupModel>;

    async fn list_lookups(&self, kind: LookupKind, user_id: Uuid) -> AppResult<Vec<LookupModel>>;

    async fn find_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<Option<LookupModel>>;

    async fn update_lookup(
        &self,
        kind: LookupKind,
        id: Uuid,
        user_id: Uuid,
        patch: LookupPatch,
    ) -> AppResult<Option<LookupModel>>;

    /// Unconditional delete, used for entities nothing references.
    async fn delete_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<()>;

    async fn create_location(&self, user_id: Uuid, input: NewLocation) -> AppResult<LocationModel>;

    async fn list_locations(&self, user_id: Uuid) -> AppResult<Vec<LocationModel>>;

    async fn find_location(&self, id: Uuid) -> AppResult<Option<LocationModel>>;

    async fn update_location(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: LocationPatch,
    ) -> AppResult<Option<LocationModel>>;

    async fn reference_exists(&self, kind: ReferenceKind, id: Uuid) -> AppResult<bool>;

    /// Counts items pointing at the row and deletes it only when the count is
    /// zero. The count and the delete happen atomically.
    async fn delete_unreferenced(&self, kind: ReferenceKind, id: Uuid) -> AppResult<DeleteOutcome>;

    async fn create_item(&self, owner_id: Uuid, input: NewItem) -> AppResult<ItemModel>;

    async fn list_items(&self, owner_id: Uuid) -> AppResult<Vec<ItemModel>>;

    async fn find_item(&self, id: Uuid) -> AppResult<Option<ItemModel>>;

    async fn update_item(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: ItemPatch,
    ) -> AppResult<Option<ItemModel>>;

    async fn delete_item(&self, id: Uuid) -> AppResult<()>;
}
