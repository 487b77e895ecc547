use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Datastore, DeleteOutcome};
use crate::error::{AppError, AppResult};
use crate::models::{
    ItemModel, ItemPatch, LocationModel, LocationPatch, LookupKind, LookupModel, LookupPatch,
    NewItem, NewLocation, NewLookup, NewUser, ReferenceKind, UserModel, USER_EXISTS,
};

const USER_COLUMNS: &str = "id, email, password, name, created_at, updated_at";
const LOOKUP_COLUMNS: &str = "id, name, description, user_id, created_at, updated_at";
const LOCATION_COLUMNS: &str =
    "id, name, address, latitude, longitude, user_id, created_at, updated_at";

/// Selects items from `source` (a table or CTE name) joined with the names of
/// the entities they reference.
fn item_select(source: &str) -> String {
    format!(
        "SELECT i.id, i.name, i.description, i.purchase_price, i.sell_price, i.estimated_value, \
         i.purchase_date, i.expired_date, i.image, i.category_id, i.condition_id, i.location_id, \
         i.status_id, i.owner_id, i.created_at, i.updated_at, \
         c.name AS category, cd.name AS condition, l.name AS location, s.name AS status \
         FROM {} i \
         LEFT JOIN categories c ON c.id = i.category_id \
         LEFT JOIN conditions cd ON cd.id = i.condition_id \
         LEFT JOIN locations l ON l.id = i.location_id \
         LEFT JOIN statuses s ON s.id = i.status_id",
        source
    )
}

/// PostgreSQL-backed datastore.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserModel>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<UserModel> {
        let sql = format!(
            "INSERT INTO users (id, email, password, name) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    AppError::Conflict(USER_EXISTS.to_string())
                }
                _ => AppError::from(e),
            })?;
        Ok(created)
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> AppResult<Option<UserModel>> {
        let sql = format!(
            "UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as(&sql)
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_lookup(
        &self,
        kind: LookupKind,
        user_id: Uuid,
        input: NewLookup,
    ) -> AppResult<LookupModel> {
        let sql = format!(
            "INSERT INTO {} (id, name, description, user_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            kind.table(),
            LOOKUP_COLUMNS
        );
        let model = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(model)
    }

    async fn list_lookups(&self, kind: LookupKind, user_id: Uuid) -> AppResult<Vec<LookupModel>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at ASC",
            LOOKUP_COLUMNS,
            kind.table()
        );
        let models = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(models)
    }

    async fn find_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<Option<LookupModel>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", LOOKUP_COLUMNS, kind.table());
        let model = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn update_lookup(
        &self,
        kind: LookupKind,
        id: Uuid,
        user_id: Uuid,
        patch: LookupPatch,
    ) -> AppResult<Option<LookupModel>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET updated_at = NOW()", kind.table()));
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND user_id = ").push_bind(user_id);
        qb.push(" RETURNING ").push(LOOKUP_COLUMNS);

        let model = qb
            .build_query_as::<LookupModel>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn delete_lookup(&self, kind: LookupKind, id: Uuid) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn create_location(&self, user_id: Uuid, input: NewLocation) -> AppResult<LocationModel> {
        let sql = format!(
            "INSERT INTO locations (id, name, address, latitude, longitude, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            LOCATION_COLUMNS
        );
        let model = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.address)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(model)
    }

    async fn list_locations(&self, user_id: Uuid) -> AppResult<Vec<LocationModel>> {
        let sql = format!(
            "SELECT {} FROM locations WHERE user_id = $1 ORDER BY created_at ASC",
            LOCATION_COLUMNS
        );
        let models = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(models)
    }

    async fn find_location(&self, id: Uuid) -> AppResult<Option<LocationModel>> {
        let sql = format!("SELECT {} FROM locations WHERE id = $1", LOCATION_COLUMNS);
        let model = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn update_location(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: LocationPatch,
    ) -> AppResult<Option<LocationModel>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE locations SET updated_at = NOW()");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(address) = patch.address {
            qb.push(", address = ").push_bind(address);
        }
        if let Some(latitude) = patch.latitude {
            qb.push(", latitude = ").push_bind(latitude);
        }
        if let Some(longitude) = patch.longitude {
            qb.push(", longitude = ").push_bind(longitude);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND user_id = ").push_bind(user_id);
        qb.push(" RETURNING ").push(LOCATION_COLUMNS);

        let model = qb
            .build_query_as::<LocationModel>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn reference_exists(&self, kind: ReferenceKind, id: Uuid) -> AppResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.table());
        let exists = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_unreferenced(&self, kind: ReferenceKind, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock conflicts with the key-share lock an item insert takes
        // through the foreign key, so no item can start pointing here until
        // this transaction ends.
        let lock_sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", kind.table());
        let locked: Option<Uuid> = sqlx::query_scalar(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(DeleteOutcome::Missing);
        }

        let count_sql = format!("SELECT COUNT(*) FROM items WHERE {} = $1", kind.item_column());
        let in_use: i64 = sqlx::query_scalar(&count_sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if in_use > 0 {
            tx.rollback().await?;
            return Ok(DeleteOutcome::InUse(in_use));
        }

        let delete_sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        sqlx::query(&delete_sql).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(DeleteOutcome::Deleted)
    }

    async fn create_item(&self, owner_id: Uuid, input: NewItem) -> AppResult<ItemModel> {
        let sql = format!(
            "WITH written AS ( \
             INSERT INTO items (id, name, description, purchase_price, sell_price, estimated_value, \
             purchase_date, expired_date, image, category_id, condition_id, location_id, status_id, \
             owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING * ) {}",
            item_select("written")
        );
        let model = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.purchase_price)
            .bind(input.sell_price)
            .bind(input.estimated_value)
            .bind(input.purchase_date)
            .bind(input.expired_date)
            .bind(&input.image)
            .bind(input.category_id)
            .bind(input.condition_id)
            .bind(input.location_id)
            .bind(input.status_id)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(model)
    }

    async fn list_items(&self, owner_id: Uuid) -> AppResult<Vec<ItemModel>> {
        let sql = format!(
            "{} WHERE i.owner_id = $1 ORDER BY i.created_at ASC",
            item_select("items")
        );
        let models = sqlx::query_as(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(models)
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<ItemModel>> {
        let sql = format!("{} WHERE i.id = $1", item_select("items"));
        let model = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn update_item(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: ItemPatch,
    ) -> AppResult<Option<ItemModel>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("WITH written AS ( UPDATE items SET updated_at = NOW()");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(price) = patch.purchase_price {
            qb.push(", purchase_price = ").push_bind(price);
        }
        if let Some(price) = patch.sell_price {
            qb.push(", sell_price = ").push_bind(price);
        }
        if let Some(value) = patch.estimated_value {
            qb.push(", estimated_value = ").push_bind(value);
        }
        if let Some(date) = patch.purchase_date {
            qb.push(", purchase_date = ").push_bind(date);
        }
        if let Some(date) = patch.expired_date {
            qb.push(", expired_date = ").push_bind(date);
        }
        if let Some(image) = patch.image {
            qb.push(", image = ").push_bind(image);
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if let Some(condition_id) = patch.condition_id {
            qb.push(", condition_id = ").push_bind(condition_id);
        }
        if let Some(location_id) = patch.location_id {
            qb.push(", location_id = ").push_bind(location_id);
        }
        if let Some(status_id) = patch.status_id {
            qb.push(", status_id = ").push_bind(status_id);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND owner_id = ").push_bind(owner_id);
        qb.push(" RETURNING * ) ").push(item_select("written"));

        let model = qb
            .build_query_as::<ItemModel>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
