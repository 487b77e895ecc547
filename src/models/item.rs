use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::ReferenceKind;

/// An item joined with the display names of the entities it references.
/// A null reference yields a null name.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub purchase_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub estimated_value: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expired_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
    pub condition_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl ItemModel {
    pub fn references(&self) -> ItemReferences {
        ItemReferences {
            category_id: self.category_id,
            condition_id: self.condition_id,
            location_id: self.location_id,
            status_id: self.status_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub purchase_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub estimated_value: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expired_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
    pub condition_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
}

impl NewItem {
    pub fn references(&self) -> ItemReferences {
        ItemReferences {
            category_id: self.category_id,
            condition_id: self.condition_id,
            location_id: self.location_id,
            status_id: self.status_id,
        }
    }
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub purchase_price: Option<Option<f64>>,
    pub sell_price: Option<Option<f64>>,
    pub estimated_value: Option<Option<f64>>,
    pub purchase_date: Option<Option<DateTime<Utc>>>,
    pub expired_date: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub condition_id: Option<Option<Uuid>>,
    pub location_id: Option<Option<Uuid>>,
    pub status_id: Option<Option<Uuid>>,
}

impl ItemPatch {
    /// References that the patch sets to a concrete id. Cleared or untouched
    /// references need no existence check.
    pub fn references(&self) -> ItemReferences {
        ItemReferences {
            category_id: self.category_id.flatten(),
            condition_id: self.condition_id.flatten(),
            location_id: self.location_id.flatten(),
            status_id: self.status_id.flatten(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemReferences {
    pub category_id: Option<Uuid>,
    pub condition_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
}

impl ItemReferences {
    pub fn get(&self, kind: ReferenceKind) -> Option<Uuid> {
        match kind {
            ReferenceKind::Category => self.category_id,
            ReferenceKind::Condition => self.condition_id,
            ReferenceKind::Location => self.location_id,
            ReferenceKind::Status => self.status_id,
        }
    }
}
