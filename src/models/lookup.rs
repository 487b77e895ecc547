use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::ReferenceKind;

/// User-owned `{name, description}` vocabularies. Categories, conditions and
/// statuses can be referenced by items; actions cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Category,
    Condition,
    Status,
    Action,
}

impl LookupKind {
    pub fn table(self) -> &'static str {
        self.list_key()
    }

    pub fn label(self) -> &'static str {
        match self {
            LookupKind::Category => "Category",
            LookupKind::Condition => "Condition",
            LookupKind::Status => "Status",
            LookupKind::Action => "Action",
        }
    }

    /// Key under which list responses are wrapped, e.g. `{"categories": [...]}`.
    pub fn list_key(self) -> &'static str {
        match self {
            LookupKind::Category => "categories",
            LookupKind::Condition => "conditions",
            LookupKind::Status => "statuses",
            LookupKind::Action => "actions",
        }
    }

    pub fn reference(self) -> Option<ReferenceKind> {
        match self {
            LookupKind::Category => Some(ReferenceKind::Category),
            LookupKind::Condition => Some(ReferenceKind::Condition),
            LookupKind::Status => Some(ReferenceKind::Status),
            LookupKind::Action => None,
        }
    }

    pub fn not_found(self) -> String {
        format!("{} not found", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLookup {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct LookupPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}
