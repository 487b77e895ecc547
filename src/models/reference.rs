/// Entities an item can point at through a nullable foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Category,
    Condition,
    Location,
    Status,
}

impl ReferenceKind {
    /// Fixed order in which item references are checked and reported.
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Category,
        ReferenceKind::Condition,
        ReferenceKind::Location,
        ReferenceKind::Status,
    ];

    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::Category => "categories",
            ReferenceKind::Condition => "conditions",
            ReferenceKind::Location => "locations",
            ReferenceKind::Status => "statuses",
        }
    }

    /// Foreign-key column on `items` that points at this kind.
    pub fn item_column(self) -> &'static str {
        match self {
            ReferenceKind::Category => "category_id",
            ReferenceKind::Condition => "condition_id",
            ReferenceKind::Location => "location_id",
            ReferenceKind::Status => "status_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::Category => "Category",
            ReferenceKind::Condition => "Condition",
            ReferenceKind::Location => "Location",
            ReferenceKind::Status => "Status",
        }
    }

    pub fn not_found(self) -> String {
        format!("{} not found", self.label())
    }

    pub fn in_use(self) -> String {
        format!("{} is in use", self.label())
    }
}
