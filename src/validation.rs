//! Request validation.
//!
//! Every request body is validated here before any service logic runs.
//! Validators collect all failing rules and report them together as
//! `AppError::Validation`, each issue addressed by its JSON path.
//!
//! Fields follow three states: absent (left untouched on update), `null`
//! (clears the column on update, rejected on create), or a value that must
//! satisfy the field's rules.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ValidationIssue};
use crate::models::{
    ItemPatch, LocationPatch, LoginRequest, LookupPatch, NewItem, NewLocation, NewLookup,
    RegisterRequest, UpdateProfileRequest,
};

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
});

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 255;

/// A single field read from the request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Missing,
    Null(&'static str),
    Invalid,
    Present(T),
}

impl<T> Field<T> {
    /// The value, if one was read.
    pub fn optional(self) -> Option<T> {
        match self {
            Field::Present(v) => Some(v),
            _ => None,
        }
    }

    /// `None` when absent, `Some(None)` when explicitly null.
    pub fn patch(self) -> Option<Option<T>> {
        match self {
            Field::Present(v) => Some(Some(v)),
            Field::Null(_) => Some(None),
            Field::Missing | Field::Invalid => None,
        }
    }
}

/// Reads typed fields out of a JSON object, accumulating issues.
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    issues: Vec<ValidationIssue>,
}

impl<'a> Fields<'a> {
    pub fn new(body: &'a Value) -> AppResult<Self> {
        match body {
            Value::Object(map) => Ok(Self {
                map,
                issues: Vec::new(),
            }),
            other => Err(AppError::Validation(vec![ValidationIssue::new(
                "",
                format!("Expected object, received {}", type_name(other)),
            )])),
        }
    }

    fn issue(&mut self, key: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(key, message));
    }

    fn read<T>(
        &mut self,
        key: &str,
        expected: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Field<T> {
        match self.map.get(key) {
            None => Field::Missing,
            Some(Value::Null) => Field::Null(expected),
            Some(value) => match parse(value) {
                Ok(v) => Field::Present(v),
                Err(message) => {
                    self.issue(key, message);
                    Field::Invalid
                }
            },
        }
    }

    pub fn string(&mut self, key: &str, min: usize, max: usize) -> Field<String> {
        self.read(key, "string", |value| {
            let s = expect_str(value)?;
            let len = s.chars().count();
            if len < min {
                return Err(format!("String must contain at least {} character(s)", min));
            }
            if len > max {
                return Err(format!("String must contain at most {} character(s)", max));
            }
            Ok(s.to_string())
        })
    }

    pub fn email(&mut self, key: &str) -> Field<String> {
        self.read(key, "string", |value| {
            let s = expect_str(value)?;
            if RE_EMAIL.is_match(s) {
                Ok(s.to_string())
            } else {
                Err("Invalid email".to_string())
            }
        })
    }

    pub fn url(&mut self, key: &str) -> Field<String> {
        self.read(key, "string", |value| {
            let s = expect_str(value)?;
            url::Url::parse(s)
                .map(|_| s.to_string())
                .map_err(|_| "Invalid url".to_string())
        })
    }

    pub fn uuid(&mut self, key: &str) -> Field<Uuid> {
        self.read(key, "string", |value| {
            let s = expect_str(value)?;
            Uuid::parse_str(s).map_err(|_| "Invalid UUID".to_string())
        })
    }

    /// Accepts a JSON number or a numeric string.
    pub fn number(&mut self, key: &str) -> Field<f64> {
        self.read(key, "number", |value| {
            let n = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                other => {
                    return Err(format!("Expected number, received {}", type_name(other)));
                }
            };
            match n {
                Some(n) if n.is_finite() => Ok(n),
                _ => Err("Expected number, received nan".to_string()),
            }
        })
    }

    /// Accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
    pub fn timestamp(&mut self, key: &str) -> Field<DateTime<Utc>> {
        self.read(key, "date", |value| {
            let s = expect_str(value)?;
            parse_timestamp(s).ok_or_else(|| "Invalid date".to_string())
        })
    }

    /// Records an issue unless the field carries a value.
    pub fn require<T>(&mut self, key: &str, field: Field<T>) -> Option<T> {
        match field {
            Field::Present(v) => Some(v),
            Field::Missing => {
                self.issue(key, "Required");
                None
            }
            Field::Null(expected) => {
                self.issue(key, format!("Expected {}, received null", expected));
                None
            }
            Field::Invalid => None,
        }
    }

    /// Optional on create, and on update for columns that may not be cleared:
    /// absent is fine, `null` is an issue.
    pub fn non_null<T>(&mut self, key: &str, field: Field<T>) -> Option<T> {
        match field {
            Field::Null(expected) => {
                self.issue(key, format!("Expected {}, received null", expected));
                None
            }
            other => other.optional(),
        }
    }

    /// Fails with every collected issue, or yields the assembled request.
    pub fn finish<T>(self, value: Option<T>) -> AppResult<T> {
        if !self.issues.is_empty() {
            return Err(AppError::Validation(self.issues));
        }
        value.ok_or_else(|| AppError::Internal("Validated request is incomplete".to_string()))
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Expected string, received {}", type_name(value)))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Resolves a path id. A malformed id cannot name an existing row, so it is
/// reported the same way as a missing one.
pub fn parse_id(raw: &str, label: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", label)))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub fn register(body: &Value) -> AppResult<RegisterRequest> {
    let mut f = Fields::new(body)?;
    let email = f.email("email");
    let email = f.require("email", email);
    let password = f.string("password", 6, 100);
    let password = f.require("password", password);
    let name = f.string("name", 4, NAME_MAX);
    let name = f.require("name", name);

    let request = match (email, password, name) {
        (Some(email), Some(password), Some(name)) => Some(RegisterRequest {
            email,
            password,
            name,
        }),
        _ => None,
    };
    f.finish(request)
}

pub fn login(body: &Value) -> AppResult<LoginRequest> {
    let mut f = Fields::new(body)?;
    let email = f.email("email");
    let email = f.require("email", email);
    let password = f.string("password", 6, 100);
    let password = f.require("password", password);

    let request = match (email, password) {
        (Some(email), Some(password)) => Some(LoginRequest { email, password }),
        _ => None,
    };
    f.finish(request)
}

pub fn update_profile(body: &Value) -> AppResult<UpdateProfileRequest> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 4, NAME_MAX);
    let name = f.require("name", name);
    f.finish(name.map(|name| UpdateProfileRequest { name }))
}

// ---------------------------------------------------------------------------
// Categories, conditions, statuses, actions
// ---------------------------------------------------------------------------

pub fn create_lookup(body: &Value) -> AppResult<NewLookup> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 1, NAME_MAX);
    let name = f.require("name", name);
    let description = f.string("description", 0, DESCRIPTION_MAX);
    let description = f.non_null("description", description);
    f.finish(name.map(|name| NewLookup { name, description }))
}

pub fn update_lookup(body: &Value) -> AppResult<LookupPatch> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 1, NAME_MAX);
    let name = f.non_null("name", name);
    let description = f.string("description", 0, DESCRIPTION_MAX).patch();
    f.finish(Some(LookupPatch { name, description }))
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

pub fn create_location(body: &Value) -> AppResult<NewLocation> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 4, NAME_MAX);
    let name = f.require("name", name);
    let address = f.string("address", 4, NAME_MAX);
    let address = f.non_null("address", address);
    let latitude = f.number("latitude");
    let latitude = f.non_null("latitude", latitude);
    let longitude = f.number("longitude");
    let longitude = f.non_null("longitude", longitude);
    f.finish(name.map(|name| NewLocation {
        name,
        address,
        latitude,
        longitude,
    }))
}

pub fn update_location(body: &Value) -> AppResult<LocationPatch> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 4, NAME_MAX);
    let name = f.non_null("name", name);
    let address = f.string("address", 4, NAME_MAX).patch();
    let latitude = f.number("latitude").patch();
    let longitude = f.number("longitude").patch();
    f.finish(Some(LocationPatch {
        name,
        address,
        latitude,
        longitude,
    }))
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

pub fn create_item(body: &Value) -> AppResult<NewItem> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 1, NAME_MAX);
    let name = f.require("name", name);
    let description = f.string("description", 0, DESCRIPTION_MAX);
    let description = f.non_null("description", description);
    let purchase_price = f.number("purchasePrice");
    let purchase_price = f.non_null("purchasePrice", purchase_price);
    let sell_price = f.number("sellPrice");
    let sell_price = f.non_null("sellPrice", sell_price);
    let estimated_value = f.number("estimatedValue");
    let estimated_value = f.non_null("estimatedValue", estimated_value);
    let purchase_date = f.timestamp("purchaseDate");
    let purchase_date = f.non_null("purchaseDate", purchase_date);
    let expired_date = f.timestamp("expiredDate");
    let expired_date = f.non_null("expiredDate", expired_date);
    let image = f.url("image");
    let image = f.non_null("image", image);
    let category_id = f.uuid("categoryId");
    let category_id = f.non_null("categoryId", category_id);
    let condition_id = f.uuid("conditionId");
    let condition_id = f.non_null("conditionId", condition_id);
    let location_id = f.uuid("locationId");
    let location_id = f.non_null("locationId", location_id);
    let status_id = f.uuid("statusId");
    let status_id = f.non_null("statusId", status_id);

    f.finish(name.map(|name| NewItem {
        name,
        description,
        purchase_price,
        sell_price,
        estimated_value,
        purchase_date,
        expired_date,
        image,
        category_id,
        condition_id,
        location_id,
        status_id,
    }))
}

pub fn update_item(body: &Value) -> AppResult<ItemPatch> {
    let mut f = Fields::new(body)?;
    let name = f.string("name", 1, NAME_MAX);
    let name = f.non_null("name", name);

    let patch = ItemPatch {
        name,
        description: f.string("description", 0, DESCRIPTION_MAX).patch(),
        purchase_price: f.number("purchasePrice").patch(),
        sell_price: f.number("sellPrice").patch(),
        estimated_value: f.number("estimatedValue").patch(),
        purchase_date: f.timestamp("purchaseDate").patch(),
        expired_date: f.timestamp("expiredDate").patch(),
        image: f.url("image").patch(),
        category_id: f.uuid("categoryId").patch(),
        condition_id: f.uuid("conditionId").patch(),
        location_id: f.uuid("locationId").patch(),
        status_id: f.uuid("statusId").patch(),
    };
    f.finish(Some(patch))
}
