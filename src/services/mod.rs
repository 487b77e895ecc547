pub mod auth_service;
pub mod item_service;
pub mod location_service;
pub mod lookup_service;

pub use auth_service::{AuthService, Claims, PASSWORD_HASH_COST};
pub use item_service::ItemService;
pub use location_service::LocationService;
pub use lookup_service::LookupService;
