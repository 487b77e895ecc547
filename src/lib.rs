pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::{create_router, AppState};
