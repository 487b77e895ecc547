use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::AuthLayer;
use crate::models::LookupKind;
use crate::services::{AuthService, ItemService, LocationService, LookupService};
use crate::store::Datastore;

/// Services shared by the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub categories: LookupService,
    pub conditions: LookupService,
    pub statuses: LookupService,
    pub actions: LookupService,
    pub locations: LocationService,
    pub items: ItemService,
}

impl AppState {
    pub fn new(store: Arc<dyn Datastore>, jwt_secret: String) -> Self {
        Self::with_auth(store.clone(), AuthService::new(store, jwt_secret))
    }

    pub fn with_auth(store: Arc<dyn Datastore>, auth: AuthService) -> Self {
        Self {
            auth,
            categories: LookupService::new(store.clone(), LookupKind::Category),
            conditions: LookupService::new(store.clone(), LookupKind::Condition),
            statuses: LookupService::new(store.clone(), LookupKind::Status),
            actions: LookupService::new(store.clone(), LookupKind::Action),
            locations: LocationService::new(store.clone()),
            items: ItemService::new(store),
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let protected = Router::new()
        .merge(handlers::auth::protected_router(state.auth.clone()))
        .nest("/api/categories", handlers::lookups::router(state.categories))
        .nest("/api/conditions", handlers::lookups::router(state.conditions))
        .nest("/api/statuses", handlers::lookups::router(state.statuses))
        .nest("/api/actions", handlers::lookups::router(state.actions))
        .nest("/api/locations", handlers::locations::router(state.locations))
        .nest("/api/items", handlers::items::router(state.items))
        .route_layer(AuthLayer::new(state.auth.jwt_secret()));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(handlers::auth::public_router(state.auth))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
}
