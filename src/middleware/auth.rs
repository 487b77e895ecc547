use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::response::{IntoResponse, Response};
use http::header::AUTHORIZATION;
use http::request::Parts;
use jsonwebtoken::{DecodingKey, Validation};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth_service::Claims;

/// Authenticated user info injected by the auth middleware into request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl AuthenticatedUser {
    fn from_claims(claims: Claims) -> Option<Self> {
        Some(Self {
            user_id: Uuid::parse_str(&claims.sub).ok()?,
            email: claims.email,
            name: claims.name,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(unauthorized)
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// Decodes a bearer token signed with `jwt_secret`.
pub fn decode_bearer(header: Option<&str>, jwt_secret: &str) -> Option<AuthenticatedUser> {
    let token = header?.strip_prefix("Bearer ")?;
    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?
    .claims;
    AuthenticatedUser::from_claims(claims)
}

/// Rejects requests without a valid bearer token. Apply with
/// `Router::route_layer` so unmatched paths still 404.
#[derive(Clone)]
pub struct AuthLayer {
    jwt_secret: Arc<str>,
}

impl AuthLayer {
    pub fn new(jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt_secret: Arc<str>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let user = decode_bearer(header, &self.jwt_secret);

        Box::pin(async move {
            let Some(user) = user else {
                tracing::warn!("Rejected request to {} without valid token", req.uri().path());
                return Ok(unauthorized().into_response());
            };

            req.extensions_mut().insert(user);
            inner.call(req).await
        })
    }
}
