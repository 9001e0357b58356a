//! HTTP surface of the portal. Identity is resolved once per request by a
//! middleware layer; each route group then applies its guard chain through the
//! [`Authorized`](super::access::Authorized) extractor.

pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod gcc;
pub(crate) mod requirements;
pub(crate) mod startup;
pub(crate) mod users;

use std::sync::Arc;

use axum::extract::{FromRequest, Request};
use axum::http::header;
use axum::{middleware, Json, Router};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::access::resolve_identity;
use super::domain::{InterestId, RequirementId, UserId};
use super::error::PortalError;
use super::repository::PortalRepository;
use super::service::Portal;

pub(crate) type PortalState<R> = Arc<Portal<R>>;

/// Router builder exposing every portal route group under `/api`.
pub fn portal_router<R>(portal: Arc<Portal<R>>) -> Router
where
    R: PortalRepository + 'static,
{
    let identity = portal.identity();
    Router::new()
        .nest("/api/auth", auth::routes::<R>())
        .nest("/api/users", users::routes::<R>())
        .nest("/api/gcc", gcc::routes::<R>())
        .nest("/api/startup", startup::routes::<R>())
        .nest("/api/requirements", requirements::routes::<R>())
        .nest("/api/admin", admin::routes::<R>())
        .with_state(portal)
        .layer(middleware::from_fn_with_state(identity, resolve_identity))
}

/// JSON body whose rejections answer like any other validation failure:
/// 400 with an `error` message instead of axum's plain-text 415/422.
pub(crate) struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "rejected request body");
                Err(PortalError::validation(rejection.body_text()))
            }
        }
    }
}

/// Body that may be left out entirely. A request without a `Content-Type`
/// carries no payload; anything else must parse like [`JsonBody`].
pub(crate) struct OptionalJsonBody<T>(pub Option<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !request.headers().contains_key(header::CONTENT_TYPE) {
            return Ok(Self(None));
        }
        let JsonBody(value) = JsonBody::<T>::from_request(request, state).await?;
        Ok(Self(Some(value)))
    }
}

// Malformed ids cannot match a row, so they report like any other miss.

fn user_id(raw: &str, missing: &'static str) -> Result<UserId, PortalError> {
    UserId::parse(raw).ok_or_else(|| PortalError::not_found(missing))
}

fn requirement_id(raw: &str, missing: &'static str) -> Result<RequirementId, PortalError> {
    RequirementId::parse(raw).ok_or_else(|| PortalError::not_found(missing))
}

fn interest_id(raw: &str, missing: &'static str) -> Result<InterestId, PortalError> {
    InterestId::parse(raw).ok_or_else(|| PortalError::not_found(missing))
}
