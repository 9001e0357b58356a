use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::{JsonBody, PortalState};
use crate::portal::access::{Authenticated, Authorized};
use crate::portal::error::PortalError;
use crate::portal::repository::PortalRepository;
use crate::portal::service::LoginOutcome;
use crate::portal::validation::{LoginRequest, RegistrationRequest};

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new()
        .route("/register", post(register_handler::<R>))
        .route("/login", post(login_handler::<R>))
        .route("/me", get(me_handler::<R>))
}

pub(crate) async fn register_handler<R>(
    State(portal): State<PortalState<R>>,
    JsonBody(request): JsonBody<RegistrationRequest>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let receipt = portal.accounts.register(request)?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

/// Valid credentials on an account that is not approved yet answer 403 with
/// the `PENDING_APPROVAL` code instead of a token.
pub(crate) async fn login_handler<R>(
    State(portal): State<PortalState<R>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let outcome = portal.accounts.login(request)?;
    let status = match outcome {
        LoginOutcome::Granted { .. } => StatusCode::OK,
        LoginOutcome::Denied { .. } => StatusCode::FORBIDDEN,
    };
    Ok((status, Json(outcome)).into_response())
}

async fn me_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<Authenticated>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let user = portal.accounts.current_user(&caller.principal)?;
    Ok(Json(user).into_response())
}
