use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::{JsonBody, PortalState};
use crate::portal::access::{Authorized, StartupOnly};
use crate::portal::error::PortalError;
use crate::portal::profile::StartupProfilePatch;
use crate::portal::repository::PortalRepository;

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new().route(
        "/profile",
        get(profile_handler::<R>).put(update_profile_handler::<R>),
    )
}

async fn profile_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<StartupOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let profile = portal.accounts.startup_profile(&caller.principal)?;
    Ok(Json(profile).into_response())
}

async fn update_profile_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<StartupOnly>,
    JsonBody(patch): JsonBody<StartupProfilePatch>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let profile = portal
        .accounts
        .update_startup_profile(&caller.principal, patch)?;
    Ok(Json(profile).into_response())
}
