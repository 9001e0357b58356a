use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::PortalState;
use crate::portal::access::{Approved, Authorized};
use crate::portal::error::PortalError;
use crate::portal::repository::PortalRepository;

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new().route("/profile", get(profile_handler::<R>))
}

/// Role-specific profile of the caller; `null` for administrators.
async fn profile_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<Approved>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let profile = portal.accounts.own_profile(&caller.principal)?;
    Ok(Json(profile).into_response())
}
