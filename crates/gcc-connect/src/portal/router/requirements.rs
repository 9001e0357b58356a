use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

use super::{requirement_id, OptionalJsonBody, PortalState};
use crate::portal::access::{Authorized, OptionalPrincipal, StartupOnly};
use crate::portal::error::PortalError;
use crate::portal::interest::InterestSubmission;
use crate::portal::repository::PortalRepository;
use crate::portal::service::PublicRequirementQuery;

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new()
        .route("/", get(list_handler::<R>))
        .route("/my/interests", get(my_interests_handler::<R>))
        .route("/:requirement_id", get(detail_handler::<R>))
        .route(
            "/:requirement_id/express-interest",
            post(express_interest_handler::<R>),
        )
}

/// Open to anonymous readers; a signed-in caller only changes what is logged.
async fn list_handler<R>(
    State(portal): State<PortalState<R>>,
    OptionalPrincipal(viewer): OptionalPrincipal,
    Query(query): Query<PublicRequirementQuery>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let listing = portal.requirements.list_public(query)?;
    debug!(
        viewer = viewer.as_ref().map(|principal| principal.role.label()),
        results = listing.len(),
        "public requirement listing"
    );
    Ok(Json(listing).into_response())
}

async fn detail_handler<R>(
    State(portal): State<PortalState<R>>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(&raw_id, "Requirement not found")?;
    let requirement = portal.requirements.get_public(id)?;
    Ok(Json(requirement).into_response())
}

/// Body fields are all optional, so an empty body is an application without a message.
pub(crate) async fn express_interest_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<StartupOnly>,
    Path(raw_id): Path<String>,
    OptionalJsonBody(submission): OptionalJsonBody<InterestSubmission>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(&raw_id, "Requirement not found or not open")?;
    let submission = submission.unwrap_or_default();
    let interest = portal.interests.submit(&caller.principal, id, submission)?;
    Ok((StatusCode::CREATED, Json(interest)).into_response())
}

async fn my_interests_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<StartupOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let interests = portal.interests.mine(&caller.principal)?;
    Ok(Json(interests).into_response())
}
