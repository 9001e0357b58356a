use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{interest_id, requirement_id, JsonBody, PortalState};
use crate::portal::access::{Authorized, GccOnly};
use crate::portal::error::PortalError;
use crate::portal::interest::InterestDecision;
use crate::portal::profile::GccProfilePatch;
use crate::portal::repository::PortalRepository;
use crate::portal::requirement::{RequirementDraft, RequirementPatch};
use crate::portal::service::DirectoryQuery;

const REQUIREMENT_NOT_FOUND: &str = "Requirement not found";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RespondBody {
    pub status: Option<String>,
}

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new()
        .route(
            "/profile",
            get(profile_handler::<R>).put(update_profile_handler::<R>),
        )
        .route("/startups", get(startups_handler::<R>))
        .route("/interests", get(received_interests_handler::<R>))
        .route(
            "/interests/:interest_id/respond",
            post(respond_handler::<R>),
        )
        .route("/active-deals", get(active_deals_handler::<R>))
        .route(
            "/requirements",
            get(list_requirements_handler::<R>).post(create_requirement_handler::<R>),
        )
        .route(
            "/requirements/:requirement_id",
            get(get_requirement_handler::<R>)
                .put(update_requirement_handler::<R>)
                .delete(delete_requirement_handler::<R>),
        )
}

async fn profile_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let profile = portal.accounts.gcc_profile(&caller.principal)?;
    Ok(Json(profile).into_response())
}

async fn update_profile_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    JsonBody(patch): JsonBody<GccProfilePatch>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let profile = portal.accounts.update_gcc_profile(&caller.principal, patch)?;
    Ok(Json(profile).into_response())
}

async fn startups_handler<R>(
    State(portal): State<PortalState<R>>,
    _caller: Authorized<GccOnly>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let startups = portal.directory.startups(query)?;
    Ok(Json(startups).into_response())
}

async fn received_interests_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let received = portal.interests.received(&caller.principal)?;
    Ok(Json(received).into_response())
}

pub(crate) async fn respond_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody<RespondBody>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let decision = InterestDecision::parse(body.status.as_deref())?;
    let id = interest_id(&raw_id, "Interest not found or already processed")?;
    let interest = portal.interests.respond(&caller.principal, id, decision)?;
    Ok(Json(interest).into_response())
}

async fn active_deals_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let deals = portal.requirements.active_deals(&caller.principal)?;
    Ok(Json(deals).into_response())
}

async fn list_requirements_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let owned = portal.requirements.list_owned(&caller.principal)?;
    Ok(Json(owned).into_response())
}

async fn create_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    JsonBody(draft): JsonBody<RequirementDraft>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let requirement = portal.requirements.create(&caller.principal, draft)?;
    Ok((StatusCode::CREATED, Json(requirement)).into_response())
}

async fn get_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(&raw_id, REQUIREMENT_NOT_FOUND)?;
    let detail = portal.requirements.get_owned(&caller.principal, id)?;
    Ok(Json(detail).into_response())
}

async fn update_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    Path(raw_id): Path<String>,
    JsonBody(patch): JsonBody<RequirementPatch>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(&raw_id, REQUIREMENT_NOT_FOUND)?;
    let requirement = portal
        .requirements
        .update_owned(&caller.principal, id, patch)?;
    Ok(Json(requirement).into_response())
}

async fn delete_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    caller: Authorized<GccOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(&raw_id, REQUIREMENT_NOT_FOUND)?;
    portal.requirements.delete_owned(&caller.principal, id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
