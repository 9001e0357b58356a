use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{requirement_id, user_id, JsonBody, OptionalJsonBody, PortalState};
use crate::portal::access::{AdminOnly, Authorized};
use crate::portal::domain::AccountDecision;
use crate::portal::error::PortalError;
use crate::portal::repository::PortalRepository;
use crate::portal::requirement::ModerationAction;
use crate::portal::service::{activity_limit, AdminUserUpdate};

const ACCOUNT_PROCESSED: &str = "User not found or already processed";
const REQUIREMENT_PROCESSED: &str = "Requirement not found or already processed";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserFilter {
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActivityQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RemarksBody {
    pub remarks: Option<String>,
}

pub(super) fn routes<R>() -> Router<PortalState<R>>
where
    R: PortalRepository + 'static,
{
    Router::new()
        .route("/approvals", get(pending_accounts_handler::<R>))
        .route("/approvals/:user_id/approve", post(approve_account_handler::<R>))
        .route("/approvals/:user_id/reject", post(reject_account_handler::<R>))
        .route("/users", get(list_users_handler::<R>))
        .route(
            "/users/:user_id",
            get(user_detail_handler::<R>)
                .put(update_user_handler::<R>)
                .delete(delete_user_handler::<R>),
        )
        .route(
            "/users/:user_id/request-reverification",
            post(reverification_handler::<R>),
        )
        .route("/stats", get(stats_handler::<R>))
        .route("/activities", get(activities_handler::<R>))
        .route(
            "/requirement-approvals",
            get(pending_requirements_handler::<R>),
        )
        .route(
            "/requirement-approvals/:requirement_id/approve",
            post(approve_requirement_handler::<R>),
        )
        .route(
            "/requirement-approvals/:requirement_id/send-back",
            post(send_back_requirement_handler::<R>),
        )
        .route(
            "/requirement-approvals/:requirement_id/reject",
            post(reject_requirement_handler::<R>),
        )
        .route("/active-projects", get(active_projects_handler::<R>))
}

async fn pending_accounts_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let pending = portal.accounts.pending_accounts()?;
    Ok(Json(pending).into_response())
}

fn decide_account<R>(
    portal: &PortalState<R>,
    raw_id: &str,
    decision: AccountDecision,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = user_id(raw_id, ACCOUNT_PROCESSED)?;
    let user = portal.accounts.decide(id, decision)?;
    Ok(Json(user).into_response())
}

pub(crate) async fn approve_account_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    decide_account(&portal, &raw_id, AccountDecision::Approve)
}

pub(crate) async fn reject_account_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    decide_account(&portal, &raw_id, AccountDecision::Reject)
}

async fn list_users_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Query(filter): Query<UserFilter>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let users = portal.admin.users(filter.role.as_deref())?;
    Ok(Json(users).into_response())
}

async fn user_detail_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = user_id(&raw_id, "User not found")?;
    let detail = portal.admin.user_detail(id)?;
    Ok(Json(detail).into_response())
}

async fn update_user_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
    JsonBody(update): JsonBody<AdminUserUpdate>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = user_id(&raw_id, "User not found")?;
    let user = portal.admin.update_user(id, update)?;
    Ok(Json(user).into_response())
}

async fn delete_user_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = user_id(&raw_id, "User not found or cannot delete admin")?;
    portal.admin.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn reverification_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = user_id(&raw_id, "User not found")?;
    let message = portal.admin.request_reverification(id)?;
    Ok(Json(json!({ "message": message })).into_response())
}

async fn stats_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let stats = portal.admin.stats()?;
    Ok(Json(stats).into_response())
}

async fn activities_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Query(query): Query<ActivityQuery>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let feed = portal
        .admin
        .activities(activity_limit(query.limit.as_deref()))?;
    Ok(Json(feed).into_response())
}

async fn pending_requirements_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let queue = portal.requirements.pending_moderation()?;
    Ok(Json(queue).into_response())
}

fn moderate<R>(
    portal: &PortalState<R>,
    raw_id: &str,
    action: ModerationAction,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let id = requirement_id(raw_id, REQUIREMENT_PROCESSED)?;
    let requirement = portal.requirements.moderate(id, action)?;
    Ok(Json(requirement).into_response())
}

async fn approve_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    moderate(&portal, &raw_id, ModerationAction::Approve)
}

pub(crate) async fn send_back_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
    OptionalJsonBody(body): OptionalJsonBody<RemarksBody>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let remarks = body.and_then(|body| body.remarks);
    moderate(&portal, &raw_id, ModerationAction::send_back(remarks))
}

async fn reject_requirement_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
    Path(raw_id): Path<String>,
    OptionalJsonBody(body): OptionalJsonBody<RemarksBody>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let remarks = body.and_then(|body| body.remarks);
    moderate(&portal, &raw_id, ModerationAction::reject(remarks))
}

async fn active_projects_handler<R>(
    State(portal): State<PortalState<R>>,
    _admin: Authorized<AdminOnly>,
) -> Result<Response, PortalError>
where
    R: PortalRepository + 'static,
{
    let projects = portal.admin.active_projects()?;
    Ok(Json(projects).into_response())
}
