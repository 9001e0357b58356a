use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::AdminSeedConfig;
use crate::portal::domain::{
    AccountDecision, InterestId, Principal, RequirementId, UserId, UserRecord,
};
use crate::portal::identity::{Argon2Hasher, JwtClaimsService};
use crate::portal::interest::{ExpressionOfInterest, InterestSubmission};
use crate::portal::profile::Profile;
use crate::portal::repository::{
    InterestUpsert, Mutation, PortalRepository, Predicate, RepositoryError,
};
use crate::portal::requirement::{ModerationAction, Requirement, RequirementDraft};
use crate::portal::service::Portal;
use crate::portal::store::MemoryStore;
use crate::portal::validation::RegistrationRequest;
use crate::portal::{portal_router, LoginOutcome, LoginRequest};

pub(super) const SECRET: &str = "portal-test-secret";
pub(super) const PASSWORD: &str = "s3cret-pass";
pub(super) const ADMIN_EMAIL: &str = "admin@gccstartup.local";
pub(super) const ADMIN_PASSWORD: &str = "Admin123!";

fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(8, 1, 1).expect("valid argon2 params")
}

pub(super) fn portal_over<R>(repository: Arc<R>) -> Portal<R>
where
    R: PortalRepository + 'static,
{
    Portal::new(
        repository,
        Arc::new(cheap_hasher()),
        Arc::new(JwtClaimsService::new(SECRET)),
        Duration::from_secs(3600),
    )
}

pub(super) fn build_portal() -> (Arc<Portal<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Arc::new(portal_over(store.clone())), store)
}

pub(super) fn router_for(portal: &Arc<Portal<MemoryStore>>) -> axum::Router {
    portal_router(portal.clone())
}

pub(super) fn admin_seed() -> AdminSeedConfig {
    AdminSeedConfig {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        name: "Portal Admin".to_string(),
    }
}

pub(super) fn registration(role: &str, email: &str, name: &str) -> RegistrationRequest {
    RegistrationRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(PASSWORD.to_string()),
        role: Some(role.to_string()),
        description: Some(format!("{name} builds enterprise software")),
        company_name: Some(format!("{name} Pvt Ltd")),
        industry: Some("Technology".to_string()),
        mobile_primary: Some("+91 98765 43210".to_string()),
        ..RegistrationRequest::default()
    }
}

pub(super) fn stored_user(store: &MemoryStore, id: UserId) -> UserRecord {
    store
        .fetch_user(id)
        .expect("store reachable")
        .expect("user present")
}

pub(super) fn register<R>(portal: &Portal<R>, role: &str, email: &str, name: &str) -> UserId
where
    R: PortalRepository + 'static,
{
    portal
        .accounts
        .register(registration(role, email, name))
        .expect("registration accepted")
        .user
        .id
}

/// Registers and approves an account, returning the principal a fresh login would carry.
pub(super) fn approved(
    store: &MemoryStore,
    portal: &Portal<MemoryStore>,
    role: &str,
    email: &str,
    name: &str,
) -> Principal {
    let id = register(portal, role, email, name);
    portal
        .accounts
        .decide(id, AccountDecision::Approve)
        .expect("approval recorded");
    stored_user(store, id).principal()
}

pub(super) fn admin(store: &MemoryStore, portal: &Portal<MemoryStore>) -> Principal {
    portal.accounts.seed_admin(&admin_seed()).expect("admin seeded");
    store
        .find_user_by_email(ADMIN_EMAIL)
        .expect("store reachable")
        .expect("admin present")
        .principal()
}

pub(super) fn draft(title: &str, description: &str, category: &str) -> RequirementDraft {
    RequirementDraft {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        budget_min: Some(10_000.0),
        budget_max: Some(25_000.0),
        ..RequirementDraft::default()
    }
}

pub(super) fn approved_requirement(
    portal: &Portal<MemoryStore>,
    owner: &Principal,
    title: &str,
    description: &str,
) -> Requirement {
    let created = portal
        .requirements
        .create(owner, draft(title, description, "AI/ML"))
        .expect("requirement created");
    portal
        .requirements
        .moderate(created.id, ModerationAction::Approve)
        .expect("requirement approved")
}

pub(super) fn pitch(message: &str) -> InterestSubmission {
    InterestSubmission {
        message: Some(message.to_string()),
        proposed_budget: Some(18_000.0),
        ..InterestSubmission::default()
    }
}

pub(super) fn login_token<R>(portal: &Portal<R>, email: &str, password: &str) -> String
where
    R: PortalRepository + 'static,
{
    let outcome = portal
        .accounts
        .login(LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        })
        .expect("login accepted");
    match outcome {
        LoginOutcome::Granted { token, .. } => token,
        LoginOutcome::Denied { code, .. } => panic!("login denied with {code}"),
    }
}

pub(super) fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PortalRepository for UnavailableStore {
    fn insert_account(
        &self,
        _user: UserRecord,
        _profile: Option<Profile>,
    ) -> Result<UserRecord, RepositoryError> {
        offline()
    }

    fn fetch_user(&self, _id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        offline()
    }

    fn find_user_by_email(&self, _email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        offline()
    }

    fn select_users(
        &self,
        _filter: Predicate<'_, UserRecord>,
    ) -> Result<Vec<UserRecord>, RepositoryError> {
        offline()
    }

    fn update_user_where(
        &self,
        _id: UserId,
        _precondition: Predicate<'_, UserRecord>,
        _mutation: Mutation<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        offline()
    }

    fn delete_user_where(
        &self,
        _id: UserId,
        _precondition: Predicate<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        offline()
    }

    fn fetch_profile(&self, _user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn update_profile_where(
        &self,
        _user_id: UserId,
        _precondition: Predicate<'_, Profile>,
        _mutation: Mutation<'_, Profile>,
    ) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn insert_requirement(&self, _requirement: Requirement) -> Result<Requirement, RepositoryError> {
        offline()
    }

    fn fetch_requirement(
        &self,
        _id: RequirementId,
    ) -> Result<Option<Requirement>, RepositoryError> {
        offline()
    }

    fn select_requirements(
        &self,
        _filter: Predicate<'_, Requirement>,
    ) -> Result<Vec<Requirement>, RepositoryError> {
        offline()
    }

    fn update_requirement_where(
        &self,
        _id: RequirementId,
        _precondition: Predicate<'_, Requirement>,
        _mutation: Mutation<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError> {
        offline()
    }

    fn delete_requirement_where(
        &self,
        _id: RequirementId,
        _precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError> {
        offline()
    }

    fn upsert_interest_where(
        &self,
        _interest: ExpressionOfInterest,
        _precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<InterestUpsert>, RepositoryError> {
        offline()
    }

    fn select_interests(
        &self,
        _filter: Predicate<'_, ExpressionOfInterest>,
    ) -> Result<Vec<ExpressionOfInterest>, RepositoryError> {
        offline()
    }

    fn update_interest_where(
        &self,
        _id: InterestId,
        _precondition: &dyn Fn(&ExpressionOfInterest, &Requirement) -> bool,
        _mutation: Mutation<'_, ExpressionOfInterest>,
    ) -> Result<Option<ExpressionOfInterest>, RepositoryError> {
        offline()
    }
}
