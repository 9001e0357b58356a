//! Ordered guard chain: authenticated, then approved, then role.
//!
//! Guards are pure predicates over the resolved [`Principal`]. Route groups pick
//! a [`RouteGate`] and receive an [`Authorized`] extractor once every guard passes.

use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use super::domain::{ApprovalStatus, Principal, Role};
use super::error::PortalError;
use super::identity::IdentityResolver;

/// Terminal outcome of a failed guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Account is pending admin approval. You cannot access the portal until approved.")]
    PendingApproval,
    #[error("Account registration was not approved.")]
    NotApproved,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
    principal.ok_or(AccessDenied::Unauthenticated)
}

pub fn require_approved(principal: &Principal) -> Result<(), AccessDenied> {
    match principal.effective_approval() {
        ApprovalStatus::Approved => Ok(()),
        ApprovalStatus::Pending => Err(AccessDenied::PendingApproval),
        ApprovalStatus::Rejected => Err(AccessDenied::NotApproved),
    }
}

/// Role membership. Approval is re-checked so the guard holds in any order.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AccessDenied> {
    require_approved(principal)?;
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AccessDenied::InsufficientPermissions)
    }
}

/// Guard combination applied by a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Authenticated,
    Approved,
    Roles(&'static [Role]),
}

impl AccessPolicy {
    pub fn evaluate(self, principal: Option<&Principal>) -> Result<&Principal, AccessDenied> {
        let principal = require_authenticated(principal)?;
        match self {
            AccessPolicy::Authenticated => {}
            AccessPolicy::Approved => require_approved(principal)?,
            AccessPolicy::Roles(allowed) => require_role(principal, allowed)?,
        }
        Ok(principal)
    }
}

/// Type-level selection of an [`AccessPolicy`] for extractors.
pub trait RouteGate: Send + Sync + 'static {
    const POLICY: AccessPolicy;
}

pub struct Authenticated;
pub struct Approved;
pub struct GccOnly;
pub struct StartupOnly;
pub struct AdminOnly;

impl RouteGate for Authenticated {
    const POLICY: AccessPolicy = AccessPolicy::Authenticated;
}

impl RouteGate for Approved {
    const POLICY: AccessPolicy = AccessPolicy::Approved;
}

impl RouteGate for GccOnly {
    const POLICY: AccessPolicy = AccessPolicy::Roles(&[Role::Gcc]);
}

impl RouteGate for StartupOnly {
    const POLICY: AccessPolicy = AccessPolicy::Roles(&[Role::Startup]);
}

impl RouteGate for AdminOnly {
    const POLICY: AccessPolicy = AccessPolicy::Roles(&[Role::Admin]);
}

/// Identity attached to the request by [`resolve_identity`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedIdentity(pub Option<Principal>);

fn resolved(parts: &Parts) -> Option<Principal> {
    parts
        .extensions
        .get::<ResolvedIdentity>()
        .and_then(|identity| identity.0.clone())
}

/// Caller that passed every guard of `G`.
#[derive(Debug, Clone)]
pub struct Authorized<G> {
    pub principal: Principal,
    gate: PhantomData<fn() -> G>,
}

impl<G: RouteGate> Authorized<G> {
    pub fn check(principal: Option<&Principal>) -> Result<Self, AccessDenied> {
        let principal = G::POLICY.evaluate(principal)?.clone();
        Ok(Self {
            principal,
            gate: PhantomData,
        })
    }
}

#[axum::async_trait]
impl<S, G> FromRequestParts<S> for Authorized<G>
where
    S: Send + Sync,
    G: RouteGate,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = resolved(parts);
        Ok(Self::check(principal.as_ref())?)
    }
}

/// Identity for public routes; never rejects.
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolved(parts)))
    }
}

/// Middleware resolving the bearer credential once per request.
pub async fn resolve_identity(
    State(resolver): State<Arc<IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = resolver.resolve(
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
    );
    request.extensions_mut().insert(ResolvedIdentity(principal));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::domain::UserId;

    fn principal(role: Role, approval_status: ApprovalStatus) -> Principal {
        Principal {
            id: UserId::generate(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            role,
            approval_status,
        }
    }

    #[test]
    fn missing_identity_is_unauthenticated() {
        assert_eq!(
            AccessPolicy::Authenticated.evaluate(None).unwrap_err(),
            AccessDenied::Unauthenticated
        );
        assert_eq!(
            GccOnly::POLICY.evaluate(None).unwrap_err(),
            AccessDenied::Unauthenticated
        );
    }

    #[test]
    fn approval_gate_distinguishes_pending_from_rejected() {
        let pending = principal(Role::Startup, ApprovalStatus::Pending);
        let rejected = principal(Role::Startup, ApprovalStatus::Rejected);
        assert_eq!(
            require_approved(&pending).unwrap_err(),
            AccessDenied::PendingApproval
        );
        assert_eq!(
            require_approved(&rejected).unwrap_err(),
            AccessDenied::NotApproved
        );
        assert!(AccessPolicy::Authenticated.evaluate(Some(&pending)).is_ok());
    }

    #[test]
    fn role_gate_rechecks_approval_before_role() {
        let pending_gcc = principal(Role::Gcc, ApprovalStatus::Pending);
        assert_eq!(
            require_role(&pending_gcc, &[Role::Gcc]).unwrap_err(),
            AccessDenied::PendingApproval
        );

        let startup = principal(Role::Startup, ApprovalStatus::Approved);
        assert_eq!(
            GccOnly::POLICY.evaluate(Some(&startup)).unwrap_err(),
            AccessDenied::InsufficientPermissions
        );
        assert!(StartupOnly::POLICY.evaluate(Some(&startup)).is_ok());
    }

    #[test]
    fn admins_pass_approval_regardless_of_snapshot() {
        let admin = principal(Role::Admin, ApprovalStatus::Pending);
        let authorized = Authorized::<AdminOnly>::check(Some(&admin)).expect("admin passes");
        assert_eq!(authorized.principal.role, Role::Admin);
        assert!(Authorized::<GccOnly>::check(Some(&admin)).is_err());
    }
}
