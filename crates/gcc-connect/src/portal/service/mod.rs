//! Portal operations. Each service owns one slice of the workflow and shares the
//! repository; [`Portal`] bundles them for the routers and the binary.

mod accounts;
mod admin;
mod directory;
mod interests;
mod requirements;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use accounts::{AccountService, LoginOutcome, RegistrationReceipt, SeedOutcome};
pub use admin::{
    activity_limit, ActiveProject, ActivityFeed, AdminService, AdminUserUpdate, InterestActivity,
    PortalStats, RequirementActivity, UserDetail,
};
pub use directory::{DirectoryQuery, DirectoryService, StartupListing};
pub use interests::InterestService;
pub use requirements::{
    ModerationQueueEntry, PublicRequirementQuery, RequirementDetail, RequirementService,
};

use crate::config::AuthConfig;

use super::domain::{RequirementId, UserId, UserRecord};
use super::error::PortalError;
use super::identity::{Argon2Hasher, ClaimsService, CredentialHasher, IdentityResolver, JwtClaimsService};
use super::interest::ExpressionOfInterest;
use super::repository::{PortalRepository, Predicate};

/// Every portal service over one shared repository.
pub struct Portal<R> {
    pub accounts: AccountService<R>,
    pub requirements: RequirementService<R>,
    pub interests: InterestService<R>,
    pub directory: DirectoryService<R>,
    pub admin: AdminService<R>,
    identity: Arc<IdentityResolver>,
}

impl<R> Portal<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        hasher: Arc<dyn CredentialHasher>,
        claims: Arc<dyn ClaimsService>,
        token_ttl: Duration,
    ) -> Self {
        let identity = Arc::new(IdentityResolver::new(claims.clone()));
        Self {
            accounts: AccountService::new(repository.clone(), hasher, claims, token_ttl),
            requirements: RequirementService::new(repository.clone()),
            interests: InterestService::new(repository.clone()),
            directory: DirectoryService::new(repository.clone()),
            admin: AdminService::new(repository),
            identity,
        }
    }

    /// Argon2 digests and HS256 tokens signed with the configured secret.
    pub fn from_config(repository: Arc<R>, auth: &AuthConfig) -> Self {
        Self::new(
            repository,
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtClaimsService::new(&auth.jwt_secret)),
            auth.token_ttl,
        )
    }

    pub fn identity(&self) -> Arc<IdentityResolver> {
        self.identity.clone()
    }
}

/// Interest totals per requirement for the interests matching `filter`.
pub(crate) fn count_interests<R: PortalRepository>(
    repository: &R,
    filter: Predicate<'_, ExpressionOfInterest>,
) -> Result<HashMap<RequirementId, usize>, PortalError> {
    let mut counts = HashMap::new();
    for interest in repository.select_interests(filter)? {
        *counts.entry(interest.requirement_id).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Accounts keyed by id, for joining names and emails onto listings.
pub(crate) fn user_index<R: PortalRepository>(
    repository: &R,
) -> Result<HashMap<UserId, UserRecord>, PortalError> {
    Ok(repository
        .select_users(&|_| true)?
        .into_iter()
        .map(|user| (user.id, user))
        .collect())
}
