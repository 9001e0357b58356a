use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AdminSeedConfig;
use crate::portal::domain::{
    normalize_email, AccountDecision, ApprovalStatus, Principal, Role, UserId, UserRecord,
    UserView,
};
use crate::portal::error::PortalError;
use crate::portal::identity::{ClaimsService, CredentialHasher};
use crate::portal::profile::{
    GccProfile, GccProfilePatch, Profile, StartupProfile, StartupProfilePatch,
};
use crate::portal::repository::{PortalRepository, RepositoryError};
use crate::portal::validation::{LoginRequest, RegistrationRequest};

pub const PENDING_APPROVAL_CODE: &str = "PENDING_APPROVAL";

const REGISTERED_MESSAGE: &str = "Registration successful. Your account is pending admin approval. You will be able to login once approved.";
const LOGIN_PENDING_MESSAGE: &str = "Your account is pending admin approval. You cannot login until an administrator approves your registration.";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    pub message: &'static str,
    pub user: UserView,
}

/// Result of a login whose password matched.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    Granted {
        token: String,
        expires_in: u64,
        user: UserView,
    },
    /// Credentials are valid but the account may not sign in yet.
    Denied {
        code: &'static str,
        message: &'static str,
        user: UserView,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(UserId),
    AlreadyPresent,
}

/// Registration, login, account moderation, and self-service profiles.
pub struct AccountService<R> {
    repository: Arc<R>,
    hasher: Arc<dyn CredentialHasher>,
    claims: Arc<dyn ClaimsService>,
    token_ttl: Duration,
}

impl<R> AccountService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        hasher: Arc<dyn CredentialHasher>,
        claims: Arc<dyn ClaimsService>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            hasher,
            claims,
            token_ttl,
        }
    }

    /// Creates a PENDING GCC or STARTUP account together with its profile.
    pub fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationReceipt, PortalError> {
        let registration = request.validate()?;
        let credential_digest = self.hasher.hash(&registration.password)?;
        let now = Utc::now();
        let user = UserRecord {
            id: UserId::generate(),
            email: registration.email.clone(),
            credential_digest,
            name: registration.name.clone(),
            role: registration.role,
            approval_status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let profile = match registration.role {
            Role::Gcc => Profile::Gcc(GccProfile::from_registration(user.id, &registration, now)),
            _ => Profile::Startup(StartupProfile::from_registration(
                user.id,
                &registration,
                now,
            )),
        };

        let stored = self
            .repository
            .insert_account(user, Some(profile))
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => {
                    PortalError::Conflict("Email already registered".to_string())
                }
                other => other.into(),
            })?;

        info!(user_id = %stored.id, role = stored.role.label(), "registration received; awaiting approval");
        Ok(RegistrationReceipt {
            message: REGISTERED_MESSAGE,
            user: stored.view(),
        })
    }

    pub fn login(&self, request: LoginRequest) -> Result<LoginOutcome, PortalError> {
        let (email, password) = request.validate()?;
        let Some(user) = self.repository.find_user_by_email(&email)? else {
            return Err(PortalError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !self.hasher.verify(&password, &user.credential_digest) {
            return Err(PortalError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.may_authenticate() {
            info!(user_id = %user.id, status = user.approval_status.label(), "login refused until approval");
            return Ok(LoginOutcome::Denied {
                code: PENDING_APPROVAL_CODE,
                message: LOGIN_PENDING_MESSAGE,
                user: user.view(),
            });
        }

        let issued = self.claims.issue(&user.principal(), self.token_ttl)?;
        info!(user_id = %user.id, role = user.role.label(), "credential issued");
        Ok(LoginOutcome::Granted {
            token: issued.token,
            expires_in: issued.expires_in,
            user: user.view(),
        })
    }

    /// Reads the caller's account from storage rather than from the token snapshot.
    pub fn current_user(&self, principal: &Principal) -> Result<UserView, PortalError> {
        self.repository
            .fetch_user(principal.id)?
            .map(|user| user.view())
            .ok_or_else(|| PortalError::not_found("User not found"))
    }

    /// The caller's profile, or `None` for administrators.
    pub fn own_profile(&self, principal: &Principal) -> Result<Option<Profile>, PortalError> {
        if principal.role == Role::Admin {
            return Ok(None);
        }
        Ok(self.repository.fetch_profile(principal.id)?)
    }

    pub fn gcc_profile(&self, principal: &Principal) -> Result<GccProfile, PortalError> {
        self.repository
            .fetch_profile(principal.id)?
            .and_then(|profile| profile.as_gcc().cloned())
            .ok_or_else(|| PortalError::not_found("Profile not found"))
    }

    pub fn update_gcc_profile(
        &self,
        principal: &Principal,
        patch: GccProfilePatch,
    ) -> Result<GccProfile, PortalError> {
        let mut patch = Some(patch.normalize()?);
        let now = Utc::now();
        let updated = self.repository.update_profile_where(
            principal.id,
            &|profile| matches!(profile, Profile::Gcc(_)),
            &mut |profile| {
                if let (Profile::Gcc(gcc), Some(patch)) = (profile, patch.take()) {
                    gcc.apply(patch, now);
                }
            },
        )?;

        updated
            .and_then(|profile| profile.as_gcc().cloned())
            .ok_or_else(|| PortalError::not_found("Profile not found"))
    }

    pub fn startup_profile(&self, principal: &Principal) -> Result<StartupProfile, PortalError> {
        self.repository
            .fetch_profile(principal.id)?
            .and_then(|profile| profile.as_startup().cloned())
            .ok_or_else(|| PortalError::not_found("Profile not found"))
    }

    /// Saving the profile also answers any pending reverification request.
    pub fn update_startup_profile(
        &self,
        principal: &Principal,
        patch: StartupProfilePatch,
    ) -> Result<StartupProfile, PortalError> {
        let mut patch = Some(patch.normalize()?);
        let now = Utc::now();
        let updated = self.repository.update_profile_where(
            principal.id,
            &|profile| matches!(profile, Profile::Startup(_)),
            &mut |profile| {
                if let (Profile::Startup(startup), Some(patch)) = (profile, patch.take()) {
                    startup.apply(patch, now);
                    startup.reverification_required = false;
                }
            },
        )?;

        updated
            .and_then(|profile| profile.as_startup().cloned())
            .ok_or_else(|| PortalError::not_found("Profile not found"))
    }

    /// Registrants awaiting a decision, oldest first.
    pub fn pending_accounts(&self) -> Result<Vec<UserView>, PortalError> {
        let mut pending = self
            .repository
            .select_users(&|user| user.awaiting_decision())?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending.iter().map(UserRecord::view).collect())
    }

    /// PENDING -> APPROVED | REJECTED as one conditional write.
    pub fn decide(
        &self,
        user_id: UserId,
        decision: AccountDecision,
    ) -> Result<UserView, PortalError> {
        let target = decision.target();
        let now = Utc::now();
        let updated = self.repository.update_user_where(
            user_id,
            &|user| user.awaiting_decision(),
            &mut |user| {
                user.approval_status = target;
                user.updated_at = now;
            },
        )?;

        match updated {
            Some(user) => {
                info!(user_id = %user.id, status = target.label(), "account decision recorded");
                Ok(user.view())
            }
            None => {
                warn!(user_id = %user_id, status = target.label(), "account decision refused");
                Err(PortalError::not_found("User not found or already processed"))
            }
        }
    }

    /// Creates the administrator when no account holds the configured email.
    pub fn seed_admin(&self, seed: &AdminSeedConfig) -> Result<SeedOutcome, PortalError> {
        let email = normalize_email(&seed.email);
        if self.repository.find_user_by_email(&email)?.is_some() {
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let now = Utc::now();
        let admin = UserRecord {
            id: UserId::generate(),
            email,
            credential_digest: self.hasher.hash(&seed.password)?,
            name: seed.name.trim().to_string(),
            role: Role::Admin,
            approval_status: ApprovalStatus::Approved,
            created_at: now,
            updated_at: now,
        };

        match self.repository.insert_account(admin, None) {
            Ok(stored) => {
                info!(user_id = %stored.id, "administrator seeded");
                Ok(SeedOutcome::Created(stored.id))
            }
            Err(RepositoryError::Conflict(_)) => Ok(SeedOutcome::AlreadyPresent),
            Err(other) => Err(other.into()),
        }
    }
}
