use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{count_interests, user_index};
use crate::portal::domain::{
    normalize_email, ApprovalStatus, InterestId, RequirementId, Role, UserId, UserView,
};
use crate::portal::error::PortalError;
use crate::portal::interest::InterestStatus;
use crate::portal::profile::{GccProfilePatch, Profile, ProfilePatch, StartupProfilePatch};
use crate::portal::repository::PortalRepository;
use crate::portal::requirement::{ModerationStatus, RequirementStatus};
use crate::portal::validation::non_blank;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const MAX_ACTIVITY_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub user: UserView,
    pub profile: Option<Profile>,
}

/// Admin edit of a registrant. `profile` is interpreted by the account's role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortalStats {
    pub total_users: usize,
    pub pending_approvals: usize,
    pub pending_requirement_approvals: usize,
    pub open_requirements: usize,
    pub pending_interests: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementActivity {
    pub id: RequirementId,
    pub title: String,
    pub category: String,
    pub status: RequirementStatus,
    pub created_at: DateTime<Utc>,
    pub gcc_name: Option<String>,
    pub gcc_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestActivity {
    pub id: InterestId,
    pub message: Option<String>,
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
    pub requirement_title: Option<String>,
    pub startup_name: Option<String>,
    pub startup_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityFeed {
    pub requirements: Vec<RequirementActivity>,
    pub expressions_of_interest: Vec<InterestActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveProject {
    pub id: RequirementId,
    pub title: String,
    pub category: String,
    pub status: RequirementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub gcc_name: Option<String>,
    pub gcc_email: Option<String>,
    pub interest_count: usize,
}

/// Positive values are capped at the maximum; anything else uses the default.
pub fn activity_limit(raw: Option<&str>) -> usize {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .map(|limit| (limit as usize).min(MAX_ACTIVITY_LIMIT))
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
}

/// Administrative views and account management.
pub struct AdminService<R> {
    repository: Arc<R>,
}

impl<R> AdminService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Registrants, newest first. Unknown role filters are ignored.
    pub fn users(&self, role: Option<&str>) -> Result<Vec<UserView>, PortalError> {
        let role = role
            .and_then(Role::parse)
            .filter(|role| role.is_registrant());
        let mut users = self.repository.select_users(&|user| {
            user.role != Role::Admin && role.map_or(true, |role| user.role == role)
        })?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(users.iter().map(|user| user.view()).collect())
    }

    pub fn user_detail(&self, id: UserId) -> Result<UserDetail, PortalError> {
        let user = self
            .repository
            .fetch_user(id)?
            .filter(|user| user.role != Role::Admin)
            .ok_or_else(|| PortalError::not_found("User not found"))?;
        let profile = self.repository.fetch_profile(id)?;
        Ok(UserDetail {
            user: user.view(),
            profile,
        })
    }

    pub fn update_user(
        &self,
        id: UserId,
        update: AdminUserUpdate,
    ) -> Result<UserView, PortalError> {
        let user = self
            .repository
            .fetch_user(id)?
            .filter(|user| user.role != Role::Admin)
            .ok_or_else(|| PortalError::not_found("User not found"))?;

        let profile_patch = match update.profile {
            Some(raw) => Some(profile_patch(user.role, raw)?),
            None => None,
        };
        if profile_patch.is_some() && self.repository.fetch_profile(id)?.is_none() {
            warn!(user_id = %id, "admin profile edit refused: no profile on record");
            return Err(PortalError::not_found("Profile not found"));
        }
        let name = non_blank(update.name);
        let email = non_blank(update.email).map(|email| normalize_email(&email));
        let now = Utc::now();

        let mut view = user.view();
        if name.is_some() || email.is_some() {
            let updated = self
                .repository
                .update_user_where(
                    id,
                    &|user| user.role != Role::Admin,
                    &mut |user| {
                        if let Some(name) = &name {
                            user.name = name.clone();
                        }
                        if let Some(email) = &email {
                            user.email = email.clone();
                        }
                        user.updated_at = now;
                    },
                )?
                .ok_or_else(|| PortalError::not_found("User not found"))?;
            view = updated.view();
        }

        if let Some(patch) = profile_patch {
            let mut patch = Some(patch);
            let mut applied = false;
            let stored = self.repository.update_profile_where(
                id,
                &|_| true,
                &mut |profile| {
                    if let Some(patch) = patch.take() {
                        applied = patch.apply_to(profile, now);
                    }
                },
            )?;
            if stored.is_none() || !applied {
                warn!(user_id = %id, "admin profile edit matched no profile");
                return Err(PortalError::not_found("Profile not found"));
            }
        }

        info!(user_id = %id, "account updated by admin");
        Ok(view)
    }

    /// Removes a registrant and everything attached to it. Admins cannot be deleted.
    pub fn delete_user(&self, id: UserId) -> Result<(), PortalError> {
        self.repository
            .delete_user_where(id, &|user| user.role != Role::Admin)?
            .ok_or_else(|| PortalError::not_found("User not found or cannot delete admin"))?;
        info!(user_id = %id, "account deleted with dependent records");
        Ok(())
    }

    pub fn request_reverification(&self, id: UserId) -> Result<&'static str, PortalError> {
        let user = self
            .repository
            .fetch_user(id)?
            .ok_or_else(|| PortalError::not_found("User not found"))?;
        if user.role != Role::Startup {
            return Err(PortalError::validation(
                "Only startups can be sent for reverification",
            ));
        }

        let now = Utc::now();
        self.repository
            .update_profile_where(
                id,
                &|profile| matches!(profile, Profile::Startup(_)),
                &mut |profile| {
                    if let Profile::Startup(startup) = profile {
                        startup.reverification_required = true;
                        startup.updated_at = now;
                    }
                },
            )?
            .ok_or_else(|| PortalError::not_found("Profile not found"))?;

        info!(user_id = %id, "reverification requested");
        Ok("Reverification requested. Startup will be prompted to update their profile.")
    }

    pub fn stats(&self) -> Result<PortalStats, PortalError> {
        let registrants = self
            .repository
            .select_users(&|user| user.role.is_registrant())?;
        let requirements = self.repository.select_requirements(&|_| true)?;
        let pending_interests = self
            .repository
            .select_interests(&|interest| interest.status == InterestStatus::Pending)?
            .len();

        Ok(PortalStats {
            total_users: registrants.len(),
            pending_approvals: registrants
                .iter()
                .filter(|user| user.approval_status == ApprovalStatus::Pending)
                .count(),
            pending_requirement_approvals: requirements
                .iter()
                .filter(|requirement| requirement.awaiting_moderation())
                .count(),
            open_requirements: requirements
                .iter()
                .filter(|requirement| {
                    requirement.status == RequirementStatus::Open
                        && requirement.approval_status == ModerationStatus::Approved
                })
                .count(),
            pending_interests,
        })
    }

    /// Most recent requirements and interests, `limit` of each.
    pub fn activities(&self, limit: usize) -> Result<ActivityFeed, PortalError> {
        let limit = limit.clamp(1, MAX_ACTIVITY_LIMIT);
        let users = user_index(self.repository.as_ref())?;

        let mut requirements = self.repository.select_requirements(&|_| true)?;
        requirements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let titles: std::collections::HashMap<RequirementId, String> = requirements
            .iter()
            .map(|requirement| (requirement.id, requirement.title.clone()))
            .collect();

        let requirement_feed = requirements
            .into_iter()
            .take(limit)
            .map(|requirement| {
                let owner = users.get(&requirement.owner_id);
                RequirementActivity {
                    id: requirement.id,
                    title: requirement.title,
                    category: requirement.category,
                    status: requirement.status,
                    created_at: requirement.created_at,
                    gcc_name: owner.map(|user| user.name.clone()),
                    gcc_email: owner.map(|user| user.email.clone()),
                }
            })
            .collect();

        let mut interests = self.repository.select_interests(&|_| true)?;
        interests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let interest_feed = interests
            .into_iter()
            .take(limit)
            .map(|interest| {
                let startup = users.get(&interest.startup_id);
                InterestActivity {
                    id: interest.id,
                    message: interest.message,
                    status: interest.status,
                    created_at: interest.created_at,
                    requirement_title: titles.get(&interest.requirement_id).cloned(),
                    startup_name: startup.map(|user| user.name.clone()),
                    startup_email: startup.map(|user| user.email.clone()),
                }
            })
            .collect();

        Ok(ActivityFeed {
            requirements: requirement_feed,
            expressions_of_interest: interest_feed,
        })
    }

    /// OPEN or IN_PROGRESS requirements, most recently updated first.
    pub fn active_projects(&self) -> Result<Vec<ActiveProject>, PortalError> {
        let mut projects = self.repository.select_requirements(&|requirement| {
            matches!(
                requirement.status,
                RequirementStatus::Open | RequirementStatus::InProgress
            )
        })?;
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        let users = user_index(self.repository.as_ref())?;
        let counts = count_interests(self.repository.as_ref(), &|_| true)?;
        Ok(projects
            .into_iter()
            .map(|requirement| {
                let owner = users.get(&requirement.owner_id);
                ActiveProject {
                    interest_count: counts.get(&requirement.id).copied().unwrap_or(0),
                    id: requirement.id,
                    title: requirement.title,
                    category: requirement.category,
                    status: requirement.status,
                    created_at: requirement.created_at,
                    updated_at: requirement.updated_at,
                    gcc_name: owner.map(|user| user.name.clone()),
                    gcc_email: owner.map(|user| user.email.clone()),
                }
            })
            .collect())
    }
}

fn profile_patch(role: Role, raw: Value) -> Result<ProfilePatch, PortalError> {
    let invalid = |err: serde_json::Error| PortalError::validation(format!("Invalid profile: {err}"));
    match role {
        Role::Gcc => {
            let patch: GccProfilePatch = serde_json::from_value(raw).map_err(invalid)?;
            Ok(ProfilePatch::Gcc(patch.normalize()?))
        }
        Role::Startup => {
            let patch: StartupProfilePatch = serde_json::from_value(raw).map_err(invalid)?;
            Ok(ProfilePatch::Startup(patch.normalize()?))
        }
        Role::Admin => Err(PortalError::not_found("User not found")),
    }
}
