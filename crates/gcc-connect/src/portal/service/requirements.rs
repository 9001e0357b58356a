use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{count_interests, user_index};
use crate::portal::domain::{Principal, RequirementId};
use crate::portal::error::PortalError;
use crate::portal::interest::{ApplicationView, InterestStatus};
use crate::portal::repository::PortalRepository;
use crate::portal::requirement::{
    ActiveDeal, ModerationAction, OwnedRequirement, PublicRequirement, Requirement,
    RequirementDraft, RequirementPatch,
};
use crate::portal::search::{rank, SearchTerm, Weight};
use crate::portal::validation::non_blank;

const NOT_FOUND: &str = "Requirement not found";

/// Query string accepted by the public requirement listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicRequirementQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Owner's view of one requirement with every application against it.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementDetail {
    #[serde(flatten)]
    pub requirement: Requirement,
    pub applications: Vec<ApplicationView>,
}

/// Requirement waiting in the admin moderation queue.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationQueueEntry {
    #[serde(flatten)]
    pub requirement: Requirement,
    pub gcc_name: Option<String>,
    pub gcc_email: Option<String>,
}

fn newest_first(a: &Requirement, b: &Requirement) -> Ordering {
    b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
}

/// GCC postings on both axes: owner edits and admin moderation.
pub struct RequirementService<R> {
    repository: Arc<R>,
}

impl<R> RequirementService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(
        &self,
        owner: &Principal,
        draft: RequirementDraft,
    ) -> Result<Requirement, PortalError> {
        let requirement = draft.into_requirement(owner.id, Utc::now())?;
        let stored = self.repository.insert_requirement(requirement)?;
        info!(requirement_id = %stored.id, owner_id = %owner.id, "requirement submitted for moderation");
        Ok(stored)
    }

    pub fn list_owned(&self, owner: &Principal) -> Result<Vec<OwnedRequirement>, PortalError> {
        let owner_id = owner.id;
        let mut owned = self
            .repository
            .select_requirements(&|requirement| requirement.owner_id == owner_id)?;
        owned.sort_by(newest_first);

        let counts = count_interests(self.repository.as_ref(), &|_| true)?;
        Ok(owned
            .into_iter()
            .map(|requirement| OwnedRequirement {
                interest_count: counts.get(&requirement.id).copied().unwrap_or(0),
                requirement,
            })
            .collect())
    }

    /// Ownership failures look exactly like a missing requirement.
    pub fn get_owned(
        &self,
        owner: &Principal,
        id: RequirementId,
    ) -> Result<RequirementDetail, PortalError> {
        let requirement = self
            .repository
            .fetch_requirement(id)?
            .filter(|requirement| requirement.owner_id == owner.id)
            .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;

        let users = user_index(self.repository.as_ref())?;
        let applications = self
            .repository
            .select_interests(&|interest| interest.requirement_id == id)?
            .into_iter()
            .map(|interest| {
                let startup = users.get(&interest.startup_id);
                ApplicationView {
                    startup_name: startup.map(|user| user.name.clone()),
                    startup_email: startup.map(|user| user.email.clone()),
                    interest,
                }
            })
            .collect();

        Ok(RequirementDetail {
            requirement,
            applications,
        })
    }

    /// Partial edit. `resubmit` returns a SENT_BACK requirement to moderation
    /// inside the same conditional write as the field edits.
    pub fn update_owned(
        &self,
        owner: &Principal,
        id: RequirementId,
        patch: RequirementPatch,
    ) -> Result<Requirement, PortalError> {
        let owner_id = owner.id;
        let now = Utc::now();
        let mut patch = Some(patch);
        let mut resubmitted = false;

        let updated = self.repository.update_requirement_where(
            id,
            &|requirement| requirement.owner_id == owner_id,
            &mut |requirement| {
                if let Some(patch) = patch.take() {
                    resubmitted = patch.apply(requirement, now);
                }
            },
        )?;

        let updated = updated.ok_or_else(|| PortalError::not_found(NOT_FOUND))?;
        if resubmitted {
            info!(requirement_id = %updated.id, "requirement resubmitted for moderation");
        }
        Ok(updated)
    }

    pub fn delete_owned(&self, owner: &Principal, id: RequirementId) -> Result<(), PortalError> {
        let owner_id = owner.id;
        self.repository
            .delete_requirement_where(id, &|requirement| requirement.owner_id == owner_id)?
            .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;
        info!(requirement_id = %id, "requirement deleted");
        Ok(())
    }

    /// OPEN requirements for startups and anonymous readers.
    ///
    /// Moderation state is not consulted; only the business status gates visibility.
    pub fn list_public(
        &self,
        query: PublicRequirementQuery,
    ) -> Result<Vec<PublicRequirement>, PortalError> {
        let category = non_blank(query.category);
        let term = SearchTerm::parse(query.search.as_deref());

        let visible = self.repository.select_requirements(&|requirement| {
            requirement.publicly_visible()
                && category
                    .as_deref()
                    .map_or(true, |category| requirement.category == category)
                && term.as_ref().map_or(true, |term| {
                    term.matches_any(&[
                        Some(requirement.title.as_str()),
                        Some(requirement.description.as_str()),
                    ])
                })
        })?;

        let ranked = rank(
            visible,
            term.as_ref(),
            |term, requirement| {
                term.score(&[
                    (Some(requirement.title.as_str()), Weight::A),
                    (Some(requirement.description.as_str()), Weight::B),
                ])
            },
            newest_first,
        );

        let counts = count_interests(self.repository.as_ref(), &|_| true)?;
        Ok(ranked
            .iter()
            .map(|requirement| {
                PublicRequirement::new(requirement, counts.get(&requirement.id).copied().unwrap_or(0))
            })
            .collect())
    }

    pub fn get_public(&self, id: RequirementId) -> Result<PublicRequirement, PortalError> {
        let requirement = self
            .repository
            .fetch_requirement(id)?
            .filter(Requirement::publicly_visible)
            .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;
        let counts = count_interests(self.repository.as_ref(), &|interest| {
            interest.requirement_id == id
        })?;
        Ok(PublicRequirement::new(
            &requirement,
            counts.get(&id).copied().unwrap_or(0),
        ))
    }

    /// Moderation queue, oldest first.
    pub fn pending_moderation(&self) -> Result<Vec<ModerationQueueEntry>, PortalError> {
        let mut pending = self
            .repository
            .select_requirements(&Requirement::awaiting_moderation)?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let users = user_index(self.repository.as_ref())?;
        Ok(pending
            .into_iter()
            .map(|requirement| {
                let owner = users.get(&requirement.owner_id);
                ModerationQueueEntry {
                    gcc_name: owner.map(|user| user.name.clone()),
                    gcc_email: owner.map(|user| user.email.clone()),
                    requirement,
                }
            })
            .collect())
    }

    /// PENDING_APPROVAL -> APPROVED | SENT_BACK | REJECTED as one conditional write.
    pub fn moderate(
        &self,
        id: RequirementId,
        action: ModerationAction,
    ) -> Result<Requirement, PortalError> {
        let now: DateTime<Utc> = Utc::now();
        let target = action.target();
        let updated = self.repository.update_requirement_where(
            id,
            &Requirement::awaiting_moderation,
            &mut |requirement| action.apply(requirement, now),
        )?;

        match updated {
            Some(requirement) => {
                info!(requirement_id = %id, status = target.label(), "requirement moderated");
                Ok(requirement)
            }
            None => {
                warn!(requirement_id = %id, status = target.label(), "moderation refused");
                Err(PortalError::not_found(
                    "Requirement not found or already processed",
                ))
            }
        }
    }

    /// Own requirements in progress or with an accepted startup, most recently updated first.
    pub fn active_deals(&self, owner: &Principal) -> Result<Vec<ActiveDeal>, PortalError> {
        let owner_id = owner.id;
        let accepted = count_interests(self.repository.as_ref(), &|interest| {
            interest.status == InterestStatus::Accepted
        })?;

        let mut deals: Vec<ActiveDeal> = self
            .repository
            .select_requirements(&|requirement| requirement.owner_id == owner_id)?
            .into_iter()
            .filter_map(|requirement| {
                let accepted_count = accepted.get(&requirement.id).copied().unwrap_or(0);
                requirement
                    .has_active_deal(accepted_count)
                    .then(|| ActiveDeal {
                        id: requirement.id,
                        title: requirement.title,
                        category: requirement.category,
                        status: requirement.status,
                        updated_at: requirement.updated_at,
                        accepted_count,
                    })
            })
            .collect();
        deals.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(deals)
    }
}
