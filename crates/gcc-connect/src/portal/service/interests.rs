use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::user_index;
use crate::portal::domain::{InterestId, Principal, RequirementId};
use crate::portal::error::PortalError;
use crate::portal::interest::{
    ExpressionOfInterest, InterestDecision, InterestStatus, InterestSubmission, ReceivedInterest,
    StartupInterestView,
};
use crate::portal::repository::{InterestUpsert, PortalRepository};
use crate::portal::requirement::Requirement;

/// Expression-of-interest lifecycle: submission by startups, responses by GCC owners.
pub struct InterestService<R> {
    repository: Arc<R>,
}

impl<R> InterestService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Creates the application, or overwrites the startup's earlier one and
    /// resets it to PENDING. The requirement must be OPEN at write time.
    pub fn submit(
        &self,
        startup: &Principal,
        requirement_id: RequirementId,
        submission: InterestSubmission,
    ) -> Result<ExpressionOfInterest, PortalError> {
        let interest = submission.into_interest(requirement_id, startup.id, Utc::now());
        let outcome = self
            .repository
            .upsert_interest_where(interest, &Requirement::accepts_interest)?;

        match outcome {
            Some(InterestUpsert::Created(interest)) => {
                info!(interest_id = %interest.id, requirement_id = %requirement_id, "interest submitted");
                Ok(interest)
            }
            Some(InterestUpsert::Resubmitted(interest)) => {
                info!(interest_id = %interest.id, requirement_id = %requirement_id, "interest resubmitted; status reset to PENDING");
                Ok(interest)
            }
            None => {
                warn!(requirement_id = %requirement_id, startup_id = %startup.id, "interest refused; requirement not open");
                Err(PortalError::not_found("Requirement not found or not open"))
            }
        }
    }

    /// The startup's applications, newest first.
    pub fn mine(&self, startup: &Principal) -> Result<Vec<StartupInterestView>, PortalError> {
        let startup_id = startup.id;
        let mut interests = self
            .repository
            .select_interests(&|interest| interest.startup_id == startup_id)?;
        interests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let requirements: HashMap<RequirementId, Requirement> = self
            .repository
            .select_requirements(&|_| true)?
            .into_iter()
            .map(|requirement| (requirement.id, requirement))
            .collect();

        Ok(interests
            .into_iter()
            .filter_map(|interest| {
                let requirement = requirements.get(&interest.requirement_id)?;
                Some(StartupInterestView {
                    requirement_title: requirement.title.clone(),
                    category: requirement.category.clone(),
                    anonymized_id: requirement.anonymized_id.clone(),
                    interest,
                })
            })
            .collect())
    }

    /// Applications against the owner's requirements, newest first.
    pub fn received(&self, owner: &Principal) -> Result<Vec<ReceivedInterest>, PortalError> {
        let owner_id = owner.id;
        let owned: HashMap<RequirementId, Requirement> = self
            .repository
            .select_requirements(&|requirement| requirement.owner_id == owner_id)?
            .into_iter()
            .map(|requirement| (requirement.id, requirement))
            .collect();

        let mut interests = self
            .repository
            .select_interests(&|interest| owned.contains_key(&interest.requirement_id))?;
        interests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let users = user_index(self.repository.as_ref())?;
        let mut received = Vec::with_capacity(interests.len());
        for interest in interests {
            let Some(requirement) = owned.get(&interest.requirement_id) else {
                continue;
            };
            let startup = users.get(&interest.startup_id);
            let company = self
                .repository
                .fetch_profile(interest.startup_id)?
                .and_then(|profile| profile.as_startup().and_then(|p| p.company_name.clone()));
            received.push(ReceivedInterest {
                id: interest.id,
                requirement_id: interest.requirement_id,
                interest_status: interest.status,
                created_at: interest.created_at,
                requirement_title: requirement.title.clone(),
                category: requirement.category.clone(),
                requirement_status: requirement.status,
                startup_name: startup.map(|user| user.name.clone()),
                startup_email: startup.map(|user| user.email.clone()),
                startup_company: company,
            });
        }
        Ok(received)
    }

    /// PENDING -> ACCEPTED | REJECTED by the requirement's owner.
    ///
    /// Someone else's interest reports the same way as a missing or decided one.
    pub fn respond(
        &self,
        owner: &Principal,
        interest_id: InterestId,
        decision: InterestDecision,
    ) -> Result<ExpressionOfInterest, PortalError> {
        let owner_id = owner.id;
        let target = decision.target();
        let now = Utc::now();
        let updated = self.repository.update_interest_where(
            interest_id,
            &|interest, requirement| {
                requirement.owner_id == owner_id && interest.status == InterestStatus::Pending
            },
            &mut |interest| {
                interest.status = target;
                interest.updated_at = now;
            },
        )?;

        match updated {
            Some(interest) => {
                info!(interest_id = %interest_id, status = target.label(), "interest decided");
                Ok(interest)
            }
            None => {
                warn!(interest_id = %interest_id, status = target.label(), "interest decision refused");
                Err(PortalError::not_found(
                    "Interest not found or already processed",
                ))
            }
        }
    }
}
