use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{normalize_email, InterestId, RequirementId, UserId, UserRecord};
use super::interest::ExpressionOfInterest;
use super::profile::Profile;
use super::repository::{InterestUpsert, Mutation, PortalRepository, Predicate, RepositoryError};
use super::requirement::Requirement;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    profiles: BTreeMap<UserId, Profile>,
    requirements: BTreeMap<RequirementId, Requirement>,
    interests: BTreeMap<InterestId, ExpressionOfInterest>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        let email = normalize_email(email);
        self.users
            .values()
            .any(|user| Some(user.id) != except && normalize_email(&user.email) == email)
    }

    fn drop_interests_for(&mut self, requirement_id: RequirementId) {
        self.interests
            .retain(|_, interest| interest.requirement_id != requirement_id);
    }
}

/// Process-local store. One mutex guards every table, so each conditional
/// write observes and updates a consistent snapshot.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl PortalRepository for MemoryStore {
    fn insert_account(
        &self,
        user: UserRecord,
        profile: Option<Profile>,
    ) -> Result<UserRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict(
                "Email already registered".to_string(),
            ));
        }
        if tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict("account already exists".to_string()));
        }
        if let Some(profile) = profile {
            tables.profiles.insert(user.id, profile);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let email = normalize_email(email);
        let tables = self.tables()?;
        Ok(tables
            .users
            .values()
            .find(|user| normalize_email(&user.email) == email)
            .cloned())
    }

    fn select_users(
        &self,
        filter: Predicate<'_, UserRecord>,
    ) -> Result<Vec<UserRecord>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .values()
            .filter(|user| filter(user))
            .cloned()
            .collect())
    }

    fn update_user_where(
        &self,
        id: UserId,
        precondition: Predicate<'_, UserRecord>,
        mutation: Mutation<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let mut tables = self.tables()?;
        let Some(current) = tables.users.get(&id).filter(|user| precondition(user)) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        mutation(&mut updated);
        if tables.email_taken(&updated.email, Some(id)) {
            return Err(RepositoryError::Conflict("Email already in use".to_string()));
        }
        tables.users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    fn delete_user_where(
        &self,
        id: UserId,
        precondition: Predicate<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.users.get(&id).is_some_and(|user| precondition(user)) {
            return Ok(None);
        }

        let removed = tables.users.remove(&id);
        tables.profiles.remove(&id);
        let owned: Vec<RequirementId> = tables
            .requirements
            .values()
            .filter(|requirement| requirement.owner_id == id)
            .map(|requirement| requirement.id)
            .collect();
        for requirement_id in owned {
            tables.requirements.remove(&requirement_id);
            tables.drop_interests_for(requirement_id);
        }
        tables.interests.retain(|_, interest| interest.startup_id != id);
        Ok(removed)
    }

    fn fetch_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables()?.profiles.get(&user_id).cloned())
    }

    fn update_profile_where(
        &self,
        user_id: UserId,
        precondition: Predicate<'_, Profile>,
        mutation: Mutation<'_, Profile>,
    ) -> Result<Option<Profile>, RepositoryError> {
        let mut tables = self.tables()?;
        match tables.profiles.get_mut(&user_id) {
            Some(profile) if precondition(profile) => {
                mutation(profile);
                Ok(Some(profile.clone()))
            }
            _ => Ok(None),
        }
    }

    fn insert_requirement(&self, requirement: Requirement) -> Result<Requirement, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&requirement.owner_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.requirements.contains_key(&requirement.id) {
            return Err(RepositoryError::Conflict(
                "requirement already exists".to_string(),
            ));
        }
        tables
            .requirements
            .insert(requirement.id, requirement.clone());
        Ok(requirement)
    }

    fn fetch_requirement(
        &self,
        id: RequirementId,
    ) -> Result<Option<Requirement>, RepositoryError> {
        Ok(self.tables()?.requirements.get(&id).cloned())
    }

    fn select_requirements(
        &self,
        filter: Predicate<'_, Requirement>,
    ) -> Result<Vec<Requirement>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .requirements
            .values()
            .filter(|requirement| filter(requirement))
            .cloned()
            .collect())
    }

    fn update_requirement_where(
        &self,
        id: RequirementId,
        precondition: Predicate<'_, Requirement>,
        mutation: Mutation<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError> {
        let mut tables = self.tables()?;
        match tables.requirements.get_mut(&id) {
            Some(requirement) if precondition(requirement) => {
                mutation(requirement);
                Ok(Some(requirement.clone()))
            }
            _ => Ok(None),
        }
    }

    fn delete_requirement_where(
        &self,
        id: RequirementId,
        precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables
            .requirements
            .get(&id)
            .is_some_and(|requirement| precondition(requirement))
        {
            return Ok(None);
        }
        let removed = tables.requirements.remove(&id);
        tables.drop_interests_for(id);
        Ok(removed)
    }

    fn upsert_interest_where(
        &self,
        interest: ExpressionOfInterest,
        precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<InterestUpsert>, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables
            .requirements
            .get(&interest.requirement_id)
            .is_some_and(|requirement| precondition(requirement))
        {
            return Ok(None);
        }
        if !tables.users.contains_key(&interest.startup_id) {
            return Err(RepositoryError::NotFound);
        }

        let existing = tables
            .interests
            .values()
            .find(|stored| {
                stored.requirement_id == interest.requirement_id
                    && stored.startup_id == interest.startup_id
            })
            .map(|stored| stored.id);
        let outcome = match existing {
            Some(existing_id) => {
                let stored = tables
                    .interests
                    .get_mut(&existing_id)
                    .ok_or(RepositoryError::NotFound)?;
                stored.resubmit_from(interest);
                InterestUpsert::Resubmitted(stored.clone())
            }
            None => {
                tables.interests.insert(interest.id, interest.clone());
                InterestUpsert::Created(interest)
            }
        };
        Ok(Some(outcome))
    }

    fn select_interests(
        &self,
        filter: Predicate<'_, ExpressionOfInterest>,
    ) -> Result<Vec<ExpressionOfInterest>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .interests
            .values()
            .filter(|interest| filter(interest))
            .cloned()
            .collect())
    }

    fn update_interest_where(
        &self,
        id: InterestId,
        precondition: &dyn Fn(&ExpressionOfInterest, &Requirement) -> bool,
        mutation: Mutation<'_, ExpressionOfInterest>,
    ) -> Result<Option<ExpressionOfInterest>, RepositoryError> {
        let mut guard = self.tables()?;
        let tables = &mut *guard;
        let Some(interest) = tables.interests.get_mut(&id) else {
            return Ok(None);
        };
        let Some(requirement) = tables.requirements.get(&interest.requirement_id) else {
            return Ok(None);
        };
        if !precondition(interest, requirement) {
            return Ok(None);
        }
        mutation(interest);
        Ok(Some(interest.clone()))
    }
}
