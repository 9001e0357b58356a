use super::domain::{InterestId, RequirementId, UserId, UserRecord};
use super::interest::ExpressionOfInterest;
use super::profile::Profile;
use super::requirement::Requirement;

/// Row predicate evaluated inside the store's critical section.
pub type Predicate<'a, T> = &'a dyn Fn(&T) -> bool;

/// In-place edit applied only when the paired predicate held.
pub type Mutation<'a, T> = &'a mut dyn FnMut(&mut T);

/// Result of an interest upsert keyed on (requirement, startup).
#[derive(Debug, Clone, PartialEq)]
pub enum InterestUpsert {
    Created(ExpressionOfInterest),
    Resubmitted(ExpressionOfInterest),
}

impl InterestUpsert {
    pub fn into_inner(self) -> ExpressionOfInterest {
        match self {
            InterestUpsert::Created(interest) | InterestUpsert::Resubmitted(interest) => interest,
        }
    }
}

/// Storage abstraction so the portal services can be exercised in isolation.
///
/// Every `*_where` operation checks its predicate and writes in one indivisible
/// step and returns `Ok(None)` when no row matched. Callers never read, decide,
/// and write back in separate calls for a state transition.
pub trait PortalRepository: Send + Sync {
    /// Stores a new account together with its profile. Emails are unique ignoring case.
    fn insert_account(
        &self,
        user: UserRecord,
        profile: Option<Profile>,
    ) -> Result<UserRecord, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
    fn select_users(
        &self,
        filter: Predicate<'_, UserRecord>,
    ) -> Result<Vec<UserRecord>, RepositoryError>;
    fn update_user_where(
        &self,
        id: UserId,
        precondition: Predicate<'_, UserRecord>,
        mutation: Mutation<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError>;
    /// Removes the account, its profile, its requirements, and every related interest.
    fn delete_user_where(
        &self,
        id: UserId,
        precondition: Predicate<'_, UserRecord>,
    ) -> Result<Option<UserRecord>, RepositoryError>;

    fn fetch_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError>;
    fn update_profile_where(
        &self,
        user_id: UserId,
        precondition: Predicate<'_, Profile>,
        mutation: Mutation<'_, Profile>,
    ) -> Result<Option<Profile>, RepositoryError>;

    fn insert_requirement(&self, requirement: Requirement) -> Result<Requirement, RepositoryError>;
    fn fetch_requirement(&self, id: RequirementId)
        -> Result<Option<Requirement>, RepositoryError>;
    fn select_requirements(
        &self,
        filter: Predicate<'_, Requirement>,
    ) -> Result<Vec<Requirement>, RepositoryError>;
    fn update_requirement_where(
        &self,
        id: RequirementId,
        precondition: Predicate<'_, Requirement>,
        mutation: Mutation<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError>;
    /// Removes the requirement and its interests.
    fn delete_requirement_where(
        &self,
        id: RequirementId,
        precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<Requirement>, RepositoryError>;

    /// Inserts the interest, or resubmits the existing one for the same startup,
    /// provided the target requirement currently satisfies `precondition`.
    fn upsert_interest_where(
        &self,
        interest: ExpressionOfInterest,
        precondition: Predicate<'_, Requirement>,
    ) -> Result<Option<InterestUpsert>, RepositoryError>;
    fn select_interests(
        &self,
        filter: Predicate<'_, ExpressionOfInterest>,
    ) -> Result<Vec<ExpressionOfInterest>, RepositoryError>;
    /// The predicate sees the interest and the requirement it targets.
    fn update_interest_where(
        &self,
        id: InterestId,
        precondition: &dyn Fn(&ExpressionOfInterest, &Requirement) -> bool,
        mutation: Mutation<'_, ExpressionOfInterest>,
    ) -> Result<Option<ExpressionOfInterest>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
