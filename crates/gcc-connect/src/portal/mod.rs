//! GCC and startup matchmaking: account approval, requirement moderation,
//! expressions of interest, and ranked discovery.
//!
//! Requests resolve an identity once, pass the guard chain in [`access`], and
//! reach one of the services in [`service`], which read and write through a
//! [`PortalRepository`]. Every state transition is a single conditional write,
//! so concurrent admin and end-user actions cannot both succeed on the same row.

pub mod access;
pub mod domain;
pub mod error;
pub mod identity;
pub mod interest;
pub mod profile;
pub mod repository;
pub mod requirement;
pub mod router;
pub mod search;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, AccessPolicy, Authorized, OptionalPrincipal};
pub use domain::{
    AccountDecision, ApprovalStatus, InterestId, Principal, RequirementId, Role, UserId,
    UserRecord, UserView,
};
pub use error::PortalError;
pub use identity::{
    Argon2Hasher, ClaimsService, CredentialError, CredentialHasher, IdentityResolver,
    IssuedToken, JwtClaimsService,
};
pub use interest::{ExpressionOfInterest, InterestDecision, InterestStatus, InterestSubmission};
pub use profile::{GccProfile, GccProfilePatch, Profile, StartupProfile, StartupProfilePatch};
pub use repository::{PortalRepository, RepositoryError};
pub use requirement::{
    ModerationAction, ModerationStatus, Priority, Requirement, RequirementDraft, RequirementPatch,
    RequirementStatus,
};
pub use router::portal_router;
pub use service::{LoginOutcome, Portal, SeedOutcome};
pub use store::MemoryStore;
pub use validation::{LoginRequest, RegistrationRequest};
