use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses a path segment; malformed input is treated like an unknown id.
            pub fn parse(raw: &str) -> Option<Self> {
                Uuid::parse_str(raw.trim()).ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// Identifier wrapper for registered accounts.
    UserId
);
entity_id!(
    /// Identifier wrapper for GCC requirement postings.
    RequirementId
);
entity_id!(
    /// Identifier wrapper for expressions of interest.
    InterestId
);

/// Account class. ADMIN is seeded out-of-band and never registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Gcc,
    Startup,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Gcc => "GCC",
            Role::Startup => "STARTUP",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ADMIN" => Some(Role::Admin),
            "GCC" => Some(Role::Gcc),
            "STARTUP" => Some(Role::Startup),
            _ => None,
        }
    }

    /// Roles that go through account moderation.
    pub const fn is_registrant(self) -> bool {
        matches!(self, Role::Gcc | Role::Startup)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Account approval state. PENDING is the only state admins can move out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

/// Admin decision on a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountDecision {
    Approve,
    Reject,
}

impl AccountDecision {
    pub const fn target(self) -> ApprovalStatus {
        match self {
            AccountDecision::Approve => ApprovalStatus::Approved,
            AccountDecision::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// Stored account row. The credential digest never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub credential_digest: String,
    pub name: String,
    pub role: Role,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Whether an admin may still decide on this account.
    pub fn awaiting_decision(&self) -> bool {
        self.role.is_registrant() && self.approval_status == ApprovalStatus::Pending
    }

    /// Login gate: admins always pass, registrants only once approved.
    pub fn may_authenticate(&self) -> bool {
        self.role == Role::Admin || self.approval_status == ApprovalStatus::Approved
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            approval_status: self.approval_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            approval_status: self.approval_status,
        }
    }
}

/// Non-sensitive account fields safe to echo back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated caller as embedded in the bearer credential at login time.
///
/// The snapshot is not refreshed from storage, so approval or role changes
/// made after issuance only apply once the user signs in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approval_status: ApprovalStatus,
}

impl Principal {
    /// Admins are implicitly approved regardless of the stored value.
    pub fn effective_approval(&self) -> ApprovalStatus {
        if self.role == Role::Admin {
            ApprovalStatus::Approved
        } else {
            self.approval_status
        }
    }
}

/// Lower-cases and trims an email so lookups are case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: Role, approval_status: ApprovalStatus) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: UserId::generate(),
            email: "ops@example.com".to_string(),
            credential_digest: "digest".to_string(),
            name: "Ops".to_string(),
            role,
            approval_status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_pending_registrants_await_decision() {
        assert!(record(Role::Gcc, ApprovalStatus::Pending).awaiting_decision());
        assert!(record(Role::Startup, ApprovalStatus::Pending).awaiting_decision());
        assert!(!record(Role::Admin, ApprovalStatus::Pending).awaiting_decision());
        assert!(!record(Role::Gcc, ApprovalStatus::Approved).awaiting_decision());
        assert!(!record(Role::Startup, ApprovalStatus::Rejected).awaiting_decision());
    }

    #[test]
    fn admins_authenticate_regardless_of_stored_status() {
        assert!(record(Role::Admin, ApprovalStatus::Pending).may_authenticate());
        assert!(!record(Role::Gcc, ApprovalStatus::Pending).may_authenticate());
        assert!(!record(Role::Startup, ApprovalStatus::Rejected).may_authenticate());
        assert!(record(Role::Startup, ApprovalStatus::Approved).may_authenticate());

        let admin = record(Role::Admin, ApprovalStatus::Rejected).principal();
        assert_eq!(admin.effective_approval(), ApprovalStatus::Approved);
    }

    #[test]
    fn roles_round_trip_through_labels() {
        for role in [Role::Admin, Role::Gcc, Role::Startup] {
            assert_eq!(Role::parse(role.label()), Some(role));
        }
        assert_eq!(Role::parse("gcc"), None);
        assert_eq!(
            serde_json::to_value(ApprovalStatus::Pending).expect("serializes"),
            serde_json::json!("PENDING")
        );
    }

    #[test]
    fn malformed_ids_parse_to_none() {
        assert!(UserId::parse("not-a-uuid").is_none());
        let id = RequirementId::generate();
        assert_eq!(RequirementId::parse(&id.to_string()), Some(id));
    }
}
