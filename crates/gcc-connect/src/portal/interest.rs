use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{InterestId, RequirementId, UserId};
use super::error::PortalError;
use super::requirement::RequirementStatus;
use super::validation::{non_blank, optional_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InterestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterestStatus::Pending => "PENDING",
            InterestStatus::Accepted => "ACCEPTED",
            InterestStatus::Rejected => "REJECTED",
        }
    }
}

/// A startup's application against a requirement. One per (requirement, startup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionOfInterest {
    pub id: InterestId,
    pub requirement_id: RequirementId,
    pub startup_id: UserId,
    pub message: Option<String>,
    pub proposed_budget: Option<f64>,
    pub proposed_timeline_start: Option<NaiveDate>,
    pub proposed_timeline_end: Option<NaiveDate>,
    pub portfolio_link: Option<String>,
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpressionOfInterest {
    /// Overwrites the proposal in place and puts the application back in the queue.
    pub fn resubmit_from(&mut self, incoming: ExpressionOfInterest) {
        self.message = incoming.message;
        self.proposed_budget = incoming.proposed_budget;
        self.proposed_timeline_start = incoming.proposed_timeline_start;
        self.proposed_timeline_end = incoming.proposed_timeline_end;
        self.portfolio_link = incoming.portfolio_link;
        self.status = InterestStatus::Pending;
        self.updated_at = incoming.updated_at;
    }
}

/// Startup payload for `express interest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterestSubmission {
    pub message: Option<String>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub proposed_budget: Option<f64>,
    pub proposed_timeline_start: Option<NaiveDate>,
    pub proposed_timeline_end: Option<NaiveDate>,
    pub portfolio_link: Option<String>,
}

impl InterestSubmission {
    pub fn into_interest(
        self,
        requirement_id: RequirementId,
        startup_id: UserId,
        now: DateTime<Utc>,
    ) -> ExpressionOfInterest {
        ExpressionOfInterest {
            id: InterestId::generate(),
            requirement_id,
            startup_id,
            message: non_blank(self.message),
            proposed_budget: self.proposed_budget,
            proposed_timeline_start: self.proposed_timeline_start,
            proposed_timeline_end: self.proposed_timeline_end,
            portfolio_link: non_blank(self.portfolio_link),
            status: InterestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// GCC owner's response to a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterestDecision {
    Accept,
    Reject,
}

impl InterestDecision {
    pub fn parse(raw: Option<&str>) -> Result<Self, PortalError> {
        match raw.map(str::trim) {
            Some("ACCEPTED") | Some("ACCEPT") => Ok(InterestDecision::Accept),
            Some("REJECTED") | Some("REJECT") => Ok(InterestDecision::Reject),
            _ => Err(PortalError::validation(
                "Status must be ACCEPTED or REJECTED",
            )),
        }
    }

    pub const fn target(self) -> InterestStatus {
        match self {
            InterestDecision::Accept => InterestStatus::Accepted,
            InterestDecision::Reject => InterestStatus::Rejected,
        }
    }
}

/// Startup's own application, joined with the requirement's public handle.
#[derive(Debug, Clone, Serialize)]
pub struct StartupInterestView {
    #[serde(flatten)]
    pub interest: ExpressionOfInterest,
    pub requirement_title: String,
    pub category: String,
    pub anonymized_id: String,
}

/// Application as the owning GCC sees it on the requirement detail.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub interest: ExpressionOfInterest,
    pub startup_name: Option<String>,
    pub startup_email: Option<String>,
}

/// Row in the GCC "received interests" inbox.
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedInterest {
    pub id: InterestId,
    pub requirement_id: RequirementId,
    pub interest_status: InterestStatus,
    pub created_at: DateTime<Utc>,
    pub requirement_title: String,
    pub category: String,
    pub requirement_status: RequirementStatus,
    pub startup_name: Option<String>,
    pub startup_email: Option<String>,
    pub startup_company: Option<String>,
}
