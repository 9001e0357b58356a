use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{RequirementId, UserId};
use super::error::PortalError;
use super::validation::{non_blank, optional_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Business lifecycle, driven by the owning GCC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    Open,
    InProgress,
    Closed,
}

impl RequirementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequirementStatus::Open => "OPEN",
            RequirementStatus::InProgress => "IN_PROGRESS",
            RequirementStatus::Closed => "CLOSED",
        }
    }
}

/// Moderation lifecycle, driven by admins. Independent of [`RequirementStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    PendingApproval,
    Approved,
    SentBack,
    Rejected,
}

impl ModerationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ModerationStatus::PendingApproval => "PENDING_APPROVAL",
            ModerationStatus::Approved => "APPROVED",
            ModerationStatus::SentBack => "SENT_BACK",
            ModerationStatus::Rejected => "REJECTED",
        }
    }
}

/// A GCC requirement posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: RequirementStatus,
    pub approval_status: ModerationStatus,
    pub admin_remarks: Option<String>,
    pub admin_remarks_at: Option<DateTime<Utc>>,
    pub anonymized_id: String,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub budget_currency: String,
    pub timeline_start: Option<NaiveDate>,
    pub timeline_end: Option<NaiveDate>,
    pub tech_stack: Vec<String>,
    pub skills: Vec<String>,
    pub industry_type: Option<String>,
    pub nda_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requirement {
    /// Startups see a requirement whenever it is OPEN, whatever its moderation state.
    pub fn publicly_visible(&self) -> bool {
        self.status == RequirementStatus::Open
    }

    pub fn accepts_interest(&self) -> bool {
        self.status == RequirementStatus::Open
    }

    pub fn awaiting_moderation(&self) -> bool {
        self.approval_status == ModerationStatus::PendingApproval
    }

    /// Derived on read: work has started, or some startup has been accepted.
    pub fn has_active_deal(&self, accepted_interests: usize) -> bool {
        self.status == RequirementStatus::InProgress || accepted_interests > 0
    }
}

/// Opaque, stable handle shown to startups instead of the owner's identity.
pub fn anonymized_id(now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis().max(0) as u64;
    let mut digits = Vec::new();
    loop {
        let digit = (millis % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0').to_ascii_uppercase());
        millis /= 36;
        if millis == 0 {
            break;
        }
    }
    let stamp: String = digits.into_iter().rev().collect();
    let salt = Uuid::new_v4().simple().to_string();
    format!("GCC-{stamp}-{}", salt[..4].to_ascii_uppercase())
}

/// Payload for a new requirement posting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub budget_min: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub budget_max: Option<f64>,
    pub budget_currency: Option<String>,
    pub timeline_start: Option<NaiveDate>,
    pub timeline_end: Option<NaiveDate>,
    pub tech_stack: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub industry_type: Option<String>,
    pub nda_required: Option<bool>,
}

impl RequirementDraft {
    pub fn into_requirement(
        self,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Requirement, PortalError> {
        let (Some(title), Some(description), Some(category)) = (
            non_blank(self.title),
            non_blank(self.description),
            non_blank(self.category),
        ) else {
            return Err(PortalError::validation(
                "Title, description and category are required",
            ));
        };

        Ok(Requirement {
            id: RequirementId::generate(),
            owner_id,
            title,
            description,
            category,
            priority: self.priority.unwrap_or_default(),
            status: RequirementStatus::Open,
            approval_status: ModerationStatus::PendingApproval,
            admin_remarks: None,
            admin_remarks_at: None,
            anonymized_id: anonymized_id(now),
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            budget_currency: non_blank(self.budget_currency).unwrap_or_else(|| "USD".to_string()),
            timeline_start: self.timeline_start,
            timeline_end: self.timeline_end,
            tech_stack: self.tech_stack.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            industry_type: non_blank(self.industry_type),
            nda_required: self.nda_required.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Owner-side partial update. Omitted or blank fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<RequirementStatus>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub budget_min: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub budget_max: Option<f64>,
    pub timeline_start: Option<NaiveDate>,
    pub timeline_end: Option<NaiveDate>,
    pub tech_stack: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub industry_type: Option<String>,
    pub nda_required: Option<bool>,
    /// Must be set explicitly; edits alone never leave SENT_BACK.
    #[serde(default)]
    pub resubmit: bool,
}

impl RequirementPatch {
    /// Applies the edit and, when flagged from SENT_BACK, returns the requirement
    /// to the moderation queue. Returns whether a resubmission happened.
    pub fn apply(self, requirement: &mut Requirement, now: DateTime<Utc>) -> bool {
        if let Some(title) = non_blank(self.title) {
            requirement.title = title;
        }
        if let Some(description) = non_blank(self.description) {
            requirement.description = description;
        }
        if let Some(category) = non_blank(self.category) {
            requirement.category = category;
        }
        if let Some(priority) = self.priority {
            requirement.priority = priority;
        }
        if let Some(status) = self.status {
            requirement.status = status;
        }
        if let Some(budget_min) = self.budget_min {
            requirement.budget_min = Some(budget_min);
        }
        if let Some(budget_max) = self.budget_max {
            requirement.budget_max = Some(budget_max);
        }
        if let Some(start) = self.timeline_start {
            requirement.timeline_start = Some(start);
        }
        if let Some(end) = self.timeline_end {
            requirement.timeline_end = Some(end);
        }
        if let Some(tech_stack) = self.tech_stack {
            requirement.tech_stack = tech_stack;
        }
        if let Some(skills) = self.skills {
            requirement.skills = skills;
        }
        if let Some(industry_type) = non_blank(self.industry_type) {
            requirement.industry_type = Some(industry_type);
        }
        if let Some(nda_required) = self.nda_required {
            requirement.nda_required = nda_required;
        }

        let resubmitted =
            self.resubmit && requirement.approval_status == ModerationStatus::SentBack;
        if resubmitted {
            requirement.approval_status = ModerationStatus::PendingApproval;
            requirement.admin_remarks = None;
            requirement.admin_remarks_at = None;
        }
        requirement.updated_at = now;
        resubmitted
    }
}

/// Admin decision on a requirement awaiting moderation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    SendBack { remarks: Option<String> },
    Reject { remarks: Option<String> },
}

impl ModerationAction {
    pub fn send_back(remarks: Option<String>) -> Self {
        Self::SendBack {
            remarks: non_blank(remarks),
        }
    }

    pub fn reject(remarks: Option<String>) -> Self {
        Self::Reject {
            remarks: non_blank(remarks),
        }
    }

    pub const fn target(&self) -> ModerationStatus {
        match self {
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::SendBack { .. } => ModerationStatus::SentBack,
            ModerationAction::Reject { .. } => ModerationStatus::Rejected,
        }
    }

    pub fn apply(&self, requirement: &mut Requirement, now: DateTime<Utc>) {
        requirement.approval_status = self.target();
        match self {
            ModerationAction::Approve => {
                requirement.admin_remarks = None;
                requirement.admin_remarks_at = None;
            }
            ModerationAction::SendBack { remarks } | ModerationAction::Reject { remarks } => {
                requirement.admin_remarks = remarks.clone();
                requirement.admin_remarks_at = Some(now);
            }
        }
        requirement.updated_at = now;
    }
}

/// Requirement as served to startups and anonymous readers; the owner is withheld.
#[derive(Debug, Clone, Serialize)]
pub struct PublicRequirement {
    pub id: RequirementId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: RequirementStatus,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub budget_currency: String,
    pub timeline_start: Option<NaiveDate>,
    pub timeline_end: Option<NaiveDate>,
    pub tech_stack: Vec<String>,
    pub skills: Vec<String>,
    pub industry_type: Option<String>,
    pub nda_required: bool,
    pub anonymized_id: String,
    pub created_at: DateTime<Utc>,
    pub interest_count: usize,
}

impl PublicRequirement {
    pub fn new(requirement: &Requirement, interest_count: usize) -> Self {
        Self {
            id: requirement.id,
            title: requirement.title.clone(),
            description: requirement.description.clone(),
            category: requirement.category.clone(),
            priority: requirement.priority,
            status: requirement.status,
            budget_min: requirement.budget_min,
            budget_max: requirement.budget_max,
            budget_currency: requirement.budget_currency.clone(),
            timeline_start: requirement.timeline_start,
            timeline_end: requirement.timeline_end,
            tech_stack: requirement.tech_stack.clone(),
            skills: requirement.skills.clone(),
            industry_type: requirement.industry_type.clone(),
            nda_required: requirement.nda_required,
            anonymized_id: requirement.anonymized_id.clone(),
            created_at: requirement.created_at,
            interest_count,
        }
    }
}

/// Owner's listing row.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedRequirement {
    #[serde(flatten)]
    pub requirement: Requirement,
    pub interest_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveDeal {
    pub id: RequirementId,
    pub title: String,
    pub category: String,
    pub status: RequirementStatus,
    pub updated_at: DateTime<Utc>,
    pub accepted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RequirementDraft {
        RequirementDraft {
            title: Some("Computer vision for QA".to_string()),
            description: Some("Detect defects on the assembly line".to_string()),
            category: Some("AI".to_string()),
            ..RequirementDraft::default()
        }
    }

    fn requirement() -> Requirement {
        draft()
            .into_requirement(UserId::generate(), Utc::now())
            .expect("valid draft")
    }

    #[test]
    fn new_requirements_start_open_and_pending() {
        let requirement = requirement();
        assert_eq!(requirement.status, RequirementStatus::Open);
        assert_eq!(requirement.approval_status, ModerationStatus::PendingApproval);
        assert_eq!(requirement.priority, Priority::Medium);
        assert_eq!(requirement.budget_currency, "USD");
        assert!(!requirement.nda_required);
        assert!(requirement.anonymized_id.starts_with("GCC-"));
        assert!(requirement.publicly_visible());
    }

    #[test]
    fn drafts_require_title_description_and_category() {
        let mut missing = draft();
        missing.category = Some(" ".to_string());
        match missing.into_requirement(UserId::generate(), Utc::now()) {
            Err(PortalError::Validation(message)) => {
                assert_eq!(message, "Title, description and category are required")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn resubmit_only_leaves_sent_back() {
        let now = Utc::now();
        let mut pending = requirement();
        let resubmitted = RequirementPatch {
            resubmit: true,
            ..RequirementPatch::default()
        }
        .apply(&mut pending, now);
        assert!(!resubmitted);
        assert_eq!(pending.approval_status, ModerationStatus::PendingApproval);

        let mut sent_back = requirement();
        ModerationAction::send_back(Some(" add budget ".to_string())).apply(&mut sent_back, now);
        assert_eq!(sent_back.admin_remarks.as_deref(), Some("add budget"));

        let edited = RequirementPatch {
            title: Some("Vision QA v2".to_string()),
            ..RequirementPatch::default()
        }
        .apply(&mut sent_back, now);
        assert!(!edited);
        assert_eq!(sent_back.approval_status, ModerationStatus::SentBack);

        let resubmitted = RequirementPatch {
            resubmit: true,
            ..RequirementPatch::default()
        }
        .apply(&mut sent_back, now);
        assert!(resubmitted);
        assert_eq!(sent_back.approval_status, ModerationStatus::PendingApproval);
        assert_eq!(sent_back.admin_remarks, None);
        assert_eq!(sent_back.admin_remarks_at, None);
        assert_eq!(sent_back.title, "Vision QA v2");
    }

    #[test]
    fn blank_remarks_are_stored_as_none() {
        let mut requirement = requirement();
        ModerationAction::reject(Some("   ".to_string())).apply(&mut requirement, Utc::now());
        assert_eq!(requirement.approval_status, ModerationStatus::Rejected);
        assert_eq!(requirement.admin_remarks, None);
        assert!(requirement.admin_remarks_at.is_some());
    }

    #[test]
    fn active_deal_is_derived() {
        let mut requirement = requirement();
        assert!(!requirement.has_active_deal(0));
        assert!(requirement.has_active_deal(1));
        requirement.status = RequirementStatus::InProgress;
        assert!(requirement.has_active_deal(0));
    }

    #[test]
    fn public_view_omits_owner() {
        let json = serde_json::to_value(PublicRequirement::new(&requirement(), 3)).expect("json");
        assert!(json.get("owner_id").is_none());
        assert_eq!(json["interest_count"], 3);
    }
}
