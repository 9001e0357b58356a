use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::UserId;
use super::error::PortalError;
use super::validation::{
    non_blank, optional_year, phone_field, phone_message, ValidRegistration,
};

/// Copies every supplied patch field over the stored value; `None` keeps the old one.
macro_rules! coalesce {
    ($target:expr, $patch:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = Some(value);
            }
        )+
    };
}

/// Company record owned by a GCC account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GccProfile {
    pub user_id: UserId,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub parent_company: Option<String>,
    pub headquarters_location: Option<String>,
    pub gcc_locations: Option<String>,
    pub year_established: Option<i32>,
    pub contact_designation: Option<String>,
    pub contact_email: Option<String>,
    pub additional_email: Option<String>,
    pub gst_number: Option<String>,
    pub mobile_primary: Option<String>,
    pub mobile_secondary: Option<String>,
    pub alternate_contact_person: Option<String>,
    pub alternate_contact_designation: Option<String>,
    pub alternate_contact_email: Option<String>,
    pub alternate_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GccProfile {
    pub fn from_registration(
        user_id: UserId,
        registration: &ValidRegistration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            company_name: registration.company_name.clone(),
            industry: registration.industry.clone(),
            location: None,
            size: None,
            description: Some(registration.description.clone()),
            website: registration.website.clone(),
            contact_person: None,
            phone: None,
            linkedin: None,
            parent_company: registration.parent_company.clone(),
            headquarters_location: None,
            gcc_locations: None,
            year_established: registration.year_established,
            contact_designation: None,
            contact_email: None,
            additional_email: registration.additional_email.clone(),
            gst_number: registration.gst_number.clone(),
            mobile_primary: registration.mobile_primary.clone(),
            mobile_secondary: registration.mobile_secondary.clone(),
            alternate_contact_person: None,
            alternate_contact_designation: None,
            alternate_contact_email: None,
            alternate_contact_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: GccProfilePatch, now: DateTime<Utc>) {
        coalesce!(self, patch;
            company_name,
            industry,
            location,
            size,
            description,
            website,
            contact_person,
            phone,
            linkedin,
            parent_company,
            headquarters_location,
            gcc_locations,
            year_established,
            contact_designation,
            contact_email,
            additional_email,
            mobile_secondary,
            alternate_contact_person,
            alternate_contact_designation,
            alternate_contact_email,
            alternate_contact_phone,
        );
        self.updated_at = now;
    }
}

/// Company record owned by a STARTUP account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupProfile {
    pub user_id: UserId,
    pub company_name: Option<String>,
    pub legal_entity_name: Option<String>,
    pub founding_year: Option<i32>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin_page: Option<String>,
    pub contact_phone: Option<String>,
    pub founder_names: Option<String>,
    pub team_size: Option<String>,
    pub industry: Option<String>,
    pub target_market: Option<String>,
    pub revenue_stage: Option<String>,
    pub customer_type: Option<String>,
    pub solution_description: Option<String>,
    pub primary_offering_type: Option<String>,
    pub deployment_stage: Option<String>,
    pub tech_stack: Option<String>,
    pub key_features: Option<String>,
    pub has_patents: Option<bool>,
    pub patents_description: Option<String>,
    pub funding: Option<String>,
    pub total_funds_raised: Option<String>,
    pub investors: Option<String>,
    pub pitch_deck_url: Option<String>,
    pub data_sharing_consent: Option<bool>,
    pub profile_completion_percentage: Option<u8>,
    pub gst_number: Option<String>,
    pub additional_email: Option<String>,
    pub mobile_primary: Option<String>,
    pub mobile_secondary: Option<String>,
    pub reverification_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StartupProfile {
    pub fn from_registration(
        user_id: UserId,
        registration: &ValidRegistration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            company_name: registration.company_name.clone(),
            legal_entity_name: None,
            founding_year: registration.year_established,
            location: None,
            website: registration.website.clone(),
            linkedin_page: None,
            contact_phone: None,
            founder_names: None,
            team_size: None,
            industry: registration.industry.clone(),
            target_market: None,
            revenue_stage: None,
            customer_type: None,
            solution_description: Some(registration.description.clone()),
            primary_offering_type: None,
            deployment_stage: None,
            tech_stack: None,
            key_features: None,
            has_patents: None,
            patents_description: None,
            funding: None,
            total_funds_raised: None,
            investors: None,
            pitch_deck_url: None,
            data_sharing_consent: None,
            profile_completion_percentage: None,
            gst_number: registration.gst_number.clone(),
            additional_email: registration.additional_email.clone(),
            mobile_primary: registration.mobile_primary.clone(),
            mobile_secondary: registration.mobile_secondary.clone(),
            reverification_required: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field edits only; the owner-facing update also clears the reverification flag.
    pub fn apply(&mut self, patch: StartupProfilePatch, now: DateTime<Utc>) {
        coalesce!(self, patch;
            company_name,
            legal_entity_name,
            founding_year,
            location,
            website,
            linkedin_page,
            contact_phone,
            founder_names,
            team_size,
            industry,
            target_market,
            revenue_stage,
            customer_type,
            solution_description,
            primary_offering_type,
            deployment_stage,
            tech_stack,
            key_features,
            has_patents,
            patents_description,
            funding,
            total_funds_raised,
            investors,
            pitch_deck_url,
            data_sharing_consent,
            profile_completion_percentage,
        );
        self.updated_at = now;
    }
}

/// The single profile attached to a registrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
    Gcc(GccProfile),
    Startup(StartupProfile),
}

impl Profile {
    pub fn user_id(&self) -> UserId {
        match self {
            Profile::Gcc(profile) => profile.user_id,
            Profile::Startup(profile) => profile.user_id,
        }
    }

    pub fn as_startup(&self) -> Option<&StartupProfile> {
        match self {
            Profile::Startup(profile) => Some(profile),
            Profile::Gcc(_) => None,
        }
    }

    pub fn as_gcc(&self) -> Option<&GccProfile> {
        match self {
            Profile::Gcc(profile) => Some(profile),
            Profile::Startup(_) => None,
        }
    }
}

/// Partial GCC profile update. Blank strings count as "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GccProfilePatch {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub parent_company: Option<String>,
    pub headquarters_location: Option<String>,
    pub gcc_locations: Option<String>,
    #[serde(default, deserialize_with = "optional_year")]
    pub year_established: Option<i32>,
    pub contact_designation: Option<String>,
    pub contact_email: Option<String>,
    pub additional_email: Option<String>,
    pub mobile_secondary: Option<String>,
    pub alternate_contact_person: Option<String>,
    pub alternate_contact_designation: Option<String>,
    pub alternate_contact_email: Option<String>,
    pub alternate_contact_phone: Option<String>,
}

impl GccProfilePatch {
    pub fn normalize(self) -> Result<Self, PortalError> {
        Ok(Self {
            company_name: non_blank(self.company_name),
            industry: non_blank(self.industry),
            location: non_blank(self.location),
            size: non_blank(self.size),
            description: non_blank(self.description),
            website: non_blank(self.website),
            contact_person: non_blank(self.contact_person),
            phone: non_blank(self.phone),
            linkedin: non_blank(self.linkedin),
            parent_company: non_blank(self.parent_company),
            headquarters_location: non_blank(self.headquarters_location),
            gcc_locations: non_blank(self.gcc_locations),
            year_established: self.year_established,
            contact_designation: non_blank(self.contact_designation),
            contact_email: non_blank(self.contact_email),
            additional_email: non_blank(self.additional_email),
            mobile_secondary: phone_field(self.mobile_secondary, phone_message())?,
            alternate_contact_person: non_blank(self.alternate_contact_person),
            alternate_contact_designation: non_blank(self.alternate_contact_designation),
            alternate_contact_email: non_blank(self.alternate_contact_email),
            alternate_contact_phone: phone_field(
                self.alternate_contact_phone,
                "Alternate contact phone should contain only digits (and optional + or spaces).",
            )?,
        })
    }
}

/// Partial startup profile update. Blank strings count as "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartupProfilePatch {
    pub company_name: Option<String>,
    pub legal_entity_name: Option<String>,
    #[serde(default, deserialize_with = "optional_year")]
    pub founding_year: Option<i32>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin_page: Option<String>,
    pub contact_phone: Option<String>,
    pub founder_names: Option<String>,
    pub team_size: Option<String>,
    pub industry: Option<String>,
    pub target_market: Option<String>,
    pub revenue_stage: Option<String>,
    pub customer_type: Option<String>,
    pub solution_description: Option<String>,
    pub primary_offering_type: Option<String>,
    pub deployment_stage: Option<String>,
    pub tech_stack: Option<String>,
    pub key_features: Option<String>,
    pub has_patents: Option<bool>,
    pub patents_description: Option<String>,
    pub funding: Option<String>,
    pub total_funds_raised: Option<String>,
    pub investors: Option<String>,
    pub pitch_deck_url: Option<String>,
    pub data_sharing_consent: Option<bool>,
    pub profile_completion_percentage: Option<u8>,
}

impl StartupProfilePatch {
    pub fn normalize(self) -> Result<Self, PortalError> {
        if matches!(self.profile_completion_percentage, Some(pct) if pct > 100) {
            return Err(PortalError::validation(
                "Profile completion percentage must be between 0 and 100",
            ));
        }

        Ok(Self {
            company_name: non_blank(self.company_name),
            legal_entity_name: non_blank(self.legal_entity_name),
            founding_year: self.founding_year,
            location: non_blank(self.location),
            website: non_blank(self.website),
            linkedin_page: non_blank(self.linkedin_page),
            contact_phone: phone_field(
                self.contact_phone,
                "Contact phone should contain only digits (and optional + or spaces).",
            )?,
            founder_names: non_blank(self.founder_names),
            team_size: non_blank(self.team_size),
            industry: non_blank(self.industry),
            target_market: non_blank(self.target_market),
            revenue_stage: non_blank(self.revenue_stage),
            customer_type: non_blank(self.customer_type),
            solution_description: non_blank(self.solution_description),
            primary_offering_type: non_blank(self.primary_offering_type),
            deployment_stage: non_blank(self.deployment_stage),
            tech_stack: non_blank(self.tech_stack),
            key_features: non_blank(self.key_features),
            has_patents: self.has_patents,
            patents_description: non_blank(self.patents_description),
            funding: non_blank(self.funding),
            total_funds_raised: non_blank(self.total_funds_raised),
            investors: non_blank(self.investors),
            pitch_deck_url: non_blank(self.pitch_deck_url),
            data_sharing_consent: self.data_sharing_consent,
            profile_completion_percentage: self.profile_completion_percentage,
        })
    }
}

/// Admin-side profile edit, shaped by the target account's role.
#[derive(Debug, Clone)]
pub enum ProfilePatch {
    Gcc(GccProfilePatch),
    Startup(StartupProfilePatch),
}

impl ProfilePatch {
    /// Applies the patch when it matches the stored profile kind; returns whether it did.
    pub fn apply_to(self, profile: &mut Profile, now: DateTime<Utc>) -> bool {
        match (self, profile) {
            (ProfilePatch::Gcc(patch), Profile::Gcc(profile)) => {
                profile.apply(patch, now);
                true
            }
            (ProfilePatch::Startup(patch), Profile::Startup(profile)) => {
                profile.apply(patch, now);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::domain::Role;

    fn registration() -> ValidRegistration {
        ValidRegistration {
            name: "Asha Rao".to_string(),
            email: "asha@botworks.io".to_string(),
            password: "secret1".to_string(),
            role: Role::Startup,
            description: "Warehouse robots".to_string(),
            company_name: Some("BotWorks".to_string()),
            website: None,
            parent_company: None,
            year_established: Some(2021),
            industry: Some("Logistics".to_string()),
            gst_number: None,
            additional_email: None,
            mobile_primary: Some("+91 90000 00000".to_string()),
            mobile_secondary: None,
        }
    }

    #[test]
    fn startup_profile_seeds_solution_from_description() {
        let profile = StartupProfile::from_registration(UserId::generate(), &registration(), Utc::now());
        assert_eq!(profile.solution_description.as_deref(), Some("Warehouse robots"));
        assert_eq!(profile.founding_year, Some(2021));
        assert!(!profile.reverification_required);
    }

    #[test]
    fn gcc_patch_keeps_values_for_blank_fields() {
        let now = Utc::now();
        let mut profile = GccProfile::from_registration(UserId::generate(), &registration(), now);
        let patch = GccProfilePatch {
            company_name: Some("   ".to_string()),
            location: Some(" Bengaluru ".to_string()),
            ..GccProfilePatch::default()
        }
        .normalize()
        .expect("valid patch");

        profile.apply(patch, now);
        assert_eq!(profile.company_name.as_deref(), Some("BotWorks"));
        assert_eq!(profile.location.as_deref(), Some("Bengaluru"));
    }

    #[test]
    fn gcc_patch_rejects_lettered_phones() {
        let patch = GccProfilePatch {
            alternate_contact_phone: Some("ext. 44".to_string()),
            ..GccProfilePatch::default()
        };
        match patch.normalize() {
            Err(PortalError::Validation(message)) => {
                assert!(message.starts_with("Alternate contact phone"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_admin_patch_is_ignored() {
        let now = Utc::now();
        let mut profile = Profile::Startup(StartupProfile::from_registration(
            UserId::generate(),
            &registration(),
            now,
        ));
        let applied = ProfilePatch::Gcc(GccProfilePatch::default()).apply_to(&mut profile, now);
        assert!(!applied);
    }

    #[test]
    fn profiles_serialize_with_kind_tag() {
        let profile = Profile::Startup(StartupProfile::from_registration(
            UserId::generate(),
            &registration(),
            Utc::now(),
        ));
        let json = serde_json::to_value(&profile).expect("serializes");
        assert_eq!(json["kind"], "STARTUP");
        assert_eq!(json["company_name"], "BotWorks");
    }
}
