//! Explicit request schemas and field-level validation.
//!
//! Payload structs keep every field optional so a missing value can be reported
//! with the same message a client would see for an empty one.

use serde::Deserialize;

use super::domain::{normalize_email, Role};
use super::error::PortalError;

pub const MIN_PASSWORD_LEN: usize = 6;

const PHONE_MESSAGE: &str = "Mobile should contain only digits (and optional + or spaces).";

/// Trims a string; blank input collapses to `None` ("no value supplied").
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Accepts digits with an optional leading `+`, spaces and hyphens.
pub fn is_phone_like(raw: &str) -> bool {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

/// Validates an optional phone field, returning the trimmed value.
pub fn phone_field(value: Option<String>, message: &str) -> Result<Option<String>, PortalError> {
    match non_blank(value) {
        None => Ok(None),
        Some(phone) if is_phone_like(&phone) => Ok(Some(phone)),
        Some(_) => Err(PortalError::validation(message)),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericField {
    Number(f64),
    Text(String),
}

fn numeric_text<'de, D>(deserializer: D) -> Result<Option<NumericField>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let field = Option::<NumericField>::deserialize(deserializer)?;
    Ok(field.filter(|value| !matches!(value, NumericField::Text(raw) if raw.trim().is_empty())))
}

/// Money fields: a JSON number or a numeric string. `null` and blank strings
/// read as absent.
pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let amount = match numeric_text(deserializer)? {
        None => return Ok(None),
        Some(NumericField::Number(value)) => value,
        Some(NumericField::Text(raw)) => raw.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("expected an amount, found '{}'", raw.trim()))
        })?,
    };
    if amount.is_finite() {
        Ok(Some(amount))
    } else {
        Err(serde::de::Error::custom("expected a finite amount"))
    }
}

/// Year fields: a whole JSON number or a string of digits. `null` and blank
/// strings read as absent.
pub fn optional_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match numeric_text(deserializer)? {
        None => Ok(None),
        Some(NumericField::Number(value))
            if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) =>
        {
            Ok(Some(value as i32))
        }
        Some(NumericField::Number(value)) => Err(serde::de::Error::custom(format!(
            "expected a whole year, found {value}"
        ))),
        Some(NumericField::Text(raw)) => raw.trim().parse::<i32>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("expected a year, found '{}'", raw.trim()))
        }),
    }
}

/// Sign-up payload for GCC and STARTUP accounts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub parent_company: Option<String>,
    #[serde(default, deserialize_with = "optional_year")]
    pub year_established: Option<i32>,
    pub industry: Option<String>,
    pub gst_number: Option<String>,
    pub additional_email: Option<String>,
    pub mobile_primary: Option<String>,
    pub mobile_secondary: Option<String>,
}

/// Registration payload after every field-level rule has passed.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub description: String,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub parent_company: Option<String>,
    pub year_established: Option<i32>,
    pub industry: Option<String>,
    pub gst_number: Option<String>,
    pub additional_email: Option<String>,
    pub mobile_primary: Option<String>,
    pub mobile_secondary: Option<String>,
}

impl RegistrationRequest {
    pub fn validate(self) -> Result<ValidRegistration, PortalError> {
        let name = non_blank(self.name);
        let email = non_blank(self.email);
        let role = non_blank(self.role);
        let password = self.password.filter(|password| !password.is_empty());

        let (Some(name), Some(email), Some(password), Some(role)) = (name, email, password, role)
        else {
            return Err(PortalError::validation(
                "Name, email, password and role are required",
            ));
        };

        let Some(description) = non_blank(self.description) else {
            return Err(PortalError::validation("Short description is required"));
        };

        let role = Role::parse(&role)
            .filter(|role| role.is_registrant())
            .ok_or_else(|| PortalError::validation("Role must be GCC or STARTUP"))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mobile_primary = phone_field(self.mobile_primary, PHONE_MESSAGE)?;
        let mobile_secondary = phone_field(self.mobile_secondary, PHONE_MESSAGE)?;

        Ok(ValidRegistration {
            name,
            email: normalize_email(&email),
            password,
            role,
            description,
            company_name: non_blank(self.company_name),
            website: non_blank(self.company_website),
            parent_company: non_blank(self.parent_company),
            year_established: self.year_established,
            industry: non_blank(self.industry),
            gst_number: non_blank(self.gst_number),
            additional_email: non_blank(self.additional_email),
            mobile_primary,
            mobile_secondary,
        })
    }
}

/// Credentials presented at login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), PortalError> {
        match (non_blank(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((normalize_email(&email), password)),
            _ => Err(PortalError::validation("Email and password are required")),
        }
    }
}

pub(crate) fn phone_message() -> &'static str {
    PHONE_MESSAGE
}
