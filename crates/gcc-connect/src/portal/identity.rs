//! Credential hashing, bearer token issuance, and per-request identity resolution.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::domain::{ApprovalStatus, Principal, Role, UserId};

/// Error raised while hashing passwords or signing/verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// One-way password digests.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;
    /// A malformed digest verifies as `false`.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id PHC-string hasher.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Option<Params>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit cost parameters (memory KiB, iterations, lanes).
    pub fn with_params(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, CredentialError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(Self {
            params: Some(params),
        })
    }

    fn engine(&self) -> Argon2<'static> {
        match &self.params {
            Some(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            None => Argon2::default(),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        let digest = self
            .engine()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(digest.to_string())
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .engine()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(err) => {
                debug!(error = %err, "stored credential digest is malformed");
                false
            }
        }
    }
}

/// Signed bearer credential carrying a [`Principal`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Signs and verifies bearer credentials.
pub trait ClaimsService: Send + Sync {
    fn issue(&self, principal: &Principal, ttl: Duration) -> Result<IssuedToken, CredentialError>;
    fn verify(&self, token: &str) -> Result<Principal, CredentialError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    email: String,
    name: String,
    role: Role,
    approval_status: ApprovalStatus,
    iat: i64,
    exp: i64,
}

/// HS256 JWTs with strict expiry.
#[derive(Clone)]
pub struct JwtClaimsService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtClaimsService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub(crate) fn issue_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, CredentialError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2);
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
            approval_status: principal.approval_status,
            iat,
            exp: iat.saturating_add(ttl_secs),
        };
        let token = jsonwebtoken::encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding,
        )?;
        Ok(IssuedToken {
            token,
            expires_in: ttl.as_secs(),
        })
    }
}

impl ClaimsService for JwtClaimsService {
    fn issue(&self, principal: &Principal, ttl: Duration) -> Result<IssuedToken, CredentialError> {
        self.issue_at(principal, ttl, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<Principal, CredentialError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;
        Ok(Principal {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            approval_status: claims.approval_status,
        })
    }
}

/// Turns an `Authorization` header into a [`Principal`], or nothing.
///
/// Absent, malformed, tampered and expired credentials all resolve to `None`;
/// the access guards decide what that means for the route.
#[derive(Clone)]
pub struct IdentityResolver {
    claims: Arc<dyn ClaimsService>,
}

impl IdentityResolver {
    pub fn new(claims: Arc<dyn ClaimsService>) -> Self {
        Self { claims }
    }

    pub fn resolve(&self, authorization: Option<&str>) -> Option<Principal> {
        let token = authorization?.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        match self.claims.verify(token) {
            Ok(principal) => Some(principal),
            Err(err) => {
                debug!(error = %err, "ignoring unverifiable bearer credential");
                None
            }
        }
    }
}
