use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use gcc_connect::config::{AdminSeedConfig, AuthConfig};
use gcc_connect::error::AppError;
use gcc_connect::portal::{
    LoginOutcome, LoginRequest, MemoryStore, Portal, PortalError, PortalRepository, Principal,
    SeedOutcome,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Portal over the in-process store, signing tokens with the configured secret.
pub(crate) fn build_portal(auth: &AuthConfig) -> Arc<Portal<MemoryStore>> {
    Arc::new(Portal::from_config(Arc::new(MemoryStore::new()), auth))
}

pub(crate) fn seed_admin<R>(portal: &Portal<R>, seed: &AdminSeedConfig) -> Result<(), AppError>
where
    R: PortalRepository + 'static,
{
    match portal.accounts.seed_admin(seed)? {
        SeedOutcome::Created(id) => info!(%id, email = %seed.email, "seeded administrator account"),
        SeedOutcome::AlreadyPresent => info!(email = %seed.email, "administrator already present"),
    }
    Ok(())
}

pub(crate) fn demo_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "gcc-connect-demo-secret".to_string(),
        token_ttl: Duration::from_secs(60 * 60),
    }
}

/// Logs in and resolves the issued bearer token back into the caller's principal.
/// `None` when the credentials are valid but the account is not approved yet.
pub(crate) fn sign_in<R>(
    portal: &Portal<R>,
    email: &str,
    password: &str,
) -> Result<Option<Principal>, AppError>
where
    R: PortalRepository + 'static,
{
    let outcome = portal.accounts.login(LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    })?;
    match outcome {
        LoginOutcome::Granted { token, .. } => portal
            .identity()
            .resolve(Some(&format!("Bearer {token}")))
            .map(Some)
            .ok_or_else(|| {
                AppError::Portal(PortalError::Unauthorized(
                    "issued token failed verification".to_string(),
                ))
            }),
        LoginOutcome::Denied { .. } => Ok(None),
    }
}
