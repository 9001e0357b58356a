use super::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

use crate::portal::domain::{AccountDecision, ApprovalStatus, Role};
use crate::portal::error::PortalError;
use crate::portal::identity::{ClaimsService, JwtClaimsService};
use crate::portal::profile::{Profile, StartupProfilePatch};
use crate::portal::repository::PortalRepository;
use crate::portal::service::{LoginOutcome, SeedOutcome};
use crate::portal::validation::{LoginRequest, RegistrationRequest};

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

#[test]
fn registration_creates_pending_account_with_profile() {
    let (portal, store) = build_portal();

    let receipt = portal
        .accounts
        .register(registration("STARTUP", "  Founder@Robo.IO ", "Robo Labs"))
        .expect("registration accepted");

    assert_eq!(receipt.user.email, "founder@robo.io");
    assert_eq!(receipt.user.approval_status, ApprovalStatus::Pending);
    assert!(receipt.message.contains("pending admin approval"));

    let profile = store
        .fetch_profile(receipt.user.id)
        .expect("store reachable")
        .expect("profile seeded");
    let startup = profile.as_startup().expect("startup profile");
    assert_eq!(
        startup.solution_description.as_deref(),
        Some("Robo Labs builds enterprise software")
    );
    assert_eq!(startup.company_name.as_deref(), Some("Robo Labs Pvt Ltd"));
    assert!(!startup.reverification_required);
}

#[test]
fn registration_rejects_duplicates_ignoring_case() {
    let (portal, _) = build_portal();
    register(&portal, "GCC", "ops@bank.com", "Bank Ops");

    match portal
        .accounts
        .register(registration("STARTUP", "OPS@Bank.com", "Imposter"))
    {
        Err(PortalError::Conflict(message)) => assert_eq!(message, "Email already registered"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn registration_validates_fields_in_order() {
    let (portal, _) = build_portal();

    let missing = RegistrationRequest {
        email: Some("a@b.c".to_string()),
        ..RegistrationRequest::default()
    };
    let admin = RegistrationRequest {
        role: Some("ADMIN".to_string()),
        ..registration("GCC", "sneaky@corp.com", "Sneaky")
    };
    let short = RegistrationRequest {
        password: Some("12345".to_string()),
        ..registration("GCC", "short@corp.com", "Short")
    };

    for (request, expected) in [
        (missing, "Name, email, password and role are required"),
        (admin, "Role must be GCC or STARTUP"),
        (short, "Password must be at least 6 characters"),
    ] {
        match portal.accounts.register(request) {
            Err(PortalError::Validation(message)) => assert_eq!(message, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}

#[test]
fn pending_and_rejected_accounts_cannot_obtain_tokens() {
    let (portal, _) = build_portal();
    let pending = register(&portal, "GCC", "pending@corp.com", "Pending Co");
    let rejected = register(&portal, "STARTUP", "rejected@startup.io", "Rejected Co");
    portal
        .accounts
        .decide(rejected, AccountDecision::Reject)
        .expect("rejection recorded");

    for (email, id) in [
        ("pending@corp.com", pending),
        ("rejected@startup.io", rejected),
    ] {
        match portal.accounts.login(login(email, PASSWORD)).expect("login answers") {
            LoginOutcome::Denied { code, user, .. } => {
                assert_eq!(code, "PENDING_APPROVAL");
                assert_eq!(user.id, id);
            }
            LoginOutcome::Granted { .. } => panic!("unapproved account received a token"),
        }
    }
}

#[test]
fn login_hides_which_credential_was_wrong() {
    let (portal, _) = build_portal();
    register(&portal, "GCC", "ops@bank.com", "Bank Ops");

    for request in [login("ops@bank.com", "wrong-pass"), login("ghost@bank.com", PASSWORD)] {
        match portal.accounts.login(request) {
            Err(PortalError::Unauthorized(message)) => {
                assert_eq!(message, "Invalid email or password")
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    assert!(matches!(
        portal.accounts.login(LoginRequest::default()),
        Err(PortalError::Validation(_))
    ));
}

#[test]
fn approved_login_issues_verifiable_claims() {
    let (portal, store) = build_portal();
    let principal = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");

    let token = login_token(&portal, "CTO@robo.io", PASSWORD);
    let verified = JwtClaimsService::new(SECRET)
        .verify(&token)
        .expect("token verifies");

    assert_eq!(verified, principal);
    assert_eq!(verified.approval_status, ApprovalStatus::Approved);
}

#[test]
fn decisions_only_apply_to_pending_accounts() {
    let (portal, _) = build_portal();
    let id = register(&portal, "GCC", "ops@bank.com", "Bank Ops");

    let approved = portal
        .accounts
        .decide(id, AccountDecision::Approve)
        .expect("first decision wins");
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);

    match portal.accounts.decide(id, AccountDecision::Reject) {
        Err(PortalError::NotFound(message)) => {
            assert_eq!(message, "User not found or already processed")
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn concurrent_approve_and_reject_has_one_winner() {
    for _ in 0..16 {
        let (portal, store) = build_portal();
        let id = register(&portal, "STARTUP", "race@startup.io", "Race Co");
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [AccountDecision::Approve, AccountDecision::Reject]
            .into_iter()
            .map(move |decision| {
                let portal = portal.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    portal.accounts.decide(id, decision)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect();
        let winners: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "exactly one decision may succeed");
        assert_eq!(
            stored_user(&store, id).approval_status,
            winners[0].approval_status
        );
    }
}

#[test]
fn seeding_the_admin_is_idempotent() {
    let (portal, store) = build_portal();

    let first = portal.accounts.seed_admin(&admin_seed()).expect("seeded");
    let SeedOutcome::Created(id) = first else {
        panic!("expected a new admin, got {first:?}");
    };
    assert_eq!(
        portal.accounts.seed_admin(&admin_seed()).expect("seed is re-runnable"),
        SeedOutcome::AlreadyPresent
    );

    let admin = stored_user(&store, id);
    assert_eq!(admin.role, Role::Admin);
    assert!(store.fetch_profile(id).expect("store reachable").is_none());
    let token = login_token(&portal, ADMIN_EMAIL, ADMIN_PASSWORD);
    assert!(!token.is_empty());
}

#[test]
fn current_user_reads_storage_not_the_token_snapshot() {
    let (portal, store) = build_portal();
    let id = register(&portal, "GCC", "ops@bank.com", "Bank Ops");
    let snapshot = stored_user(&store, id).principal();
    portal
        .accounts
        .decide(id, AccountDecision::Approve)
        .expect("approved");

    let fresh = portal.accounts.current_user(&snapshot).expect("user found");
    assert_eq!(snapshot.approval_status, ApprovalStatus::Pending);
    assert_eq!(fresh.approval_status, ApprovalStatus::Approved);
}

#[test]
fn own_profile_is_empty_for_admins() {
    let (portal, store) = build_portal();
    let admin = admin(&store, &portal);
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");

    assert!(portal.accounts.own_profile(&admin).expect("answers").is_none());
    assert!(matches!(
        portal.accounts.own_profile(&gcc).expect("answers"),
        Some(Profile::Gcc(_))
    ));
}

#[test]
fn saving_the_startup_profile_clears_reverification() {
    let (portal, store) = build_portal();
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    portal
        .admin
        .request_reverification(startup.id)
        .expect("reverification requested");
    assert!(portal
        .accounts
        .startup_profile(&startup)
        .expect("profile")
        .reverification_required);

    let updated = portal
        .accounts
        .update_startup_profile(
            &startup,
            StartupProfilePatch {
                team_size: Some("11-50".to_string()),
                location: Some("   ".to_string()),
                ..StartupProfilePatch::default()
            },
        )
        .expect("profile saved");

    assert!(!updated.reverification_required);
    assert_eq!(updated.team_size.as_deref(), Some("11-50"));
    assert!(updated.location.is_none(), "blank input keeps the stored value");
}

#[test]
fn invalid_contact_phone_is_rejected() {
    let (portal, store) = build_portal();
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");

    let result = portal.accounts.update_startup_profile(
        &startup,
        StartupProfilePatch {
            contact_phone: Some("call me maybe".to_string()),
            ..StartupProfilePatch::default()
        },
    );
    assert!(matches!(result, Err(PortalError::Validation(_))));
}

#[test]
fn storage_outages_surface_as_internal_errors() {
    let portal = portal_over(Arc::new(UnavailableStore));

    match portal.accounts.register(registration("GCC", "ops@bank.com", "Bank Ops")) {
        Err(PortalError::Internal(cause)) => assert!(cause.contains("database offline")),
        other => panic!("expected internal error, got {other:?}"),
    }
}
