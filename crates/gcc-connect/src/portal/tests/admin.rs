use super::common::*;
use serde_json::json;

use crate::portal::domain::{AccountDecision, Role, UserId};
use crate::portal::error::PortalError;
use crate::portal::interest::InterestDecision;
use crate::portal::profile::Profile;
use crate::portal::repository::PortalRepository;
use crate::portal::requirement::{RequirementPatch, RequirementStatus};
use crate::portal::service::{activity_limit, AdminUserUpdate};

#[test]
fn stats_count_each_queue() {
    let (portal, store) = build_portal();
    admin(&store, &portal);
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    register(&portal, "STARTUP", "late@startup.io", "Late Co");

    let live = approved_requirement(&portal, &gcc, "Claims OCR", "Scan claims");
    portal
        .requirements
        .create(&gcc, draft("Queued", "Awaiting review", "Data"))
        .expect("created");
    portal
        .interests
        .submit(&startup, live.id, pitch("We scan"))
        .expect("submitted");

    let stats = portal.admin.stats().expect("stats");
    assert_eq!(stats.total_users, 3, "administrators are not counted");
    assert_eq!(stats.pending_approvals, 1);
    assert_eq!(stats.pending_requirement_approvals, 1);
    assert_eq!(stats.open_requirements, 1, "only OPEN and APPROVED");
    assert_eq!(stats.pending_interests, 1);
}

#[test]
fn user_listing_excludes_admins_and_honours_role_filter() {
    let (portal, store) = build_portal();
    admin(&store, &portal);
    let gcc = register(&portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = register(&portal, "STARTUP", "cto@robo.io", "Robo Labs");

    let everyone = portal.admin.users(None).expect("users");
    assert_eq!(everyone.len(), 2);
    assert_eq!(everyone[0].id, startup, "newest first");
    assert!(everyone.iter().all(|user| user.role != Role::Admin));

    let gccs = portal.admin.users(Some("GCC")).expect("users");
    assert_eq!(gccs.len(), 1);
    assert_eq!(gccs[0].id, gcc);

    let ignored = portal.admin.users(Some("ADMIN")).expect("users");
    assert_eq!(ignored.len(), 2, "only registrant roles filter");
}

#[test]
fn admin_edits_account_and_profile() {
    let (portal, store) = build_portal();
    let gcc = register(&portal, "GCC", "ops@bank.com", "Bank Ops");
    register(&portal, "STARTUP", "cto@robo.io", "Robo Labs");

    let updated = portal
        .admin
        .update_user(
            gcc,
            AdminUserUpdate {
                name: Some("Bank Operations".to_string()),
                email: Some(" OPS@Bank.co ".to_string()),
                profile: Some(json!({ "location": "Pune", "company_name": "  " })),
            },
        )
        .expect("updated");
    assert_eq!(updated.name, "Bank Operations");
    assert_eq!(updated.email, "ops@bank.co");

    let detail = portal.admin.user_detail(gcc).expect("detail");
    let Some(Profile::Gcc(profile)) = detail.profile else {
        panic!("expected a GCC profile");
    };
    assert_eq!(profile.location.as_deref(), Some("Pune"));
    assert_eq!(profile.company_name.as_deref(), Some("Bank Ops Pvt Ltd"));

    match portal.admin.update_user(
        gcc,
        AdminUserUpdate {
            email: Some("CTO@robo.io".to_string()),
            ..AdminUserUpdate::default()
        },
    ) {
        Err(PortalError::Conflict(message)) => assert_eq!(message, "Email already in use"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let bad_phone = portal.admin.update_user(
        gcc,
        AdminUserUpdate {
            profile: Some(json!({ "alternate_contact_phone": "n/a" })),
            ..AdminUserUpdate::default()
        },
    );
    assert!(matches!(bad_phone, Err(PortalError::Validation(_))));
    assert_eq!(stored_user(&store, gcc).email, "ops@bank.co");
}

#[test]
fn profile_edits_without_a_profile_are_not_found() {
    let (portal, store) = build_portal();
    let gcc = register(&portal, "GCC", "ops@bank.com", "Bank Ops");
    let mut bare = stored_user(&store, gcc);
    bare.id = UserId::generate();
    bare.email = "bare@bank.com".to_string();
    let bare = store.insert_account(bare, None).expect("inserted").id;

    match portal.admin.update_user(
        bare,
        AdminUserUpdate {
            name: Some("Renamed".to_string()),
            profile: Some(json!({ "location": "Pune" })),
            ..AdminUserUpdate::default()
        },
    ) {
        Err(PortalError::NotFound(message)) => assert_eq!(message, "Profile not found"),
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(stored_user(&store, bare).name, "Bank Ops", "account left untouched");

    let renamed = portal
        .admin
        .update_user(
            bare,
            AdminUserUpdate {
                name: Some("Renamed".to_string()),
                ..AdminUserUpdate::default()
            },
        )
        .expect("account-only edits need no profile");
    assert_eq!(renamed.name, "Renamed");
}

#[test]
fn admins_cannot_be_deleted_but_registrants_cascade() {
    let (portal, store) = build_portal();
    let admin = admin(&store, &portal);
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    let requirement = approved_requirement(&portal, &gcc, "Claims OCR", "Scan claims");
    portal
        .interests
        .submit(&startup, requirement.id, pitch("We scan"))
        .expect("submitted");

    match portal.admin.delete_user(admin.id) {
        Err(PortalError::NotFound(message)) => {
            assert_eq!(message, "User not found or cannot delete admin")
        }
        other => panic!("expected not found, got {other:?}"),
    }

    portal.admin.delete_user(gcc.id).expect("deleted");
    assert!(store.fetch_user(gcc.id).expect("store reachable").is_none());
    assert!(store.fetch_profile(gcc.id).expect("store reachable").is_none());
    assert!(store
        .fetch_requirement(requirement.id)
        .expect("store reachable")
        .is_none());
    assert!(portal.interests.mine(&startup).expect("mine").is_empty());
}

#[test]
fn deleting_a_startup_withdraws_its_interests() {
    let (portal, store) = build_portal();
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");
    let leaving = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    let staying = approved(&store, &portal, "STARTUP", "ceo@scan.ai", "Scan AI");
    let requirement = approved_requirement(&portal, &gcc, "Claims OCR", "Scan claims");
    for startup in [&leaving, &staying] {
        portal
            .interests
            .submit(startup, requirement.id, pitch("We scan"))
            .expect("submitted");
    }

    portal.admin.delete_user(leaving.id).expect("deleted");

    assert!(store.fetch_user(leaving.id).expect("store reachable").is_none());
    assert!(store.fetch_profile(leaving.id).expect("store reachable").is_none());
    let received = portal.interests.received(&gcc).expect("received");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].startup_email.as_deref(), Some("ceo@scan.ai"));

    let detail = portal
        .requirements
        .get_owned(&gcc, requirement.id)
        .expect("owned detail");
    assert_eq!(detail.applications.len(), 1);
    assert_eq!(detail.applications[0].interest.startup_id, staying.id);
    assert!(store
        .fetch_requirement(requirement.id)
        .expect("store reachable")
        .is_some());
}

#[test]
fn reverification_is_startup_only() {
    let (portal, store) = build_portal();
    let gcc = register(&portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = register(&portal, "STARTUP", "cto@robo.io", "Robo Labs");

    match portal.admin.request_reverification(gcc) {
        Err(PortalError::Validation(message)) => {
            assert_eq!(message, "Only startups can be sent for reverification")
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let message = portal
        .admin
        .request_reverification(startup)
        .expect("requested");
    assert!(message.starts_with("Reverification requested"));
    let profile = store
        .fetch_profile(startup)
        .expect("store reachable")
        .expect("profile");
    assert!(profile.as_startup().expect("startup").reverification_required);

    assert!(matches!(
        portal.admin.request_reverification(UserId::generate()),
        Err(PortalError::NotFound(_))
    ));
}

#[test]
fn activity_feed_respects_limit() {
    let (portal, store) = build_portal();
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    let mut latest = None;
    for index in 0..3 {
        let requirement =
            approved_requirement(&portal, &gcc, &format!("Need {index}"), "Details");
        portal
            .interests
            .submit(&startup, requirement.id, pitch("Count me in"))
            .expect("submitted");
        latest = Some(requirement);
    }

    let feed = portal
        .admin
        .activities(activity_limit(Some("2")))
        .expect("feed");
    assert_eq!(feed.requirements.len(), 2);
    assert_eq!(feed.expressions_of_interest.len(), 2);
    assert_eq!(
        feed.requirements[0].id,
        latest.expect("created").id,
        "newest first"
    );
    assert_eq!(feed.requirements[0].gcc_email.as_deref(), Some("ops@bank.com"));
    assert_eq!(
        feed.expressions_of_interest[0].startup_email.as_deref(),
        Some("cto@robo.io")
    );
}

#[test]
fn active_projects_cover_open_and_in_progress() {
    let (portal, store) = build_portal();
    let gcc = approved(&store, &portal, "GCC", "ops@bank.com", "Bank Ops");
    let startup = approved(&store, &portal, "STARTUP", "cto@robo.io", "Robo Labs");
    let open = approved_requirement(&portal, &gcc, "Open need", "Details");
    let running = approved_requirement(&portal, &gcc, "Running need", "Details");
    let closed = approved_requirement(&portal, &gcc, "Closed need", "Details");
    let interest = portal
        .interests
        .submit(&startup, running.id, pitch("On it"))
        .expect("submitted");
    portal
        .interests
        .respond(&gcc, interest.id, InterestDecision::Accept)
        .expect("accepted");

    for (id, status) in [
        (running.id, RequirementStatus::InProgress),
        (closed.id, RequirementStatus::Closed),
    ] {
        portal
            .requirements
            .update_owned(
                &gcc,
                id,
                RequirementPatch {
                    status: Some(status),
                    ..RequirementPatch::default()
                },
            )
            .expect("status changed");
    }

    let projects = portal.admin.active_projects().expect("projects");
    let ids: Vec<_> = projects.iter().map(|project| project.id).collect();
    assert_eq!(ids, vec![running.id, open.id]);
    assert_eq!(projects[0].interest_count, 1);
    assert_eq!(projects[0].gcc_name.as_deref(), Some("Bank Ops"));
}

#[test]
fn pending_queue_is_oldest_first() {
    let (portal, _) = build_portal();
    let first = register(&portal, "GCC", "first@corp.com", "First");
    let second = register(&portal, "STARTUP", "second@startup.io", "Second");
    let decided = register(&portal, "STARTUP", "third@startup.io", "Third");
    portal
        .accounts
        .decide(decided, AccountDecision::Approve)
        .expect("approved");

    let queue = portal.accounts.pending_accounts().expect("queue");
    let ids: Vec<_> = queue.iter().map(|user| user.id).collect();
    assert_eq!(ids, vec![first, second]);
}
