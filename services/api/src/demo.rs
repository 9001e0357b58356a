use crate::infra::{build_portal, demo_auth_config, seed_admin, sign_in};
use chrono::Utc;
use clap::Args;

use gcc_connect::config::AdminSeedConfig;
use gcc_connect::error::AppError;
use gcc_connect::portal::service::PublicRequirementQuery;
use gcc_connect::portal::{
    AccountDecision, InterestDecision, InterestSubmission, MemoryStore, ModerationAction, Portal,
    PortalError, Principal, RegistrationRequest, RequirementDraft, RequirementPatch, UserId,
};

const DEMO_PASSWORD: &str = "demo-pass-123";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Search term used for the public requirement listing.
    #[arg(long, default_value = "claims")]
    pub(crate) search: String,
    /// Approve the requirement immediately instead of sending it back first.
    #[arg(long)]
    pub(crate) skip_send_back: bool,
    /// Print the final admin dashboard as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

fn demo_admin() -> AdminSeedConfig {
    AdminSeedConfig {
        email: "admin@gccstartup.local".to_string(),
        password: "Admin123!".to_string(),
        name: "Portal Admin".to_string(),
    }
}

fn register(
    portal: &Portal<MemoryStore>,
    role: &str,
    email: &str,
    name: &str,
    description: &str,
) -> Result<UserId, AppError> {
    let receipt = portal.accounts.register(RegistrationRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(DEMO_PASSWORD.to_string()),
        role: Some(role.to_string()),
        description: Some(description.to_string()),
        company_name: Some(name.to_string()),
        industry: Some("Financial Services".to_string()),
        ..RegistrationRequest::default()
    })?;
    println!(
        "- Registered {} {} -> {}",
        receipt.user.role.label(),
        receipt.user.email,
        receipt.user.approval_status.label()
    );
    Ok(receipt.user.id)
}

fn approved_principal(portal: &Portal<MemoryStore>, email: &str) -> Result<Principal, AppError> {
    sign_in(portal, email, DEMO_PASSWORD)?.ok_or_else(|| {
        AppError::Portal(PortalError::Forbidden(format!("{email} is still pending approval")))
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        search,
        skip_send_back,
        json,
    } = args;

    println!("GCC Connect marketplace demo ({})", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    let portal = build_portal(&demo_auth_config());
    seed_admin(&portal, &demo_admin())?;

    println!("\nAccount approval");
    let gcc_id = register(
        &portal,
        "GCC",
        "ops@northbank.example",
        "Northbank GCC",
        "Global capability centre for retail banking operations",
    )?;
    let startup_id = register(
        &portal,
        "STARTUP",
        "founders@scanwise.example",
        "Scanwise",
        "Document intelligence for insurance claims",
    )?;
    if sign_in(&portal, "founders@scanwise.example", DEMO_PASSWORD)?.is_none() {
        println!("  Login before approval -> PENDING_APPROVAL, no token issued");
    }
    for id in [gcc_id, startup_id] {
        let user = portal.accounts.decide(id, AccountDecision::Approve)?;
        println!("  Admin approved {} -> {}", user.email, user.approval_status.label());
    }

    let gcc = approved_principal(&portal, "ops@northbank.example")?;
    let startup = approved_principal(&portal, "founders@scanwise.example")?;

    println!("\nRequirement moderation");
    let requirement = portal.requirements.create(
        &gcc,
        RequirementDraft {
            title: Some("Claims intake automation".to_string()),
            description: Some("Extract structured data from scanned claims forms".to_string()),
            category: Some("AI/ML".to_string()),
            budget_min: Some(20_000.0),
            budget_max: Some(45_000.0),
            tech_stack: Some(vec!["OCR".to_string(), "Python".to_string()]),
            ..RequirementDraft::default()
        },
    )?;
    println!(
        "- Posted {} as {} ({})",
        requirement.title,
        requirement.anonymized_id,
        requirement.approval_status.label()
    );

    if !skip_send_back {
        let sent_back = portal.requirements.moderate(
            requirement.id,
            ModerationAction::send_back(Some("Please add expected timelines".to_string())),
        )?;
        println!(
            "  Admin sent back: {}",
            sent_back.admin_remarks.as_deref().unwrap_or("-")
        );
        let resubmitted = portal.requirements.update_owned(
            &gcc,
            requirement.id,
            RequirementPatch {
                description: Some(
                    "Extract structured data from scanned claims forms within one quarter"
                        .to_string(),
                ),
                resubmit: true,
                ..RequirementPatch::default()
            },
        )?;
        println!("  Owner resubmitted -> {}", resubmitted.approval_status.label());
    }
    let approved = portal
        .requirements
        .moderate(requirement.id, ModerationAction::Approve)?;
    println!("  Admin approved -> {}", approved.approval_status.label());

    println!("\nDiscovery (search \"{search}\")");
    let listing = portal.requirements.list_public(PublicRequirementQuery {
        category: None,
        search: Some(search),
    })?;
    if listing.is_empty() {
        println!("  No open requirements matched");
    }
    for row in &listing {
        println!(
            "  - {} [{}] {} interest(s)",
            row.anonymized_id, row.category, row.interest_count
        );
    }

    println!("\nExpression of interest");
    let interest = portal.interests.submit(
        &startup,
        requirement.id,
        InterestSubmission {
            message: Some("We process 2M claims pages a month for insurers".to_string()),
            proposed_budget: Some(38_000.0),
            ..InterestSubmission::default()
        },
    )?;
    println!("- Startup applied -> {}", interest.status.label());
    let accepted = portal
        .interests
        .respond(&gcc, interest.id, InterestDecision::Accept)?;
    println!("  GCC responded -> {}", accepted.status.label());
    for deal in portal.requirements.active_deals(&gcc)? {
        println!(
            "  Active deal: {} ({} accepted)",
            deal.title, deal.accepted_count
        );
    }

    let stats = portal.admin.stats()?;
    println!("\nAdmin dashboard");
    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("  Dashboard payload unavailable: {err}"),
        }
    } else {
        println!(
            "- {} users | {} pending approvals | {} requirements awaiting moderation",
            stats.total_users, stats.pending_approvals, stats.pending_requirement_approvals
        );
        println!(
            "- {} open requirements | {} pending interests",
            stats.open_requirements, stats.pending_interests
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_walkthrough_completes() {
        run_demo(DemoArgs {
            search: "claims".to_string(),
            skip_send_back: false,
            json: true,
        })
        .expect("demo runs");
    }
}
