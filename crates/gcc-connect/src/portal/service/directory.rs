use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::portal::domain::{ApprovalStatus, Role, UserId};
use crate::portal::error::PortalError;
use crate::portal::repository::PortalRepository;
use crate::portal::search::{rank, SearchTerm, Weight};
use crate::portal::validation::non_blank;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub industry: Option<String>,
}

/// Approved startup as listed to GCC accounts.
#[derive(Debug, Clone, Serialize)]
pub struct StartupListing {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub solution_description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub team_size: Option<String>,
    pub primary_offering_type: Option<String>,
}

fn contains_ignore_case(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|field| field.to_lowercase().contains(needle))
}

/// Startup directory for GCC buyers.
pub struct DirectoryService<R> {
    repository: Arc<R>,
}

impl<R> DirectoryService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Approved startups, ranked by company name, then solution, then contact
    /// name and industry when a search term is given; by name otherwise.
    pub fn startups(&self, query: DirectoryQuery) -> Result<Vec<StartupListing>, PortalError> {
        let industry = non_blank(query.industry).map(|industry| industry.to_lowercase());
        let term = SearchTerm::parse(query.search.as_deref());

        let approved = self.repository.select_users(&|user| {
            user.role == Role::Startup && user.approval_status == ApprovalStatus::Approved
        })?;

        let mut listings = Vec::with_capacity(approved.len());
        for user in approved {
            let Some(profile) = self
                .repository
                .fetch_profile(user.id)?
                .and_then(|profile| profile.as_startup().cloned())
            else {
                continue;
            };
            listings.push(StartupListing {
                id: user.id,
                name: user.name,
                email: user.email,
                company_name: profile.company_name,
                industry: profile.industry,
                solution_description: profile.solution_description,
                website: profile.website,
                location: profile.location,
                team_size: profile.team_size,
                primary_offering_type: profile.primary_offering_type,
            });
        }

        listings.retain(|listing| {
            let industry_ok = industry.as_deref().map_or(true, |industry| {
                contains_ignore_case(listing.industry.as_deref(), industry)
                    || contains_ignore_case(listing.primary_offering_type.as_deref(), industry)
            });
            let search_ok = term.as_ref().map_or(true, |term| {
                term.matches_any(&[
                    Some(listing.name.as_str()),
                    listing.company_name.as_deref(),
                    listing.solution_description.as_deref(),
                    listing.industry.as_deref(),
                ])
            });
            industry_ok && search_ok
        });

        Ok(rank(
            listings,
            term.as_ref(),
            |term, listing| {
                term.score(&[
                    (listing.company_name.as_deref(), Weight::A),
                    (listing.solution_description.as_deref(), Weight::B),
                    (Some(listing.name.as_str()), Weight::C),
                    (listing.industry.as_deref(), Weight::D),
                ])
            },
            |a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)),
        ))
    }
}
