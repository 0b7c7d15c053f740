//! Publishing update branches as pull requests.

use crate::discovery::CandidateRepository;
use crate::rate_limit::{ensure_rate_limit, Resource};
use crate::templates::{pr_title, PrBodyRenderer, TemplateError};
use crate::update::UpdateResult;
use octocrab::params::State;
use octocrab::Octocrab;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

/// Errors that can occur while publishing a pull request.
#[derive(Debug, Error)]
pub enum PrError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// PR body rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Status of one proposal.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrStatus {
    /// A new pull request was opened.
    Created {
        /// GitHub PR number.
        number: u64,
        /// GitHub PR URL.
        url: String,
    },

    /// An open pull request already targets this branch; nothing was opened.
    Skipped {
        /// Number of the existing pull request.
        existing: u64,
    },
}

/// What to do about a proposal given any existing open pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrAction {
    /// Open a new pull request.
    Create,
    /// An open PR already exists for this branch; do not open a duplicate.
    Skip { existing: u64 },
}

/// Decides whether a proposal needs a new pull request.
///
/// A duplicate is a deliberate skip, never an error: the force-pushed branch
/// already updated the existing PR's contents.
#[must_use]
pub fn decide_pr_action(existing: Option<u64>) -> PrAction {
    match existing {
        Some(number) => PrAction::Skip { existing: number },
        None => PrAction::Create,
    }
}

/// Finds an open pull request whose head is the given branch.
///
/// # Errors
///
/// Returns [`PrError`] if the pull request listing fails.
pub async fn find_existing_pr(
    octocrab: &Octocrab,
    candidate: &CandidateRepository,
    branch: &str,
) -> Result<Option<u64>, PrError> {
    let head = format!("{}:{}", candidate.owner, branch);
    debug!(head = %head, "Checking for existing pull request");

    let page = octocrab
        .pulls(&candidate.owner, &candidate.name)
        .list()
        .state(State::Open)
        .head(head)
        .per_page(1)
        .send()
        .await?;

    Ok(page.items.first().map(|pr| pr.number))
}

/// Publishes a pushed update as a pull request against the default branch.
///
/// Skips creation when an open pull request already targets the branch.
///
/// # Errors
///
/// Returns [`PrError`] if the duplicate check, body rendering, or PR
/// creation fails.
pub async fn publish_pr(
    octocrab: &Octocrab,
    candidate: &CandidateRepository,
    result: &UpdateResult,
    renderer: &PrBodyRenderer,
    template_url: &str,
) -> Result<PrStatus, PrError> {
    let span = info_span!(
        "publish_pr",
        repo = %candidate.full_name,
        branch = %result.branch
    );

    async {
        let existing = find_existing_pr(octocrab, candidate, &result.branch).await?;

        if let PrAction::Skip { existing } = decide_pr_action(existing) {
            info!(existing, "PR already exists; skipping");
            return Ok(PrStatus::Skipped { existing });
        }

        let title = pr_title(&result.version);
        let body = renderer.render(template_url, &result.version, &result.branch, &result.log)?;

        ensure_rate_limit(octocrab, Resource::Core).await?;

        let pr = octocrab
            .pulls(&candidate.owner, &candidate.name)
            .create(&title, &result.branch, &candidate.default_branch)
            .body(&body)
            .send()
            .await?;

        let url = pr
            .html_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| {
                format!("https://github.com/{}/pull/{}", candidate.full_name, pr.number)
            });

        info!(pr_number = pr.number, "PR created");

        Ok(PrStatus::Created {
            number: pr.number,
            url,
        })
    }
    .instrument(span)
    .await
}
