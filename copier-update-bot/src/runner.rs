//! Orchestrates a full downstream-update scan.

use crate::config::{BotConfig, ConfigError};
use crate::copier::{CopierCli, TemplateTool};
use crate::discovery::{discover_candidates, CandidateRepository};
use crate::pull_requests::publish_pr;
use crate::summary::{ProcessingResult, RunSummary};
use crate::templates::PrBodyRenderer;
use crate::update::{update_working_copy, UpdateOutcome};
use crate::vcs::{GitCli, Vcs};
use octocrab::Octocrab;
use tracing::{error, info, warn};

/// Errors that abort a whole run before any candidate is processed.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// GitHub API client initialization or discovery errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Candidate discovery failed.
    #[error(transparent)]
    Discovery(#[from] crate::discovery::DiscoveryError),
}

/// Coordinates discovery and per-candidate updates.
pub struct Runner {
    config: BotConfig,
    octocrab: Octocrab,
    renderer: PrBodyRenderer,
    dry_run: bool,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the configuration is invalid or the GitHub
    /// client cannot be built.
    pub fn new(config: BotConfig, dry_run: bool) -> Result<Self, RunnerError> {
        config.validate()?;
        let octocrab = Octocrab::builder()
            .personal_token(config.token().to_string())
            .build()?;
        Ok(Self {
            config,
            octocrab,
            renderer: PrBodyRenderer::new(),
            dry_run,
        })
    }

    /// Executes the full scan.
    ///
    /// Candidates are processed strictly one at a time. A failure on one
    /// candidate is logged and recorded; later candidates still run.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] only for failures before the per-candidate
    /// loop (client setup, discovery).
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.dry_run);

        let candidates = discover_candidates(&self.octocrab, &self.config).await?;
        summary.candidates_discovered = candidates.len();

        if candidates.is_empty() {
            warn!("No downstream repositories found");
            return Ok(summary);
        }

        let tool = CopierCli::new(&self.config.copier_program);
        let vcs = GitCli::new();

        for candidate in &candidates {
            let result = process_candidate(
                &self.octocrab,
                &tool,
                &vcs,
                candidate,
                &self.config,
                &self.renderer,
                self.dry_run,
            )
            .await;
            summary.record_result(&result);
        }

        Ok(summary)
    }
}

/// Processes one candidate end to end.
///
/// The permission gate runs before any clone or mutation. Every failure is
/// contained: the function always returns a [`ProcessingResult`] rather
/// than propagating, so one bad candidate cannot abort the scan.
pub async fn process_candidate<T, V>(
    octocrab: &Octocrab,
    tool: &T,
    vcs: &V,
    candidate: &CandidateRepository,
    config: &BotConfig,
    renderer: &PrBodyRenderer,
    dry_run: bool,
) -> ProcessingResult
where
    T: TemplateTool + Sync,
    V: Vcs + Sync,
{
    info!(repo = %candidate.full_name, "Processing candidate");

    if !candidate.can_push {
        info!(repo = %candidate.full_name, "No push access; skipping");
        return ProcessingResult::Skipped {
            repository: candidate.full_name.clone(),
            reason: "no push access".to_string(),
        };
    }

    if dry_run {
        info!(repo = %candidate.full_name, "[dry run] Would clone and apply template update");
        return ProcessingResult::Skipped {
            repository: candidate.full_name.clone(),
            reason: "dry run".to_string(),
        };
    }

    let outcome = match update_working_copy(tool, vcs, candidate, config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(repo = %candidate.full_name, error = %e, "Update attempt failed");
            return ProcessingResult::Failed {
                repository: candidate.full_name.clone(),
                error: e.to_string(),
            };
        }
    };

    let result = match outcome {
        UpdateOutcome::Unchanged => {
            return ProcessingResult::Unchanged {
                repository: candidate.full_name.clone(),
            };
        }
        UpdateOutcome::Updated(result) => result,
    };

    match publish_pr(octocrab, candidate, &result, renderer, &config.template_url).await {
        Ok(pr) => ProcessingResult::Updated {
            repository: candidate.full_name.clone(),
            version: result.version,
            pr,
        },
        Err(e) => {
            error!(repo = %candidate.full_name, error = %e, "Failed to publish pull request");
            ProcessingResult::Failed {
                repository: candidate.full_name.clone(),
                error: e.to_string(),
            }
        }
    }
}
