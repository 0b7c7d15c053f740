//! Per-candidate flow tests against stub collaborators.
//!
//! No network, no real git, no real copier: the stubs either answer from
//! canned state or panic to prove a step was never reached.

use async_trait::async_trait;
use copier_update_bot::{
    process_candidate, BotConfig, CandidateRepository, CopierError, DiffState, PrBodyRenderer,
    ProcessingResult, TemplateTool, Vcs, VcsError,
};
use std::path::Path;

/// Template tool returning a canned log, or panicking if it must not run.
struct StubTool {
    log: Option<String>,
}

impl StubTool {
    fn with_log(log: &str) -> Self {
        Self {
            log: Some(log.to_string()),
        }
    }

    fn untouchable() -> Self {
        Self { log: None }
    }
}

#[async_trait]
impl TemplateTool for StubTool {
    async fn force_update(&self, _workdir: &Path) -> Result<String, CopierError> {
        match &self.log {
            Some(log) => Ok(log.clone()),
            None => panic!("template tool must not be invoked"),
        }
    }

    async fn generate(
        &self,
        _src: &Path,
        _dest: &Path,
        _answers: &[String],
    ) -> Result<(), CopierError> {
        panic!("generate must not be invoked by the update flow");
    }
}

/// Version-control stub with fixed query answers; mutations panic unless
/// explicitly allowed.
struct StubVcs {
    reachable: bool,
    status: String,
    unstaged: DiffState,
    staged: DiffState,
}

impl StubVcs {
    fn all_clean() -> Self {
        Self {
            reachable: true,
            status: String::new(),
            unstaged: DiffState::Clean,
            staged: DiffState::Clean,
        }
    }

    fn untouchable() -> Self {
        Self {
            reachable: false,
            status: String::new(),
            unstaged: DiffState::Clean,
            staged: DiffState::Clean,
        }
    }

    fn assert_reachable(&self) {
        assert!(self.reachable, "version control must not be touched");
    }
}

#[async_trait]
impl Vcs for StubVcs {
    async fn clone_repo(&self, _url: &str, _dest: &Path) -> Result<(), VcsError> {
        self.assert_reachable();
        Ok(())
    }

    async fn init(&self, _dest: &Path) -> Result<(), VcsError> {
        self.assert_reachable();
        Ok(())
    }

    async fn checkout_new_branch(&self, _: &Path, _: &str) -> Result<(), VcsError> {
        panic!("a clean working copy must never create a branch");
    }

    async fn stage_all(&self, _: &Path) -> Result<(), VcsError> {
        panic!("a clean working copy must never stage changes");
    }

    async fn commit(&self, _: &Path, _: &str, _: &str, _: &str) -> Result<(), VcsError> {
        panic!("a clean working copy must never commit");
    }

    async fn push_force(&self, _: &Path, _: &str) -> Result<(), VcsError> {
        panic!("a clean working copy must never push");
    }

    async fn status_porcelain(&self, _: &Path) -> Result<String, VcsError> {
        self.assert_reachable();
        Ok(self.status.clone())
    }

    async fn diff_head(&self, _: &Path, staged: bool) -> Result<DiffState, VcsError> {
        self.assert_reachable();
        Ok(if staged { self.staged } else { self.unstaged })
    }
}

fn candidate(can_push: bool) -> CandidateRepository {
    CandidateRepository {
        owner: "user".to_string(),
        name: "project".to_string(),
        full_name: "user/project".to_string(),
        clone_url: "https://github.com/user/project.git".to_string(),
        can_push,
        default_branch: "main".to_string(),
    }
}

fn octocrab() -> octocrab::Octocrab {
    // Never contacted in these tests; a bare client is enough.
    octocrab::Octocrab::builder().build().unwrap()
}

#[tokio::test]
async fn permission_gate_runs_before_any_mutation() {
    let tool = StubTool::untouchable();
    let vcs = StubVcs::untouchable();
    let config = BotConfig::new("token".to_string());
    let renderer = PrBodyRenderer::new();

    let result = process_candidate(
        &octocrab(),
        &tool,
        &vcs,
        &candidate(false),
        &config,
        &renderer,
        false,
    )
    .await;

    match result {
        ProcessingResult::Skipped { reason, .. } => assert_eq!(reason, "no push access"),
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[tokio::test]
async fn dry_run_never_touches_the_working_copy() {
    let tool = StubTool::untouchable();
    let vcs = StubVcs::untouchable();
    let config = BotConfig::new("token".to_string());
    let renderer = PrBodyRenderer::new();

    let result = process_candidate(
        &octocrab(),
        &tool,
        &vcs,
        &candidate(true),
        &config,
        &renderer,
        true,
    )
    .await;

    match result {
        ProcessingResult::Skipped { reason, .. } => assert_eq!(reason, "dry run"),
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[tokio::test]
async fn clean_update_reports_unchanged_without_branching() {
    let tool = StubTool::with_log("Updating to template version 3.2.1");
    let vcs = StubVcs::all_clean();
    let config = BotConfig::new("token".to_string());
    let renderer = PrBodyRenderer::new();

    let result = process_candidate(
        &octocrab(),
        &tool,
        &vcs,
        &candidate(true),
        &config,
        &renderer,
        false,
    )
    .await;

    assert!(matches!(result, ProcessingResult::Unchanged { .. }));
}

#[tokio::test]
async fn unparseable_log_fails_only_this_candidate() {
    let tool = StubTool::with_log("copier said nothing useful");
    let vcs = StubVcs::all_clean();
    let config = BotConfig::new("token".to_string());
    let renderer = PrBodyRenderer::new();

    let failed = process_candidate(
        &octocrab(),
        &tool,
        &vcs,
        &candidate(true),
        &config,
        &renderer,
        false,
    )
    .await;

    assert!(matches!(failed, ProcessingResult::Failed { .. }));

    // The flow is contained: the same collaborators still serve the next
    // candidate normally.
    let good_tool = StubTool::with_log("Updating to template version 3.2.1");
    let next = process_candidate(
        &octocrab(),
        &good_tool,
        &vcs,
        &candidate(true),
        &config,
        &renderer,
        false,
    )
    .await;

    assert!(matches!(next, ProcessingResult::Unchanged { .. }));
}
