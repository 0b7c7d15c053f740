#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod copier;
pub mod copyright;
pub mod discovery;
pub mod pull_requests;
pub mod rate_limit;
pub mod runner;
pub mod sessions;
pub mod summary;
pub mod templates;
pub mod update;
pub mod vcs;

pub use config::{token_from_env, BotConfig, ConfigError};
pub use copier::{extract_template_version, CopierCli, CopierError, TemplateTool};
pub use copyright::copyright_range;
pub use discovery::{discover_candidates, CandidateRepository, DiscoveryError};
pub use pull_requests::{decide_pr_action, find_existing_pr, PrAction, PrError, PrStatus};
pub use rate_limit::{ensure_rate_limit, RateLimitInfo, Resource};
pub use runner::{process_candidate, Runner, RunnerError};
pub use sessions::{run_session, SessionError, SessionName};
pub use summary::{ProcessingResult, RunSummary};
pub use templates::{branch_name, pr_title, PrBodyRenderer, TemplateError};
pub use update::{update_working_copy, UpdateError, UpdateOutcome, UpdateResult};
pub use vcs::{is_dirty, DiffState, GitCli, Vcs, VcsError};
