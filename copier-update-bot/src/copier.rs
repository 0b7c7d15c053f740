//! Template-tool collaborator.
//!
//! Invokes the external `copier` program for in-place updates and fresh
//! generation, and parses its log output for the resolved template version.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Log-line prefix copier emits when applying an update.
const VERSION_LINE_PREFIX: &str = "Updating to template version ";

/// Errors from template-tool invocations.
#[derive(Debug, Error)]
pub enum CopierError {
    /// The copier executable could not be run.
    #[error("Failed to execute {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Copier exited with a non-zero status.
    #[error("{program} {command} failed: {log}")]
    CommandFailed {
        program: String,
        command: String,
        log: String,
    },

    /// The update log contained no resolved template version.
    #[error("Could not find template version in copier log:\n{log}")]
    VersionNotFound { log: String },
}

/// The template-tool operations the bot needs.
#[async_trait]
pub trait TemplateTool {
    /// Re-applies the latest template version inside an existing working
    /// copy, returning the tool's combined log output.
    async fn force_update(&self, workdir: &Path) -> Result<String, CopierError>;

    /// Renders the template at `src` into `dest` with the given
    /// `key=value` answer overrides.
    async fn generate(&self, src: &Path, dest: &Path, answers: &[String]) -> Result<(), CopierError>;
}

/// [`TemplateTool`] implementation that shells out to copier.
#[derive(Debug, Clone)]
pub struct CopierCli {
    program: String,
}

impl CopierCli {
    /// Creates a wrapper around the given copier program name.
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    async fn run(&self, workdir: &Path, args: &[String]) -> Result<std::process::Output, CopierError> {
        debug!(program = %self.program, command = %args.join(" "), "Running copier");

        Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CopierError::SpawnFailed {
                program: self.program.clone(),
                source: e,
            })
    }
}

#[async_trait]
impl TemplateTool for CopierCli {
    async fn force_update(&self, workdir: &Path) -> Result<String, CopierError> {
        let args = vec!["--force".to_string(), "update".to_string()];
        let output = self.run(workdir, &args).await?;

        // Copier writes its progress log to stderr; keep both streams.
        let log = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(CopierError::CommandFailed {
                program: self.program.clone(),
                command: "--force update".to_string(),
                log,
            });
        }

        Ok(log)
    }

    async fn generate(&self, src: &Path, dest: &Path, answers: &[String]) -> Result<(), CopierError> {
        let mut args = vec![
            "-f".to_string(),
            src.display().to_string(),
            dest.display().to_string(),
        ];
        for answer in answers {
            args.push("-d".to_string());
            args.push(answer.clone());
        }

        let output = self.run(Path::new("."), &args).await?;

        if !output.status.success() {
            let log = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(CopierError::CommandFailed {
                program: self.program.clone(),
                command: "generate".to_string(),
                log,
            });
        }

        Ok(())
    }
}

/// Extracts the resolved template version from a copier update log.
///
/// Looks for the first line containing `Updating to template version <v>`.
/// A log without that line is a fatal error for the candidate being
/// processed; the bot must never continue with an unknown version.
///
/// # Errors
///
/// Returns [`CopierError::VersionNotFound`] carrying the full log.
pub fn extract_template_version(log: &str) -> Result<String, CopierError> {
    log.lines()
        .find_map(|line| {
            line.find(VERSION_LINE_PREFIX)
                .map(|start| line[start + VERSION_LINE_PREFIX.len()..].trim().to_string())
        })
        .filter(|version| !version.is_empty())
        .ok_or_else(|| CopierError::VersionNotFound {
            log: log.to_string(),
        })
}
