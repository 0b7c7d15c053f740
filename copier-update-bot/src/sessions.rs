//! Template test/build session definitions.
//!
//! Each session renders the template into a disposable directory with fixed
//! answers, optionally layering extra option overrides, and runs an external
//! test or build command against the result. Sessions are independent and
//! stateless; a failing command surfaces as a [`SessionError`].

use crate::copier::{CopierError, TemplateTool};
use crate::vcs::{Vcs, VcsError};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, info_span, Instrument};

/// Errors from running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Template generation failed.
    #[error(transparent)]
    Copier(#[from] CopierError),

    /// Initializing the rendered project's repository failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Could not create the session's working directory.
    #[error("Failed to create session directory: {0}")]
    WorkdirError(#[from] std::io::Error),

    /// An external command could not be run.
    #[error("Failed to execute {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited with a non-zero status.
    #[error("{command} failed:\n{output}")]
    CommandFailed { command: String, output: String },

    /// The session name is not defined.
    #[error("Unknown session '{name}'")]
    UnknownSession { name: String },
}

/// The named sessions the automation defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionName {
    /// Render, install, and run the basic test suite.
    Tests,
    /// Render with the compiled-extension variant and run its tests.
    Compiled,
    /// Build distributions for both variants and check them.
    Build,
    /// Run the pre-commit checks over the template repository itself.
    Lint,
    /// Refresh the pinned pre-commit hook revisions shipped with the template.
    UpdatePreCommit,
}

impl SessionName {
    /// Every defined session, in a stable order.
    #[must_use]
    pub fn all() -> &'static [SessionName] {
        &[
            Self::Tests,
            Self::Compiled,
            Self::Build,
            Self::Lint,
            Self::UpdatePreCommit,
        ]
    }

    /// The session's invocation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tests => "tests",
            Self::Compiled => "compiled",
            Self::Build => "build",
            Self::Lint => "lint",
            Self::UpdatePreCommit => "update-pre-commit",
        }
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionName {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tests" => Ok(Self::Tests),
            "compiled" => Ok(Self::Compiled),
            "build" => Ok(Self::Build),
            "lint" => Ok(Self::Lint),
            "update-pre-commit" => Ok(Self::UpdatePreCommit),
            other => Err(SessionError::UnknownSession {
                name: other.to_string(),
            }),
        }
    }
}

/// The fixed answers every session renders the template with.
fn base_answers() -> Vec<String> {
    vec![r#"project_name="dfm test package""#.to_string()]
}

/// Answers for the compiled-extension variant.
fn compiled_answers() -> Vec<String> {
    let mut answers = base_answers();
    answers.push("enable_pybind11=yes".to_string());
    answers
}

/// Runs one named session against the template at `template_path`.
///
/// # Errors
///
/// Returns [`SessionError`] if generation, installation, or the session's
/// command fails; the caller maps this to a non-zero exit status.
pub async fn run_session<T, V>(
    name: SessionName,
    tool: &T,
    vcs: &V,
    template_path: &Path,
) -> Result<(), SessionError>
where
    T: TemplateTool + Sync,
    V: Vcs + Sync,
{
    let span = info_span!("session", name = %name);

    async {
        info!("Starting session");
        match name {
            SessionName::Tests => {
                let project = generate_project(tool, vcs, template_path, &base_answers()).await?;
                install_project(project.path()).await?;
                run_command(
                    "pytest",
                    &["-v", "tests/test_basic.py"],
                    project.path(),
                )
                .await?;
            }
            SessionName::Compiled => {
                let project =
                    generate_project(tool, vcs, template_path, &compiled_answers()).await?;
                install_project(project.path()).await?;
                run_command(
                    "pytest",
                    &["-v", "tests/test_compiled.py"],
                    project.path(),
                )
                .await?;
            }
            SessionName::Build => {
                for answers in [compiled_answers(), base_answers()] {
                    let project = generate_project(tool, vcs, template_path, &answers).await?;
                    run_command("python", &["-m", "build"], project.path()).await?;
                    run_command(
                        "python",
                        &["-m", "twine", "check", "--strict", "dist/*"],
                        project.path(),
                    )
                    .await?;
                }
            }
            SessionName::Lint => {
                run_command("pre-commit", &["run", "--all-files"], template_path).await?;
            }
            SessionName::UpdatePreCommit => {
                run_command(
                    "pre-commit",
                    &["autoupdate", "-c", "template/.pre-commit-config.yaml"],
                    template_path,
                )
                .await?;
            }
        }
        info!("Session complete");
        Ok(())
    }
    .instrument(span)
    .await
}

/// Renders the template into a fresh directory and initializes git in it.
///
/// Copier's update machinery expects the rendered project to be a git
/// repository, so every generated project starts with `git init`.
async fn generate_project<T, V>(
    tool: &T,
    vcs: &V,
    template_path: &Path,
    answers: &[String],
) -> Result<tempfile::TempDir, SessionError>
where
    T: TemplateTool + Sync,
    V: Vcs + Sync,
{
    let dir = tempfile::tempdir()?;
    tool.generate(template_path, dir.path(), answers).await?;
    vcs.init(dir.path()).await?;
    Ok(dir)
}

/// Installs the rendered project in editable mode.
async fn install_project(project: &Path) -> Result<(), SessionError> {
    run_command("python", &["-m", "pip", "install", "-e", "."], project).await
}

/// Runs one external command, failing on a non-zero exit.
async fn run_command(program: &str, args: &[&str], cwd: &Path) -> Result<(), SessionError> {
    let command = format!("{program} {}", args.join(" "));
    info!(command = %command, "Running");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SessionError::SpawnFailed {
            command: command.clone(),
            source: e,
        })?;

    if !output.status.success() {
        let output_text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        return Err(SessionError::CommandFailed {
            command,
            output: output_text,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_names_round_trip() {
        for session in SessionName::all() {
            assert_eq!(session.as_str().parse::<SessionName>().unwrap(), *session);
        }
    }

    #[test]
    fn defines_every_session() {
        let names: Vec<_> = SessionName::all().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["tests", "compiled", "build", "lint", "update-pre-commit"]
        );
    }

    #[test]
    fn parses_update_pre_commit() {
        assert_eq!(
            "update-pre-commit".parse::<SessionName>().unwrap(),
            SessionName::UpdatePreCommit
        );
    }

    #[test]
    fn unknown_session_is_an_error() {
        let result = "deploy".parse::<SessionName>();
        assert!(matches!(
            result,
            Err(SessionError::UnknownSession { .. })
        ));
    }

    #[test]
    fn base_answers_pin_the_project_name() {
        let answers = base_answers();
        assert_eq!(answers, vec![r#"project_name="dfm test package""#]);
    }

    #[test]
    fn compiled_answers_enable_pybind11() {
        let answers = compiled_answers();
        assert!(answers.contains(&"enable_pybind11=yes".to_string()));
        assert_eq!(answers.len(), 2);
    }
}
