//! Branch naming, PR titles, and PR body rendering.

use bstr::ByteSlice;
use handlebars::{no_escape, Handlebars};
use serde_json::json;
use thiserror::Error;

/// Branch name prefix for template update proposals.
///
/// `copier/<version>` is a stable, parseable identifier; downstream tooling
/// relies on the prefix to recognize bot branches.
const BRANCH_PREFIX: &str = "copier/";

/// Embedded PR body template.
///
/// Rendered with `template_url`, `version`, `branch`, and `log`. The log
/// field is referenced as `{{this.log}}` because a bare `{{log}}` resolves
/// to handlebars' built-in `log` helper instead of the data field.
const PR_BODY_TEMPLATE: &str = r#"**This is an automated PR from {{template_url}}**

This updates the template to version {{version}}. If there are merge conflicts,
they will be indicated with `*.rej` files that will be committed to this branch.
In this case, the `lint` workflow will fail, and you will need to resolve these
conflicts manually:

```bash
git checkout -b {{branch}} origin/{{branch}}
# Fix the conflicts and commit
git push origin {{branch}}
```

Full update log below:

<details>
<summary>Copier log</summary>

```
{{this.log}}
```
</details>
"#;

/// Template rendering and branch naming errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Handlebars rendering error.
    #[error("Template rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    /// The resolved template version would form an invalid git ref.
    #[error("Template version '{version}' does not form a valid branch name")]
    InvalidBranchName { version: String },
}

/// Builds the update branch name for a resolved template version.
///
/// Format: `copier/<version>`, validated as a git reference name so a
/// malformed version string from the copier log cannot produce a branch
/// git would reject (or worse, extra command-line arguments).
///
/// # Errors
///
/// Returns [`TemplateError::InvalidBranchName`] if validation fails.
pub fn branch_name(version: &str) -> Result<String, TemplateError> {
    let branch = format!("{BRANCH_PREFIX}{version}");

    if gix_validate::reference::name_partial(branch.as_bytes().as_bstr()).is_err() {
        return Err(TemplateError::InvalidBranchName {
            version: version.to_string(),
        });
    }

    Ok(branch)
}

/// Builds the PR title for a template update.
///
/// Format: `[copier] Updating template to version <version>`.
#[must_use]
pub fn pr_title(version: &str) -> String {
    format!("[copier] Updating template to version {version}")
}

/// Renders pull request bodies from the embedded template.
pub struct PrBodyRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PrBodyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PrBodyRenderer {
    /// Creates a renderer with markdown-friendly settings.
    ///
    /// HTML escaping is disabled (the output is markdown) and strict mode is
    /// on so a missing variable fails loudly instead of rendering blank.
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    /// Renders the PR body for one update proposal.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if rendering fails.
    pub fn render(
        &self,
        template_url: &str,
        version: &str,
        branch: &str,
        log: &str,
    ) -> Result<String, TemplateError> {
        let data = json!({
            "template_url": template_url,
            "version": version,
            "branch": branch,
            "log": log,
        });

        Ok(self.handlebars.render_template(PR_BODY_TEMPLATE, &data)?)
    }
}
