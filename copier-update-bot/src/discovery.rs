//! Candidate discovery through GitHub code search.
//!
//! Downstream projects record the template origin marker in their copier
//! answers file; searching for that marker finds every consumer.

use crate::config::BotConfig;
use crate::rate_limit::{ensure_rate_limit, Resource};
use octocrab::Octocrab;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

/// Errors that can occur during candidate discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}

/// A downstream repository that declares the template as its origin.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRepository {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// Full repository name in "owner/name" format.
    pub full_name: String,

    /// HTTPS clone URL.
    pub clone_url: String,

    /// Whether the authenticated user can push to this repository.
    pub can_push: bool,

    /// Default branch name (e.g., "main").
    pub default_branch: String,
}

/// Maximum results taken from the code search.
const MAX_SEARCH_RESULTS: usize = 1000;

/// Results per page for code search.
const RESULTS_PER_PAGE: u8 = 100;

/// A raw code-search match before deduplication.
#[derive(Debug, Clone)]
struct SearchMatch {
    owner: String,
    name: String,
    full_name: String,
    path: String,
}

/// Discovers every repository consuming the template.
///
/// Searches GitHub code search for the configured marker, keeps only matches
/// in the answers file, deduplicates by repository (a repository may contain
/// several matching files but is processed once), and enriches each candidate
/// with clone URL, push permission, and default branch.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if the search or repository lookups fail.
pub async fn discover_candidates(
    octocrab: &Octocrab,
    config: &BotConfig,
) -> Result<Vec<CandidateRepository>, DiscoveryError> {
    let span = info_span!("discover", marker = %config.search_marker);

    async {
        info!("Starting candidate discovery");

        ensure_rate_limit(octocrab, Resource::Search).await?;

        let query = build_search_query(&config.search_marker);
        debug!(query = %query, "Executing code search");

        let matches = execute_code_search(octocrab, &query).await?;
        let names = deduplicate_matches(matches, &config.answers_file);

        info!(count = names.len(), "Deduplicated search results");

        let mut candidates = Vec::with_capacity(names.len());
        for (owner, name, full_name) in names {
            match fetch_candidate(octocrab, &owner, &name, &full_name).await {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    warn!(repo = %full_name, error = %e, "Failed to fetch repository details");
                }
            }
        }

        info!(count = candidates.len(), "Discovery complete");
        Ok(candidates)
    }
    .instrument(span)
    .await
}

/// Builds the code search query for the template marker.
///
/// The marker is quoted so the search requires an exact phrase match.
fn build_search_query(marker: &str) -> String {
    format!("\"{marker}\"")
}

/// Executes the code search with pagination.
async fn execute_code_search(
    octocrab: &Octocrab,
    query: &str,
) -> Result<Vec<SearchMatch>, DiscoveryError> {
    let mut all_matches = Vec::new();

    let mut page = octocrab
        .search()
        .code(query)
        .per_page(RESULTS_PER_PAGE)
        .send()
        .await?;

    all_matches.extend(extract_search_results(&page));

    while let Some(next_page) = octocrab
        .get_page::<octocrab::models::Code>(&page.next)
        .await?
    {
        if all_matches.len() >= MAX_SEARCH_RESULTS {
            warn!(
                max = MAX_SEARCH_RESULTS,
                "Reached maximum search results limit"
            );
            break;
        }

        ensure_rate_limit(octocrab, Resource::Search).await?;

        all_matches.extend(extract_search_results(&next_page));
        page.next = next_page.next;

        if page.next.is_none() {
            break;
        }
    }

    Ok(all_matches)
}

/// Extracts matches from a search response page.
fn extract_search_results(page: &octocrab::Page<octocrab::models::Code>) -> Vec<SearchMatch> {
    page.items
        .iter()
        .filter_map(|item| {
            let repo = &item.repository;
            let owner = repo.owner.as_ref()?.login.clone();
            let name = repo.name.clone();
            let full_name = format!("{owner}/{name}");

            Some(SearchMatch {
                owner,
                name,
                full_name,
                path: item.path.clone(),
            })
        })
        .collect()
}

/// Filters matches to the answers file and deduplicates by repository.
///
/// Deduplication is order-independent: whichever matching file is seen
/// first, each repository appears exactly once in the output.
fn deduplicate_matches(
    matches: Vec<SearchMatch>,
    answers_file: &str,
) -> Vec<(String, String, String)> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for m in matches {
        if m.path != answers_file {
            continue;
        }
        if seen.insert(m.full_name.clone()) {
            names.push((m.owner, m.name, m.full_name));
        }
    }

    names
}

/// Fetches the repository details needed to process a candidate.
async fn fetch_candidate(
    octocrab: &Octocrab,
    owner: &str,
    name: &str,
    full_name: &str,
) -> Result<CandidateRepository, DiscoveryError> {
    let repo = octocrab.repos(owner, name).get().await?;

    let clone_url = repo
        .clone_url
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://github.com/{full_name}.git"));

    let can_push = repo.permissions.map(|p| p.push).unwrap_or(false);

    let default_branch = repo.default_branch.unwrap_or_else(|| "main".to_string());

    Ok(CandidateRepository {
        owner: owner.to_string(),
        name: name.to_string(),
        full_name: full_name.to_string(),
        clone_url,
        can_push,
        default_branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_match(full_name: &str, path: &str) -> SearchMatch {
        let (owner, name) = full_name.split_once('/').unwrap();
        SearchMatch {
            owner: owner.to_string(),
            name: name.to_string(),
            full_name: full_name.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn quotes_the_marker_in_queries() {
        assert_eq!(
            build_search_query("gh:dfm/copier-python"),
            "\"gh:dfm/copier-python\""
        );
    }

    #[test]
    fn deduplicates_repeated_repositories() {
        let matches = vec![
            search_match("user/repo", ".copier-answers.yml"),
            search_match("user/repo", ".copier-answers.yml"),
            search_match("other/project", ".copier-answers.yml"),
        ];

        let names = deduplicate_matches(matches, ".copier-answers.yml");

        assert_eq!(names.len(), 2);
        assert_eq!(names[0].2, "user/repo");
        assert_eq!(names[1].2, "other/project");
    }

    #[test]
    fn deduplication_is_order_independent() {
        let forward = vec![
            search_match("a/one", ".copier-answers.yml"),
            search_match("b/two", ".copier-answers.yml"),
            search_match("a/one", ".copier-answers.yml"),
        ];
        let reversed: Vec<_> = forward.iter().cloned().rev().collect();

        let mut from_forward: Vec<_> = deduplicate_matches(forward, ".copier-answers.yml")
            .into_iter()
            .map(|(_, _, full)| full)
            .collect();
        let mut from_reversed: Vec<_> = deduplicate_matches(reversed, ".copier-answers.yml")
            .into_iter()
            .map(|(_, _, full)| full)
            .collect();

        from_forward.sort();
        from_reversed.sort();
        assert_eq!(from_forward, from_reversed);
    }

    #[test]
    fn ignores_matches_outside_the_answers_file() {
        let matches = vec![
            search_match("user/repo", "README.md"),
            search_match("user/repo", ".copier-answers.yml"),
        ];

        let names = deduplicate_matches(matches, ".copier-answers.yml");

        assert_eq!(names.len(), 1);
    }
}
