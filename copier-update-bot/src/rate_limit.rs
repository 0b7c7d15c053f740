//! GitHub API rate-limit hygiene.
//!
//! Code search and the core API have separate quotas; both are checked
//! before bursts of calls, sleeping until the reset when running low.

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Maximum time to wait for a rate limit reset (1 hour).
const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// GitHub rate-limited resource classes used by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Code search API quota.
    Search,
    /// Core API quota (repositories, pull requests).
    Core,
}

/// Rate limit snapshot for one resource.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Unix timestamp when the window resets.
    pub reset: u64,
    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Seconds until the reset, or zero if it already passed.
    fn secs_until_reset(&self, now: u64) -> u64 {
        self.reset.saturating_sub(now)
    }
}

/// Fetches the current rate limit for a resource.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_rate_limit(
    octocrab: &Octocrab,
    resource: Resource,
) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let window = match resource {
        Resource::Search => &rate_limit.resources.search,
        Resource::Core => &rate_limit.resources.core,
    };

    Ok(RateLimitInfo {
        remaining: window.remaining as u32,
        reset: window.reset,
        limit: window.limit as u32,
    })
}

/// Sleeps until the reset if the remaining quota is low.
///
/// Returns `true` if a wait happened.
pub async fn wait_if_needed(info: &RateLimitInfo) -> bool {
    if info.remaining >= MIN_REMAINING_THRESHOLD {
        return false;
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let wait_secs = info.secs_until_reset(now);
    if wait_secs == 0 {
        return false;
    }

    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }

    let actual_wait = wait_secs.min(MAX_WAIT_SECS);
    info!(
        remaining = info.remaining,
        wait_secs = actual_wait,
        "Rate limit low, waiting for reset"
    );

    tokio::time::sleep(Duration::from_secs(actual_wait)).await;
    true
}

/// Ensures sufficient quota for a resource before making calls against it.
///
/// # Errors
///
/// Returns an error if the rate limit check fails.
pub async fn ensure_rate_limit(
    octocrab: &Octocrab,
    resource: Resource,
) -> Result<(), octocrab::Error> {
    let info = check_rate_limit(octocrab, resource).await?;
    wait_if_needed(&info).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plenty_of_quota_does_not_wait() {
        let info = RateLimitInfo {
            remaining: 100,
            reset: u64::MAX,
            limit: 1000,
        };

        assert!(!wait_if_needed(&info).await);
    }

    #[tokio::test]
    async fn passed_reset_does_not_wait() {
        let info = RateLimitInfo {
            remaining: 1,
            reset: 0,
            limit: 30,
        };

        assert!(!wait_if_needed(&info).await);
    }

    #[test]
    fn secs_until_reset_saturates() {
        let info = RateLimitInfo {
            remaining: 0,
            reset: 10,
            limit: 30,
        };

        assert_eq!(info.secs_until_reset(20), 0);
        assert_eq!(info.secs_until_reset(4), 6);
    }
}
