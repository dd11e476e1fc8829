use crate::models::metrics::{RepoWeekCounts, WeeklyMetrics};
use crate::models::period::{WeekRange, WEEK_FORMAT};
use crate::models::report::Repository;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

pub const ALL_REPOS_SCOPE: &str = "all";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid activity data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Request(String),
}

/// Supplier of raw GitHub activity. Fetching, paging and auth live behind this seam.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError>;

    async fn fetch_repo_week(
        &self,
        repo_full_name: &str,
        username: &str,
        week: &WeekRange,
    ) -> Result<RepoWeekCounts, SourceError>;
}

/// `"all"` selects every non-fork repository, anything else one repository by full name.
pub async fn resolve_repositories(
    source: &dyn MetricsSource,
    repo_scope: &str,
) -> Result<Vec<Repository>, SourceError> {
    let repos = source
        .list_repositories()
        .await?
        .into_iter()
        .filter(|repo| !repo.fork)
        .filter(|repo| repo_scope == ALL_REPOS_SCOPE || repo.full_name == repo_scope)
        .collect();
    Ok(repos)
}

/// Fetch every repository's week concurrently and sum the results.
/// A repository that fails to load contributes zeros; the week fails only when every fetch did.
pub async fn collect_weekly_metrics(
    source: &dyn MetricsSource,
    repos: &[Repository],
    username: &str,
    week: &WeekRange,
) -> Result<WeeklyMetrics, SourceError> {
    let fetches = repos
        .iter()
        .map(|repo| source.fetch_repo_week(&repo.full_name, username, week));
    let results = join_all(fetches).await;

    let mut counts = Vec::with_capacity(results.len());
    let mut last_error = None;
    for (result, repo) in results.into_iter().zip(repos) {
        match result {
            Ok(repo_counts) => counts.push(repo_counts),
            Err(e) => {
                log::warn!(
                    "Error fetching activity for {} week {}: {e}",
                    repo.full_name,
                    week.week_id()
                );
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if counts.is_empty() => Err(e),
        _ => Ok(WeeklyMetrics::aggregate(&counts)),
    }
}

/// Activity recorded in a JSON file, keyed by week start then repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedActivity {
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub weeks: HashMap<String, HashMap<String, RepoWeekCounts>>,
}

/// Offline [`MetricsSource`] backed by [`RecordedActivity`].
#[derive(Debug, Clone, Default)]
pub struct RecordedMetricsSource {
    activity: RecordedActivity,
}

impl RecordedMetricsSource {
    pub fn new(activity: RecordedActivity) -> Self {
        Self { activity }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl MetricsSource for RecordedMetricsSource {
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError> {
        Ok(self.activity.repositories.clone())
    }

    async fn fetch_repo_week(
        &self,
        repo_full_name: &str,
        _username: &str,
        week: &WeekRange,
    ) -> Result<RepoWeekCounts, SourceError> {
        Ok(self
            .activity
            .weeks
            .get(&week.start.format(WEEK_FORMAT).to_string())
            .and_then(|repos| repos.get(repo_full_name))
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct FlakySource;

    #[async_trait]
    impl MetricsSource for FlakySource {
        async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError> {
            Ok(vec![
                Repository {
                    full_name: "octo/app".to_string(),
                    fork: false,
                },
                Repository {
                    full_name: "octo/broken".to_string(),
                    fork: false,
                },
                Repository {
                    full_name: "octo/fork".to_string(),
                    fork: true,
                },
            ])
        }

        async fn fetch_repo_week(
            &self,
            repo_full_name: &str,
            _username: &str,
            _week: &WeekRange,
        ) -> Result<RepoWeekCounts, SourceError> {
            if repo_full_name == "octo/broken" {
                return Err(SourceError::Request("rate limited".to_string()));
            }
            Ok(RepoWeekCounts {
                commits: 4,
                bugs_fixed: 1,
                ..Default::default()
            })
        }
    }

    fn week() -> WeekRange {
        WeekRange::containing(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap())
    }

    #[tokio::test]
    async fn all_scope_skips_forks() {
        let repos = resolve_repositories(&FlakySource, ALL_REPOS_SCOPE).await.unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["octo/app", "octo/broken"]);

        let single = resolve_repositories(&FlakySource, "octo/app").await.unwrap();
        assert_eq!(single.len(), 1);
        assert!(resolve_repositories(&FlakySource, "octo/missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_repository_contributes_zeros() {
        let repos = resolve_repositories(&FlakySource, ALL_REPOS_SCOPE).await.unwrap();
        let metrics = collect_weekly_metrics(&FlakySource, &repos, "octocat", &week())
            .await
            .expect("one repository still loads");
        assert_eq!(metrics.activity.commits, 4);
        assert_eq!(metrics.combat.bug_fix_ratio, 1.0);

        let broken_only: Vec<_> = repos.into_iter().filter(|r| r.full_name == "octo/broken").collect();
        assert!(collect_weekly_metrics(&FlakySource, &broken_only, "octocat", &week())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn recorded_source_reads_weeks_by_start_date() {
        let activity: RecordedActivity = serde_json::from_value(serde_json::json!({
            "repositories": [{ "fullName": "octo/app", "fork": false }],
            "weeks": {
                "2024-03-04": { "octo/app": { "commits": 3, "prMerged": 2 } }
            }
        }))
        .unwrap();
        let source = RecordedMetricsSource::new(activity);

        let counts = source.fetch_repo_week("octo/app", "octocat", &week()).await.unwrap();
        assert_eq!(counts.commits, 3);
        assert_eq!(counts.pr_merged, 2);

        let empty = source
            .fetch_repo_week("octo/app", "octocat", &week().previous())
            .await
            .unwrap();
        assert_eq!(empty, RepoWeekCounts::default());
    }
}
