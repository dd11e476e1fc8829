use crate::analysis::composition::calculate_composition;
use crate::analysis::monthly::summarize_month;
use crate::analysis::streak::calculate_streak;
use crate::analysis::targets::evaluate_targets;
use crate::analysis::verdict::{calculate_trend, calculate_verdict, TREND_WINDOW};
use crate::commands::db::{SnapshotStore, SqliteSnapshotStore, StoreError};
use crate::commands::settings::Settings;
use crate::commands::source::{collect_weekly_metrics, resolve_repositories, MetricsSource, ALL_REPOS_SCOPE};
use crate::error::{recover, ReportError};
use crate::models::metrics::WeeklyMetrics;
use crate::models::monthly::MonthlyReport;
use crate::models::period::{is_current_week, parse_week_start, MonthId, WeekRange};
use crate::models::report::{ReportSource, WeeklyReport};
use crate::models::snapshot::{SnapshotContent, SnapshotKey, WeeklySnapshot};
use crate::models::streak::StreakResult;
use crate::models::verdict::{Trend, TrendDirection, VerdictLabel};
use chrono::{Datelike, Duration, NaiveDate};

/// Collaborators and calendar for one report request.
pub struct ReportContext<'a> {
    pub store: &'a dyn SnapshotStore,
    pub source: &'a dyn MetricsSource,
    pub settings: &'a Settings,
    pub today: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct WeeklyRequest {
    pub github_user_id: String,
    pub username: String,
    /// Monday of the week to report; the current week when absent.
    pub week_start: Option<String>,
    pub repo_scope: String,
}

pub fn open_store(settings: &Settings) -> Result<SqliteSnapshotStore, ReportError> {
    SqliteSnapshotStore::open(&settings.database_path).map_err(ReportError::StoreUnavailable)
}

pub async fn build_weekly_report(
    ctx: &ReportContext<'_>,
    request: &WeeklyRequest,
) -> Result<WeeklyReport, ReportError> {
    let week = resolve_week(request.week_start.as_deref(), ctx.today)?;
    let live = is_current_week(week.start, ctx.today);
    let key = SnapshotKey::new(&request.github_user_id, week.start, &request.repo_scope);

    if !live {
        let existing = recover(
            ctx.store
                .get(&key)
                .map_err(|e| ReportError::enrichment("snapshot read", e)),
            || None,
        )?;
        if let Some(snapshot) = existing {
            log::debug!("Replaying snapshot {} for week {}", snapshot.id, week.week_id());
            return Ok(replay_snapshot(ctx, week, snapshot));
        }
    }

    let repos = resolve_repositories(ctx.source, &request.repo_scope)
        .await
        .map_err(ReportError::Upstream)?;
    if repos.is_empty() {
        return Err(ReportError::NoData(if request.repo_scope == ALL_REPOS_SCOPE {
            "No repositories found".to_string()
        } else {
            format!("Repository not found: {}", request.repo_scope)
        }));
    }

    let previous_week = week.previous();
    let previous_key = SnapshotKey::new(&request.github_user_id, previous_week.start, &request.repo_scope);
    let previous_snapshot = recover(
        ctx.store
            .get(&previous_key)
            .map_err(|e| ReportError::enrichment("previous snapshot read", e)),
        || None,
    )?;

    let previous_fetch = async {
        match previous_snapshot {
            Some(snapshot) => Ok(snapshot.metrics),
            None => collect_weekly_metrics(ctx.source, &repos, &request.username, &previous_week).await,
        }
    };
    let (current, previous) = tokio::join!(
        collect_weekly_metrics(ctx.source, &repos, &request.username, &week),
        previous_fetch
    );

    let metrics = current.map_err(ReportError::Upstream)?;
    let previous: Option<WeeklyMetrics> = recover(
        previous
            .map(Some)
            .map_err(|e| ReportError::enrichment("previous week comparison", e)),
        || None,
    )?;

    let verdict = calculate_verdict(&metrics, previous.as_ref());
    let targets = evaluate_targets(&metrics, &ctx.settings.targets);
    let content = SnapshotContent::evaluate(metrics, verdict, targets);

    let source = if live {
        ReportSource::Live
    } else {
        recover(persist_snapshot(ctx.store, &key, content), || ())?;
        ReportSource::Computed
    };

    let streak = calculate_streak(
        ctx.store,
        &request.github_user_id,
        &request.repo_scope,
        ctx.settings.streak_lookback_weeks,
    );
    let trend = recover(trend_for(ctx, &key, verdict.label), || {
        TrendDirection::InsufficientData.into()
    })?;

    Ok(WeeklyReport {
        week_range: week,
        repo_scope: request.repo_scope.clone(),
        repositories: repos.into_iter().map(|r| r.full_name).collect(),
        metrics,
        verdict,
        trend,
        targets,
        qualified: content.qualified,
        streak,
        source,
    })
}

fn resolve_week(raw: Option<&str>, today: NaiveDate) -> Result<WeekRange, ReportError> {
    let week = match raw {
        Some(raw) => WeekRange::containing(parse_week_start(raw).map_err(ReportError::InvalidInput)?),
        None => WeekRange::containing(today),
    };
    if week.start > today {
        return Err(ReportError::InvalidInput(format!(
            "Week {} has not started yet",
            week.week_id()
        )));
    }
    Ok(week)
}

fn replay_snapshot(ctx: &ReportContext<'_>, week: WeekRange, snapshot: WeeklySnapshot) -> WeeklyReport {
    let key = SnapshotKey::new(&snapshot.github_user_id, snapshot.week_start, &snapshot.repo_scope);
    let streak = calculate_streak(
        ctx.store,
        &snapshot.github_user_id,
        &snapshot.repo_scope,
        ctx.settings.streak_lookback_weeks,
    );
    let trend = trend_for(ctx, &key, snapshot.verdict.label).unwrap_or_else(|e| {
        log::warn!("Degrading report: {e}");
        TrendDirection::InsufficientData.into()
    });

    WeeklyReport {
        week_range: week,
        repo_scope: snapshot.repo_scope,
        repositories: Vec::new(),
        metrics: snapshot.metrics,
        verdict: snapshot.verdict,
        trend,
        targets: snapshot.targets,
        qualified: snapshot.qualified,
        streak,
        source: ReportSource::Snapshot,
    }
}

/// Write a finished past week once. A concurrent writer winning the race is fine.
fn persist_snapshot(
    store: &dyn SnapshotStore,
    key: &SnapshotKey,
    content: SnapshotContent,
) -> Result<(), ReportError> {
    match store.create(key, content) {
        Ok(snapshot) => {
            log::info!(
                "Stored snapshot {} for {} week {} (qualified: {})",
                snapshot.id,
                key.repo_scope,
                snapshot.week_start,
                snapshot.qualified
            );
            Ok(())
        }
        Err(StoreError::AlreadyExists(label)) => {
            log::debug!("Snapshot {label} already stored; keeping existing row");
            Ok(())
        }
        Err(e) => Err(ReportError::enrichment("snapshot write", e)),
    }
}

/// Labels of the persisted weeks before `key`, oldest first, followed by `label`.
/// Predecessors are searched within the lookback window ending the day before the week.
fn trend_for(ctx: &ReportContext<'_>, key: &SnapshotKey, label: VerdictLabel) -> Result<Trend, ReportError> {
    let window_start = key.week_start - Duration::weeks(i64::from(ctx.settings.streak_lookback_weeks));
    let window_end = key.week_start - Duration::days(1);
    let history = ctx
        .store
        .list_range(Some(&key.github_user_id), &key.repo_scope, window_start, window_end)
        .map_err(|e| ReportError::enrichment("verdict trend", e))?;

    let preceding = history.len().saturating_sub(TREND_WINDOW - 1);
    let mut labels: Vec<VerdictLabel> = history[preceding..].iter().map(|s| s.verdict.label).collect();
    labels.push(label);

    Ok(calculate_trend(&labels))
}

/// Monthly rollup for the `"all"` scope. Without a user every user's snapshots are folded.
pub fn build_monthly_report(
    store: &dyn SnapshotStore,
    github_user_id: Option<&str>,
    month: &str,
    today: NaiveDate,
) -> Result<MonthlyReport, ReportError> {
    let month = MonthId::parse(month, today.year()).map_err(ReportError::InvalidInput)?;
    let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
        return Err(ReportError::InvalidInput(format!("Month {month} has no calendar days")));
    };

    let snapshots = store
        .list_range(github_user_id, ALL_REPOS_SCOPE, first, last)
        .map_err(ReportError::StoreUnavailable)?;
    let summary = summarize_month(&snapshots)
        .ok_or_else(|| ReportError::NoData(format!("No data for {month}")))?;
    let composition = calculate_composition(&summary.metrics);

    Ok(MonthlyReport {
        month,
        summary,
        composition,
    })
}

/// Best-effort streak for the outer layer; never fails.
pub fn build_streak(
    store: &dyn SnapshotStore,
    github_user_id: &str,
    repo_scope: &str,
    max_weeks: u32,
) -> StreakResult {
    calculate_streak(store, github_user_id, repo_scope, max_weeks)
}
