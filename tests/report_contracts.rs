use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use devpulse_lib::commands::report::open_store;
use devpulse_lib::commands::settings::{load_effective_settings, save_settings_to_disk, Settings};
use devpulse_lib::commands::source::{RecordedMetricsSource, ALL_REPOS_SCOPE};
use devpulse_lib::models::composition::Category;
use devpulse_lib::models::monthly::MonthlyVerdict;
use devpulse_lib::models::report::ReportSource;
use devpulse_lib::models::streak::StreakStatus;
use devpulse_lib::models::verdict::{TrendDirection, VerdictLabel};
use devpulse_lib::{
    build_monthly_report, build_streak, build_weekly_report, ReportContext, ReportError, SnapshotStore,
    SqliteSnapshotStore, WeeklyRequest,
};

const MARCH_WEEKS: [&str; 4] = ["2024-03-04", "2024-03-11", "2024-03-18", "2024-03-25"];

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 10).expect("valid date")
}

fn strong_week() -> serde_json::Value {
    json!({
        "commits": 10,
        "prMerged": 3,
        "featuresCompleted": 1,
        "bugsFound": 1,
        "bugsFixed": 1,
        "testsWritten": 5,
        "ciRuns": 2
    })
}

/// March 2024 for `octo/app`: strong, weak, strong, strong.
fn write_activity(dir: &TempDir) -> RecordedMetricsSource {
    let activity = json!({
        "repositories": [
            { "fullName": "octo/app", "fork": false },
            { "fullName": "octo/upstream-fork", "fork": true }
        ],
        "weeks": {
            "2024-03-04": { "octo/app": strong_week() },
            "2024-03-11": { "octo/app": { "commits": 2 } },
            "2024-03-18": { "octo/app": strong_week() },
            "2024-03-25": { "octo/app": strong_week() }
        }
    });
    let path = dir.path().join("activity.json");
    fs::write(&path, serde_json::to_string_pretty(&activity).expect("serialize activity"))
        .expect("write activity file");
    RecordedMetricsSource::from_file(&path).expect("load activity file")
}

fn open_data_dir() -> (TempDir, Settings, SqliteSnapshotStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let settings = load_effective_settings(dir.path()).expect("load settings");
    let store = open_store(&settings).expect("open snapshot store");
    (dir, settings, store)
}

fn request(user: &str, week: &str) -> WeeklyRequest {
    WeeklyRequest {
        github_user_id: user.to_string(),
        username: "octocat".to_string(),
        week_start: Some(week.to_string()),
        repo_scope: ALL_REPOS_SCOPE.to_string(),
    }
}

async fn record_march(ctx: &ReportContext<'_>, user: &str) {
    for week in MARCH_WEEKS {
        let report = build_weekly_report(ctx, &request(user, week))
            .await
            .expect("weekly report");
        assert_eq!(report.source, ReportSource::Computed, "{week}");
    }
}

#[tokio::test]
async fn past_weeks_persist_once_and_replay_from_disk() {
    let (dir, settings, store) = open_data_dir();
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };

    record_march(&ctx, "42").await;

    let reopened = open_store(&settings).expect("reopen snapshot store");
    let ctx = ReportContext {
        store: &reopened,
        source: &source,
        settings: &settings,
        today: today(),
    };
    let replay = build_weekly_report(&ctx, &request("42", "2024-03-25"))
        .await
        .expect("replayed report");

    assert_eq!(replay.source, ReportSource::Snapshot);
    assert!(replay.repositories.is_empty());
    assert_eq!(replay.verdict.label, VerdictLabel::Strong);
    assert!(replay.qualified);
    assert_eq!(replay.trend.trend, TrendDirection::Improving);
    assert_eq!(replay.streak.current_streak, 2);
    assert_eq!(reopened.list_recent("42", ALL_REPOS_SCOPE, 12).expect("list").len(), 4);
}

#[tokio::test]
async fn computed_week_lists_only_non_fork_repositories() {
    let (dir, settings, store) = open_data_dir();
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };

    let report = build_weekly_report(&ctx, &request("42", "2024-03-11"))
        .await
        .expect("weekly report");

    assert_eq!(report.repositories, vec!["octo/app".to_string()]);
    assert_eq!(report.verdict.label, VerdictLabel::Chaotic);
    assert!(!report.qualified);

    let missing = WeeklyRequest {
        repo_scope: "octo/missing".to_string(),
        ..request("42", "2024-03-11")
    };
    let err = build_weekly_report(&ctx, &missing).await.expect_err("unknown repository");
    assert!(matches!(err, ReportError::NoData(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn monthly_report_folds_stored_weeks() {
    let (dir, settings, store) = open_data_dir();
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };
    record_march(&ctx, "42").await;

    let report = build_monthly_report(&store, Some("42"), "2024-03", today()).expect("monthly report");

    assert_eq!(report.summary.total_weeks, 4);
    assert_eq!(report.summary.qualified_weeks, 3);
    assert_eq!(report.summary.verdict, MonthlyVerdict::SolidMonth);
    assert_eq!(report.summary.end_of_month_streak, 2);
    assert_eq!(report.summary.metrics.activity.commits, 32);
    assert_eq!(report.summary.metrics.combat.bug_fix_ratio, 1.0);
    assert_eq!(report.composition.dominant_category, Category::Delivery);
    assert_eq!(report.composition.delivery_percent, 60.7);
    assert_eq!(report.composition.stability_percent, 9.8);
    assert_eq!(report.composition.quality_percent, 29.5);

    let value = serde_json::to_value(&report).expect("serialize monthly report");
    assert_eq!(value["verdict"], json!("SOLID_MONTH"));
    assert_eq!(value["totalWeeks"], json!(4));
    assert_eq!(value["composition"]["dominantCategory"], json!("DELIVERY"));

    let slash = build_monthly_report(&store, Some("42"), "2024/03", today()).expect("slash month");
    assert_eq!(slash.summary, report.summary);
}

#[tokio::test]
async fn public_monthly_report_spans_every_user() {
    let (dir, settings, store) = open_data_dir();
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };
    record_march(&ctx, "42").await;
    build_weekly_report(&ctx, &request("7", "2024-03-11"))
        .await
        .expect("second user week");

    let own = build_monthly_report(&store, Some("42"), "2024-03", today()).expect("user report");
    let public = build_monthly_report(&store, None, "2024-03", today()).expect("public report");

    assert_eq!(own.summary.total_weeks, 4);
    assert_eq!(public.summary.total_weeks, 5);
    assert_eq!(public.summary.qualified_weeks, 3);
    assert_eq!(public.summary.verdict, MonthlyVerdict::UnstableMonth);

    let err = build_monthly_report(&store, None, "2024-02", today()).expect_err("empty month");
    assert!(matches!(err, ReportError::NoData(ref msg) if msg == "No data for 2024-02"));
}

#[tokio::test]
async fn streak_counts_back_from_newest_stored_week() {
    let (dir, settings, store) = open_data_dir();
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };
    record_march(&ctx, "42").await;

    let streak = build_streak(&store, "42", ALL_REPOS_SCOPE, settings.streak_lookback_weeks);
    assert_eq!(streak.current_streak, 2);
    assert_eq!(streak.previous_streak, 2);
    assert_eq!(streak.last_qualified_week, "2024-03-25");
    assert_eq!(streak.status, StreakStatus::Active);

    let stranger = build_streak(&store, "99", ALL_REPOS_SCOPE, settings.streak_lookback_weeks);
    assert_eq!(stranger.current_streak, 0);
    assert_eq!(stranger.status, StreakStatus::Broken);
}

#[tokio::test]
async fn configured_targets_drive_weekly_evaluation() {
    let dir = tempfile::tempdir().expect("create temp dir");
    save_settings_to_disk(
        dir.path(),
        json!({ "weeklyTargets": { "prMerged": 5, "onTrackThreshold": 1.0 } }),
    )
    .expect("save settings");
    let settings = load_effective_settings(dir.path()).expect("load settings");
    let store = open_store(&settings).expect("open snapshot store");
    let source = write_activity(&dir);
    let ctx = ReportContext {
        store: &store,
        source: &source,
        settings: &settings,
        today: today(),
    };

    let report = build_weekly_report(&ctx, &request("42", "2024-03-04"))
        .await
        .expect("weekly report");

    assert_eq!(report.targets.pr_merged.target, 5);
    assert!(!report.targets.pr_merged.met);
    assert!(report.targets.tests_written.met);
    assert_eq!(report.targets.completion_rate, 0.75);
    assert_eq!(report.verdict.label, VerdictLabel::Strong);
    assert!(!report.qualified);
}
