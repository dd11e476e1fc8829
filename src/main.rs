use clap::{Parser, Subcommand};
use devpulse_lib::commands::report::open_store;
use devpulse_lib::commands::settings::{load_effective_settings, load_settings_from_disk, save_settings_to_disk};
use devpulse_lib::commands::source::{RecordedMetricsSource, ALL_REPOS_SCOPE};
use devpulse_lib::{
    build_monthly_report, build_streak, build_weekly_report, ReportContext, ReportError, WeeklyRequest,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "devpulse")]
#[command(about = "Weekly and monthly developer scorecards from GitHub activity", version)]
struct Cli {
    /// Directory holding settings.json and the snapshot database
    #[arg(long, global = true, env = "DEVPULSE_DATA_DIR", default_value = ".devpulse")]
    data_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one week; past weeks are written once and replayed afterwards
    Weekly {
        /// Stable GitHub user id the snapshots are keyed by
        #[arg(long)]
        user: String,

        /// GitHub login used to attribute activity
        #[arg(long)]
        username: String,

        /// Recorded activity JSON (repositories plus per-week counts)
        #[arg(long)]
        activity: PathBuf,

        /// Monday of the week to report (YYYY-MM-DD); defaults to the current week
        #[arg(long)]
        week: Option<String>,

        /// "all" or a repository full name
        #[arg(long, default_value = ALL_REPOS_SCOPE)]
        repo: String,
    },

    /// Roll up a calendar month of stored weeks
    Monthly {
        /// Month as YYYY-MM or YYYY/MM
        #[arg(long)]
        month: String,

        /// Restrict to one user; every user's weeks are folded when absent
        #[arg(long)]
        user: Option<String>,
    },

    /// Consecutive qualifying weeks ending at the newest stored week
    Streak {
        #[arg(long)]
        user: String,

        #[arg(long, default_value = ALL_REPOS_SCOPE)]
        repo: String,

        /// Lookback window; the configured value when absent
        #[arg(long)]
        weeks: Option<u32>,
    },

    /// Print settings.json, merging a JSON object into it first when given
    Config {
        /// Partial settings, e.g. '{"weeklyTargets":{"prMerged":4}}'
        #[arg(long)]
        set: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp_secs()
        .init();

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, String> {
    let settings = load_effective_settings(&cli.data_dir)?;
    let store = open_store(&settings).map_err(report_failure)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Weekly {
            user,
            username,
            activity,
            week,
            repo,
        } => {
            let source = RecordedMetricsSource::from_file(&activity)
                .map_err(|e| format!("Failed to load {}: {e}", activity.display()))?;
            let ctx = ReportContext {
                store: &store,
                source: &source,
                settings: &settings,
                today,
            };
            let request = WeeklyRequest {
                github_user_id: user,
                username,
                week_start: week,
                repo_scope: repo,
            };
            let report = build_weekly_report(&ctx, &request)
                .await
                .map_err(report_failure)?;
            to_json(&report)
        }
        Command::Monthly { month, user } => {
            let report = build_monthly_report(&store, user.as_deref(), &month, today)
                .map_err(report_failure)?;
            to_json(&report)
        }
        Command::Streak { user, repo, weeks } => {
            let streak = build_streak(
                &store,
                &user,
                &repo,
                weeks.unwrap_or(settings.streak_lookback_weeks),
            );
            to_json(&streak)
        }
        Command::Config { set } => configure(&cli.data_dir, set.as_deref()),
    }
}

fn configure(data_dir: &Path, patch: Option<&str>) -> Result<String, String> {
    let settings = match patch {
        Some(raw) => {
            let patch: serde_json::Value =
                serde_json::from_str(raw).map_err(|e| format!("Invalid settings JSON: {e}"))?;
            if !patch.is_object() {
                return Err("Settings patch must be a JSON object".to_string());
            }
            save_settings_to_disk(data_dir, patch)?
        }
        None => load_settings_from_disk(data_dir)?,
    };
    to_json(&settings)
}

fn report_failure(e: ReportError) -> String {
    format!("[{}] {e}", e.status_code())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {e}"))
}
