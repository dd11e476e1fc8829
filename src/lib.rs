pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use commands::db::{InMemorySnapshotStore, SnapshotStore, SqliteSnapshotStore, StoreError};
pub use commands::report::{build_monthly_report, build_streak, build_weekly_report, ReportContext, WeeklyRequest};
pub use error::ReportError;

