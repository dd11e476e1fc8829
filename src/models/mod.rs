pub mod composition;
pub mod metrics;
pub mod monthly;
pub mod period;
pub mod report;
pub mod snapshot;
pub mod streak;
pub mod targets;
pub mod verdict;
