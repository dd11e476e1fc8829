pub mod composition;
pub mod monthly;
pub mod streak;
pub mod targets;
pub mod verdict;
