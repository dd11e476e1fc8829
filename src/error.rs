use crate::commands::db::StoreError;
use crate::commands::source::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Malformed or out-of-range identifiers. Nothing is computed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Upstream has nothing to report on (no repositories, no snapshots in range).
    #[error("no data: {0}")]
    NoData(String),
    /// The snapshot store cannot be reached at all.
    #[error("snapshot store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    /// The primary metrics fetch failed.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[source] SourceError),
    /// A secondary enrichment failed; the report continues without it.
    #[error("{context} unavailable: {reason}")]
    Enrichment { context: &'static str, reason: String },
}

impl ReportError {
    pub fn enrichment(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Enrichment {
            context,
            reason: err.to_string(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Enrichment { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::NoData(_) => 404,
            Self::StoreUnavailable(_) => 503,
            Self::Upstream(_) => 502,
            Self::Enrichment { .. } => 200,
        }
    }
}

/// Swallow recoverable failures with `fallback`; propagate fatal ones.
pub fn recover<T>(result: Result<T, ReportError>, fallback: impl FnOnce() -> T) -> Result<T, ReportError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_recoverable() => {
            log::warn!("Degrading report: {err}");
            Ok(fallback())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enrichment_failures_are_recoverable() {
        assert!(ReportError::enrichment("trend", "boom").is_recoverable());
        assert!(!ReportError::NoData("nothing".into()).is_recoverable());
        assert!(!ReportError::InvalidInput("bad".into()).is_recoverable());
    }

    #[test]
    fn recover_uses_fallback_for_enrichment_errors() {
        let degraded: Result<u32, _> = recover(Err(ReportError::enrichment("streak", "offline")), || 0);
        assert_eq!(degraded.unwrap(), 0);

        let fatal: Result<u32, _> = recover(Err(ReportError::NoData("empty".into())), || 0);
        assert!(matches!(fatal, Err(ReportError::NoData(_))));

        assert_eq!(recover(Ok(7), || 0).unwrap(), 7);
    }

    #[test]
    fn status_codes_separate_missing_data_from_outages() {
        assert_eq!(ReportError::NoData("x".into()).status_code(), 404);
        assert_eq!(
            ReportError::StoreUnavailable(StoreError::Unavailable("down".into())).status_code(),
            503
        );
    }
}
