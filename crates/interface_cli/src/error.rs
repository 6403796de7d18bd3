//! Command line error handling

use thiserror::Error;

use core_kernel::ErrorCategory;
use domain_metrics::MetricsError;
use infra_store::DatabaseError;

/// Errors surfaced by the command line tools
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Seed file error: {0}")]
    Seed(String),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl CliError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CliError::Config(_) | CliError::Seed(_) => ErrorCategory::Internal,
            CliError::Database(e) if e.is_connection_error() => ErrorCategory::StoreUnavailable,
            CliError::Database(_) => ErrorCategory::Internal,
            CliError::Metrics(e) => e.category(),
        }
    }

    /// Process exit code, following sysexits where one fits
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Validation => 64,
            ErrorCategory::NotFound => 66,
            ErrorCategory::Conflict => 65,
            ErrorCategory::StoreUnavailable => 75,
            ErrorCategory::Internal => 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::TemporalError;

    #[test]
    fn test_exit_codes_follow_category() {
        let bad_window = CliError::from(MetricsError::from(TemporalError::InvalidWindow {
            start: "2024-02-01".into(),
            end: "2024-01-01".into(),
        }));
        assert_eq!(bad_window.exit_code(), 64);

        let offline = CliError::from(DatabaseError::ConnectionFailed("refused".into()));
        assert_eq!(offline.category(), ErrorCategory::StoreUnavailable);
        assert_eq!(offline.exit_code(), 75);

        assert_eq!(CliError::Seed("missing".into()).exit_code(), 70);
    }
}
