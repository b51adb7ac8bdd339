//! Domain errors for the commission ledger.

use rust_decimal::Decimal;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Engineer account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction '{0}' already recorded")]
    DuplicateTransaction(String),

    #[error("Transaction amount must not be negative (got {0})")]
    InvalidAmount(Decimal),

    #[error("Concurrent update to account '{engineer_id}' after {attempts} attempts")]
    VersionConflict { engineer_id: String, attempts: u32 },

    #[error(transparent)]
    Store(#[from] AppError),
}

impl LedgerError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPeriod(_) => "invalid_period",
            Self::InvalidDateRange(_) => "invalid_date_range",
            Self::AccountNotFound(_) => "account_not_found",
            Self::DuplicateTransaction(_) => "duplicate_transaction",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::VersionConflict { .. } => "version_conflict",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidPeriod(_)
            | LedgerError::InvalidDateRange(_)
            | LedgerError::InvalidAmount(_) => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            LedgerError::AccountNotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            LedgerError::DuplicateTransaction(_) | LedgerError::VersionConflict { .. } => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            LedgerError::Store(inner) => inner,
        }
    }
}
