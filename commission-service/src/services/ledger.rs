//! Ledger write path: idempotent appends under optimistic concurrency.
//!
//! Every write is read, mutate, save-if-version-unchanged; a lost race
//! reloads and tries again. The transaction append and the statistics
//! recomputation are two sequential versioned writes, never interleaved.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::metrics::APPENDS_TOTAL;
use super::store::AccountStore;
use crate::error::LedgerError;
use crate::models::{CommissionTransaction, EngineerAccount, NewTransaction};

/// Retry policy for versioned writes.
#[derive(Debug, Clone, Copy)]
pub struct AppendPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for AppendPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Appended(CommissionTransaction),
    /// The transaction id was already in the log; nothing was written.
    Duplicate,
}

#[derive(Clone)]
pub struct LedgerWriter {
    accounts: Arc<dyn AccountStore>,
    policy: AppendPolicy,
}

impl LedgerWriter {
    pub fn new(accounts: Arc<dyn AccountStore>, policy: AppendPolicy) -> Self {
        Self { accounts, policy }
    }

    /// Create the account if it does not exist yet. Returns the stored one.
    #[instrument(skip(self, name, phone), fields(engineer_id = %engineer_id))]
    pub async fn open_account(
        &self,
        engineer_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<EngineerAccount, LedgerError> {
        if let Some(existing) = self.accounts.find_one(engineer_id).await? {
            return Ok(existing);
        }

        let account = EngineerAccount::open(engineer_id, name, phone);
        if self.accounts.insert(&account).await? {
            info!("Engineer account opened");
            return Ok(account);
        }

        // Lost a creation race; the winner's copy is authoritative.
        self.accounts
            .find_one(engineer_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(engineer_id.to_string()))
    }

    /// Append `input` to the account, then refresh its statistics.
    ///
    /// Once the append is saved the outcome is `Appended` even if the
    /// statistics write fails; a later replay of the same id repairs them.
    #[instrument(skip(self, input), fields(engineer_id = %engineer_id, transaction_id = %input.transaction_id))]
    pub async fn append_transaction(
        &self,
        engineer_id: &str,
        input: NewTransaction,
    ) -> Result<AppendOutcome, LedgerError> {
        let mut stale_statistics = false;
        let appended = self
            .write_versioned(engineer_id, |account| match account.append(input.clone()) {
                Ok(tx) => Ok(Some(tx.clone())),
                Err(LedgerError::DuplicateTransaction(_)) => {
                    stale_statistics = !account.statistics_current();
                    Ok(None)
                }
                Err(e) => Err(e),
            })
            .await;

        let tx = match appended {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                APPENDS_TOTAL.with_label_values(&["duplicate"]).inc();
                info!("Duplicate transaction replay ignored");
                if stale_statistics {
                    info!("Repairing statistics left behind by an earlier append");
                    self.refresh_statistics(engineer_id).await?;
                }
                return Ok(AppendOutcome::Duplicate);
            }
            Err(e) => {
                let outcome = match e {
                    LedgerError::VersionConflict { .. } => "conflict",
                    _ => "error",
                };
                APPENDS_TOTAL.with_label_values(&[outcome]).inc();
                return Err(e);
            }
        };

        if let Err(e) = self.refresh_statistics(engineer_id).await {
            warn!(error = %e, "Statistics refresh failed after append; left for the next write");
        }

        APPENDS_TOTAL.with_label_values(&["appended"]).inc();
        info!(
            transaction_type = %tx.transaction_type,
            amount = %tx.amount,
            "Transaction appended"
        );

        Ok(AppendOutcome::Appended(tx))
    }

    /// Recompute cached statistics from the full log and save them.
    #[instrument(skip(self), fields(engineer_id = %engineer_id))]
    pub async fn refresh_statistics(&self, engineer_id: &str) -> Result<(), LedgerError> {
        self.write_versioned(engineer_id, |account| {
            account.recompute_statistics();
            Ok(Some(()))
        })
        .await
        .map(|_| ())
    }

    /// Load, apply `mutate`, and save with a version check, retrying on
    /// conflict. `mutate` returning `None` means there is nothing to save.
    async fn write_versioned<T, F>(
        &self,
        engineer_id: &str,
        mut mutate: F,
    ) -> Result<Option<T>, LedgerError>
    where
        F: FnMut(&mut EngineerAccount) -> Result<Option<T>, LedgerError>,
    {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let mut account = self
                .accounts
                .find_one(engineer_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(engineer_id.to_string()))?;

            let output = match mutate(&mut account)? {
                Some(output) => output,
                None => return Ok(None),
            };

            if self.accounts.replace_versioned(&account).await? {
                return Ok(Some(output));
            }

            warn!(attempt, version = account.version, "Version conflict, retrying");
            if attempt < attempts {
                tokio::time::sleep(self.policy.backoff * attempt).await;
            }
        }

        Err(LedgerError::VersionConflict {
            engineer_id: engineer_id.to_string(),
            attempts,
        })
    }
}
