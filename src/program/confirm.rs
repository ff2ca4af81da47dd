//! Transaction submission and confirmation.
//!
//! Every submitted transaction walks `Built → Submitted → {Confirmed,
//! TimedOut, Rejected}`. Polling uses exponential backoff with jitter and a
//! fixed attempt budget. A timeout means the outcome is unknown: the
//! transaction may still land, so callers must treat it as retryable and
//! never as failed.

use std::time::Duration;

use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::program::client::{Ledger, SignatureStatus};
use crate::program::error::{SdkError, SdkResult};
use crate::program::events::EventStream;

/// Confirmation polling configuration.
#[derive(Debug, Clone)]
pub struct ConfirmConfig {
    /// Status polls before giving up
    pub max_attempts: u32,
    /// Base delay between polls (ms)
    pub base_delay_ms: u64,
    /// Maximum delay between polls (ms)
    pub max_delay_ms: u64,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            base_delay_ms: 400,
            max_delay_ms: 2_000,
        }
    }
}

impl ConfirmConfig {
    /// Calculate delay for a given attempt with exponential backoff and jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp_delay = self.base_delay_ms.saturating_mul(1 << attempt.min(10));
        let capped_delay = exp_delay.min(self.max_delay_ms);
        // Add jitter: 75-100% of calculated delay
        let jitter_range = capped_delay / 4;
        let jitter = rand::random::<u64>() % (jitter_range + 1);
        Duration::from_millis(capped_delay - jitter_range + jitter)
    }
}

/// Lifecycle of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    Built,
    Submitted(Signature),
    Confirmed(Signature),
    TimedOut(Signature),
    Rejected(String),
}

/// A signed transaction tracked through its lifecycle
pub struct PendingTransaction {
    transaction: Transaction,
    state: TxState,
}

impl PendingTransaction {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            state: TxState::Built,
        }
    }

    pub fn state(&self) -> &TxState {
        &self.state
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// `Built → Submitted`, or `Built → Rejected` when the ledger refuses it.
    pub async fn submit(&mut self, ledger: &dyn Ledger) -> SdkResult<Signature> {
        if !matches!(self.state, TxState::Built) {
            return Err(SdkError::Serialization(format!(
                "transaction already submitted ({:?})",
                self.state
            )));
        }
        match ledger.send_transaction(&self.transaction).await {
            Ok(signature) => {
                tracing::debug!(%signature, "Transaction submitted");
                self.state = TxState::Submitted(signature);
                Ok(signature)
            }
            Err(SdkError::Rejected(detail)) => {
                tracing::info!(%detail, "Transaction rejected before inclusion");
                self.state = TxState::Rejected(detail.clone());
                Err(SdkError::Rejected(detail))
            }
            Err(e) => Err(e),
        }
    }

    /// `Submitted → Confirmed | TimedOut | Rejected`.
    pub async fn await_confirmation(
        &mut self,
        ledger: &dyn Ledger,
        config: &ConfirmConfig,
    ) -> SdkResult<Signature> {
        let signature = match &self.state {
            TxState::Submitted(signature) => *signature,
            TxState::Confirmed(signature) => return Ok(*signature),
            other => {
                return Err(SdkError::Serialization(format!(
                    "transaction not awaiting confirmation ({:?})",
                    other
                )))
            }
        };

        for attempt in 0..config.max_attempts {
            match ledger.signature_status(&signature).await {
                Ok(SignatureStatus::Succeeded) => {
                    tracing::debug!(%signature, attempt = attempt + 1, "Transaction confirmed");
                    self.state = TxState::Confirmed(signature);
                    return Ok(signature);
                }
                Ok(SignatureStatus::Failed(detail)) => {
                    tracing::info!(%signature, %detail, "Transaction failed on chain");
                    self.state = TxState::Rejected(detail.clone());
                    return Err(SdkError::Rejected(detail));
                }
                Ok(SignatureStatus::Pending) => {}
                Err(e) => {
                    tracing::debug!(%signature, attempt = attempt + 1, error = %e, "Status poll failed");
                }
            }

            if attempt + 1 < config.max_attempts {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    %signature,
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Awaiting confirmation"
                );
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(%signature, attempts = config.max_attempts, "Confirmation timed out");
        self.state = TxState::TimedOut(signature);
        Err(SdkError::ConfirmationTimeout {
            signature: signature.to_string(),
            attempts: config.max_attempts,
        })
    }
}

/// A confirmed transaction and its log output
#[derive(Debug, Clone)]
pub struct ConfirmedTransaction {
    pub signature: Signature,
    pub logs: Vec<String>,
}

impl ConfirmedTransaction {
    /// Events emitted by the transaction, in order.
    pub fn events(&self) -> EventStream<'_> {
        EventStream::new(&self.logs)
    }
}

/// Submit, confirm and fetch the logs of a transaction.
pub async fn submit_and_confirm(
    ledger: &dyn Ledger,
    transaction: Transaction,
    config: &ConfirmConfig,
) -> SdkResult<ConfirmedTransaction> {
    let mut pending = PendingTransaction::new(transaction);
    pending.submit(ledger).await?;
    let signature = pending.await_confirmation(ledger, config).await?;
    let logs = fetch_logs(ledger, &signature, config).await?;
    Ok(ConfirmedTransaction { signature, logs })
}

/// Logs can trail the status by a few slots on some RPC nodes.
async fn fetch_logs(
    ledger: &dyn Ledger,
    signature: &Signature,
    config: &ConfirmConfig,
) -> SdkResult<Vec<String>> {
    for attempt in 0..config.max_attempts {
        match ledger.transaction_logs(signature).await {
            Ok(Some(logs)) => return Ok(logs),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(%signature, attempt = attempt + 1, error = %e, "Log fetch failed");
            }
        }
        if attempt + 1 < config.max_attempts {
            tokio::time::sleep(config.delay_for_attempt(attempt)).await;
        }
    }
    tracing::warn!(%signature, attempts = config.max_attempts, "Confirmed transaction has no logs");
    Err(SdkError::LogsUnavailable {
        signature: signature.to_string(),
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::mock::{MockLedger, MockOutcome};
    use solana_hash::Hash;
    use solana_instruction::Instruction;
    use solana_keypair::Keypair;
    use solana_pubkey::Pubkey;
    use solana_signer::Signer;

    fn fast_config() -> ConfirmConfig {
        ConfirmConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    fn signed_tx() -> Transaction {
        let payer = Keypair::new();
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![1, 2, 3],
        };
        Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[&payer], Hash::default())
    }

    #[test]
    fn test_config_default() {
        let config = ConfirmConfig::default();
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.base_delay_ms, 400);
        assert_eq!(config.max_delay_ms, 2_000);
    }

    #[test]
    fn test_delay_capped_with_jitter() {
        let config = ConfirmConfig::default();
        for attempt in 0..20 {
            let delay = config.delay_for_attempt(attempt).as_millis() as u64;
            assert!(delay <= config.max_delay_ms);
            assert!(delay >= config.base_delay_ms * 3 / 4);
        }
    }

    #[tokio::test]
    async fn test_confirmed_path() {
        let ledger = MockLedger::new(|_| MockOutcome::Land {
            logs: vec!["Program log: ok".to_string()],
        });
        let mut pending = PendingTransaction::new(signed_tx());
        assert_eq!(pending.state(), &TxState::Built);

        let signature = pending.submit(&ledger).await.unwrap();
        assert_eq!(pending.state(), &TxState::Submitted(signature));

        pending.await_confirmation(&ledger, &fast_config()).await.unwrap();
        assert_eq!(pending.state(), &TxState::Confirmed(signature));
    }

    #[tokio::test]
    async fn test_rejected_before_inclusion() {
        let ledger = MockLedger::new(|_| MockOutcome::Reject("insufficient funds".to_string()));
        let mut pending = PendingTransaction::new(signed_tx());

        let err = pending.submit(&ledger).await.unwrap_err();
        assert!(matches!(err, SdkError::Rejected(ref d) if d == "insufficient funds"));
        assert_eq!(pending.state(), &TxState::Rejected("insufficient funds".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_and_retryable() {
        let ledger = MockLedger::new(|_| MockOutcome::NeverConfirm);
        let mut pending = PendingTransaction::new(signed_tx());
        let signature = pending.submit(&ledger).await.unwrap();

        let err = pending
            .await_confirmation(&ledger, &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::ConfirmationTimeout { attempts: 3, .. }));
        assert!(err.is_retryable());
        assert_eq!(pending.state(), &TxState::TimedOut(signature));
        assert_eq!(ledger.status_polls(), 3);
    }

    #[tokio::test]
    async fn test_failed_on_chain_is_rejection() {
        let ledger = MockLedger::new(|_| MockOutcome::LandFailed("custom program error: 0x1".to_string()));
        let err = submit_and_confirm(&ledger, signed_tx(), &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Rejected(ref d) if d.contains("0x1")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_submit_and_confirm_returns_logs() {
        let ledger = MockLedger::new(|_| MockOutcome::Land {
            logs: vec!["Program log: hello".to_string()],
        });
        let confirmed = submit_and_confirm(&ledger, signed_tx(), &fast_config())
            .await
            .unwrap();
        assert_eq!(confirmed.logs, vec!["Program log: hello".to_string()]);
        assert_eq!(ledger.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_without_logs_is_not_a_timeout() {
        let ledger = MockLedger::new(|_| MockOutcome::LandWithoutLogs);
        let err = submit_and_confirm(&ledger, signed_tx(), &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::LogsUnavailable { attempts: 3, .. }));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("confirmed"));
    }

    #[tokio::test]
    async fn test_unreachable_node_stays_built() {
        let ledger = MockLedger::new(|_| MockOutcome::Unreachable("connection refused".to_string()));
        let mut pending = PendingTransaction::new(signed_tx());

        let err = pending.submit(&ledger).await.unwrap_err();
        assert!(matches!(err, SdkError::Rpc(_)));
        assert!(err.is_retryable());
        assert_eq!(pending.state(), &TxState::Built);
    }

    #[tokio::test]
    async fn test_double_submit_refused() {
        let ledger = MockLedger::new(|_| MockOutcome::NeverConfirm);
        let mut pending = PendingTransaction::new(signed_tx());
        pending.submit(&ledger).await.unwrap();
        assert!(pending.submit(&ledger).await.is_err());
        assert_eq!(ledger.submitted().len(), 1);
    }
}
