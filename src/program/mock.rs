//! In-memory [`Ledger`] for tests and dry runs.
//!
//! Outcomes are scripted per transaction by a closure, so a test can reject
//! one cancel out of many or let a placement land with chosen log lines.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::program::client::{Ledger, SignatureStatus};
use crate::program::error::{SdkError, SdkResult};

/// What happens to a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Refused before inclusion with this detail
    Reject(String),
    /// Lands successfully and emits these log lines
    Land { logs: Vec<String> },
    /// Lands but the program fails with this detail
    LandFailed(String),
    /// Never reaches the requested commitment
    NeverConfirm,
    /// Confirms, but the node never serves its logs
    LandWithoutLogs,
    /// Node cannot be reached; the transaction is never submitted
    Unreachable(String),
}

type OutcomeFn = dyn Fn(&Transaction) -> MockOutcome + Send + Sync;

pub struct MockLedger {
    outcome: Box<OutcomeFn>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    outcomes: Mutex<HashMap<Signature, MockOutcome>>,
    submitted: Mutex<Vec<Transaction>>,
    status_polls: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockLedger {
    pub fn new<F>(outcome: F) -> Self
    where
        F: Fn(&Transaction) -> MockOutcome + Send + Sync + 'static,
    {
        Self {
            outcome: Box::new(outcome),
            accounts: Mutex::new(HashMap::new()),
            outcomes: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            status_polls: AtomicU32::new(0),
        }
    }

    /// Store raw account data.
    pub fn set_account(&self, pubkey: Pubkey, data: Vec<u8>) {
        lock(&self.accounts).insert(pubkey, data);
    }

    /// Transactions accepted or refused so far, in submission order.
    pub fn submitted(&self) -> Vec<Transaction> {
        lock(&self.submitted).clone()
    }

    /// Number of status polls served.
    pub fn status_polls(&self) -> u32 {
        self.status_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn latest_blockhash(&self) -> SdkResult<Hash> {
        Ok(Hash::default())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature> {
        lock(&self.submitted).push(transaction.clone());
        let outcome = (self.outcome)(transaction);
        match outcome {
            MockOutcome::Reject(detail) => return Err(SdkError::Rejected(detail)),
            MockOutcome::Unreachable(detail) => {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, detail);
                return Err(SdkError::Rpc(io.into()));
            }
            _ => {}
        }
        let signature = transaction.signatures.first().copied().unwrap_or_default();
        lock(&self.outcomes).insert(signature, outcome);
        Ok(signature)
    }

    async fn signature_status(&self, signature: &Signature) -> SdkResult<SignatureStatus> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        Ok(match lock(&self.outcomes).get(signature) {
            Some(MockOutcome::Land { .. } | MockOutcome::LandWithoutLogs) => SignatureStatus::Succeeded,
            Some(MockOutcome::LandFailed(detail)) => SignatureStatus::Failed(detail.clone()),
            _ => SignatureStatus::Pending,
        })
    }

    async fn transaction_logs(&self, signature: &Signature) -> SdkResult<Option<Vec<String>>> {
        Ok(match lock(&self.outcomes).get(signature) {
            Some(MockOutcome::Land { logs }) => Some(logs.clone()),
            _ => None,
        })
    }

    async fn account_data(&self, pubkey: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        Ok(lock(&self.accounts).get(pubkey).cloned())
    }
}
