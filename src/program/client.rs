//! Ledger access for the margin program.
//!
//! [`Ledger`] is the seam between the trading layer and the chain: submit a
//! signed transaction, poll its status, read its logs, fetch raw accounts.
//! [`RpcLedger`] implements it over the nonblocking Solana RPC client.

use async_trait::async_trait;
use serde_json::{json, Value};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_commitment_config::CommitmentConfig;
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

use crate::program::error::{SdkError, SdkResult};

/// Status of a submitted transaction as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet visible at the requested commitment
    Pending,
    /// Included and executed successfully
    Succeeded,
    /// Included but the program returned an error
    Failed(String),
}

/// Operations the gateway needs from the ledger
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Recent blockhash for signing.
    async fn latest_blockhash(&self) -> SdkResult<Hash>;

    /// Submit a signed transaction. A refusal is `SdkError::Rejected` with the ledger's detail.
    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature>;

    /// Current status of a submitted transaction.
    async fn signature_status(&self, signature: &Signature) -> SdkResult<SignatureStatus>;

    /// Log lines of a confirmed transaction, `None` while not yet retrievable.
    async fn transaction_logs(&self, signature: &Signature) -> SdkResult<Option<Vec<String>>>;

    /// Raw account data, `None` when the account does not exist.
    async fn account_data(&self, pubkey: &Pubkey) -> SdkResult<Option<Vec<u8>>>;
}

/// Ledger backed by a Solana JSON-RPC endpoint.
pub struct RpcLedger {
    /// RPC client for Solana
    pub rpc_client: RpcClient,
    commitment: CommitmentConfig,
    skip_preflight: bool,
}

impl RpcLedger {
    /// Create a ledger client at `confirmed` commitment.
    pub fn new(rpc_url: &str) -> Self {
        Self::with_options(rpc_url, CommitmentConfig::confirmed(), false)
    }

    /// Create a ledger client with explicit commitment and preflight settings.
    pub fn with_options(rpc_url: &str, commitment: CommitmentConfig, skip_preflight: bool) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
            skip_preflight,
        }
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }
}

/// Errors that carry the ledger's verdict on a transaction rather than a transport failure.
fn classify_send_error(err: ClientError) -> SdkError {
    match err.kind() {
        ClientErrorKind::RpcError(_) | ClientErrorKind::TransactionError(_) => {
            SdkError::Rejected(err.to_string())
        }
        _ => SdkError::Rpc(err),
    }
}

fn commitment_name(commitment: &CommitmentConfig) -> &'static str {
    if commitment.is_finalized() {
        "finalized"
    } else if commitment.is_confirmed() {
        "confirmed"
    } else {
        "processed"
    }
}

/// Pull `meta.logMessages` out of a `getTransaction` response.
fn extract_log_messages(value: &Value) -> Option<Vec<String>> {
    if value.is_null() {
        return None;
    }
    let logs = value.get("meta")?.get("logMessages")?.as_array()?;
    Some(
        logs.iter()
            .filter_map(|line| line.as_str().map(str::to_string))
            .collect(),
    )
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn latest_blockhash(&self) -> SdkResult<Hash> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .map_err(SdkError::Rpc)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: self.skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        self.rpc_client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(classify_send_error)
    }

    async fn signature_status(&self, signature: &Signature) -> SdkResult<SignatureStatus> {
        let status = self
            .rpc_client
            .get_signature_status_with_commitment(signature, self.commitment)
            .await?;
        Ok(match status {
            None => SignatureStatus::Pending,
            Some(Ok(())) => SignatureStatus::Succeeded,
            Some(Err(e)) => SignatureStatus::Failed(e.to_string()),
        })
    }

    async fn transaction_logs(&self, signature: &Signature) -> SdkResult<Option<Vec<String>>> {
        let params = json!([
            signature.to_string(),
            {
                "encoding": "json",
                "commitment": commitment_name(&self.commitment),
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let value: Value = self
            .rpc_client
            .send(RpcRequest::GetTransaction, params)
            .await?;
        Ok(extract_log_messages(&value))
    }

    async fn account_data(&self, pubkey: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(pubkey, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let ledger = RpcLedger::new("https://api.devnet.solana.com");
        assert_eq!(ledger.commitment(), CommitmentConfig::confirmed());
        assert!(!ledger.skip_preflight);
    }

    #[test]
    fn test_extract_log_messages() {
        let value = json!({
            "slot": 5,
            "meta": {
                "err": null,
                "logMessages": ["Program log: a", "Program data: AAAA"]
            }
        });
        assert_eq!(
            extract_log_messages(&value),
            Some(vec!["Program log: a".to_string(), "Program data: AAAA".to_string()])
        );
    }

    #[test]
    fn test_extract_log_messages_not_found() {
        assert_eq!(extract_log_messages(&Value::Null), None);
        assert_eq!(extract_log_messages(&json!({"meta": {}})), None);
    }
}
