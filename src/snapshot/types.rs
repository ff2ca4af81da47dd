//! JSON-RPC messages of the ledger's account subscription channel.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_pubkey::Pubkey;

// ============================================================================
// REQUEST TYPES (Client → Node)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl RpcRequest {
    /// `accountSubscribe` with base64 encoding at the given commitment.
    pub fn account_subscribe(id: u64, pubkey: &Pubkey, commitment: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: "accountSubscribe",
            params: serde_json::json!([
                pubkey.to_string(),
                { "encoding": "base64", "commitment": commitment }
            ]),
        }
    }

    pub fn account_unsubscribe(id: u64, subscription: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: "accountUnsubscribe",
            params: serde_json::json!([subscription]),
        }
    }
}

// ============================================================================
// RESPONSE TYPES (Node → Client)
// ============================================================================

/// Any message the node sends on the channel
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
    Notification(AccountNotification),
    Response(RpcResponse),
}

/// Reply to a request, carrying the subscription id or an error
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountNotification {
    pub method: String,
    pub params: NotificationParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    pub subscription: u64,
    pub result: NotificationResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationResult {
    pub context: NotificationContext,
    pub value: AccountValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationContext {
    pub slot: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountValue {
    /// `[payload, encoding]`
    pub data: (String, String),
    #[serde(default)]
    pub lamports: u64,
    #[serde(default)]
    pub owner: String,
}

impl AccountValue {
    /// Raw account bytes. Only base64 payloads are accepted.
    pub fn decode(&self) -> Result<Vec<u8>, String> {
        let (payload, encoding) = &self.data;
        if encoding != "base64" {
            return Err(format!("unsupported account encoding: {encoding}"));
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| e.to_string())
    }
}
