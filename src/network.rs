//! Cluster selection and per-cluster defaults.

use std::fmt;
use std::str::FromStr;

use solana_pubkey::Pubkey;

use crate::program::constants::{
    ZO_DEX_PROGRAM_ID_DEVNET, ZO_DEX_PROGRAM_ID_MAINNET, ZO_PROGRAM_ID_DEVNET,
    ZO_PROGRAM_ID_MAINNET, ZO_STATE_DEVNET, ZO_STATE_MAINNET,
};

/// Default RPC URL for devnet.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Default RPC URL for mainnet.
pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Ledger cluster the gateway trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Devnet,
    Mainnet,
}

impl Cluster {
    /// Default JSON-RPC endpoint.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => DEVNET_RPC_URL,
            Cluster::Mainnet => MAINNET_RPC_URL,
        }
    }

    /// Program and account keys deployed on this cluster.
    pub fn program_keys(&self) -> ProgramKeys {
        match self {
            Cluster::Devnet => ProgramKeys {
                program_id: *ZO_PROGRAM_ID_DEVNET,
                dex_program: *ZO_DEX_PROGRAM_ID_DEVNET,
                state: *ZO_STATE_DEVNET,
            },
            Cluster::Mainnet => ProgramKeys {
                program_id: *ZO_PROGRAM_ID_MAINNET,
                dex_program: *ZO_DEX_PROGRAM_ID_MAINNET,
                state: *ZO_STATE_MAINNET,
            },
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Devnet => write!(f, "devnet"),
            Cluster::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// `DEPLOY_MODE` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Devnet,
    Prod,
}

impl DeployMode {
    pub fn cluster(&self) -> Cluster {
        match self {
            DeployMode::Devnet => Cluster::Devnet,
            DeployMode::Prod => Cluster::Mainnet,
        }
    }
}

impl FromStr for DeployMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(DeployMode::Devnet),
            "prod" => Ok(DeployMode::Prod),
            other => Err(format!("Unknown cluster: {other}")),
        }
    }
}

/// Program ids and the global state account of one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramKeys {
    pub program_id: Pubkey,
    pub dex_program: Pubkey,
    pub state: Pubkey,
}

/// Websocket URL matching an RPC URL (`http` → `ws`, `https` → `wss`).
pub fn ws_url_for(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rpc_url.to_string()
    }
}
