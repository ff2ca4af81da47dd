//! Environment-driven settings.
//!
//! `.env.{NODE_ENV}.local` is loaded first when present, then every variable
//! is read through the `config` crate's environment source and validated
//! into [`Settings`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use solana_commitment_config::CommitmentConfig;
use solana_keypair::Keypair;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::network::{ws_url_for, Cluster, DeployMode};
use crate::program::confirm::ConfirmConfig;

const DEFAULT_NODE_ENV: &str = "development";
const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Variables as read, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    node_env: Option<String>,
    deploy_mode: Option<String>,
    port: Option<u16>,
    log_format: Option<String>,
    log_dir: Option<String>,
    secret_key: Option<String>,
    rpc_url: Option<String>,
    ws_url: Option<String>,
    skip_preflight: Option<bool>,
    commitment: Option<String>,
    market_data_url: Option<String>,
    confirm_max_attempts: Option<u32>,
    confirm_base_delay_ms: Option<u64>,
    confirm_max_delay_ms: Option<u64>,
}

/// Validated gateway settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub node_env: String,
    pub cluster: Cluster,
    pub port: u16,
    pub log_format: LogFormat,
    pub log_dir: Option<String>,
    pub keypair: Arc<Keypair>,
    pub rpc_url: String,
    pub ws_url: String,
    pub skip_preflight: bool,
    pub commitment: CommitmentConfig,
    pub market_data_url: Option<String>,
    pub confirm: ConfirmConfig,
}

impl Settings {
    /// Load `.env.{NODE_ENV}.local` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let node_env = std::env::var("NODE_ENV").unwrap_or_else(|_| DEFAULT_NODE_ENV.to_string());
        let env_file = format!(".env.{}.local", node_env);
        match dotenvy::from_filename(&env_file) {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Validation(format!("{}: {}", env_file, e))),
        }
        Self::from_source(config::Environment::default())
    }

    /// Build from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(config::Environment::default().source(Some(vars)))
    }

    fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let deploy_mode: DeployMode = raw
            .deploy_mode
            .as_deref()
            .unwrap_or("devnet")
            .parse()
            .map_err(ConfigError::Validation)?;
        let cluster = deploy_mode.cluster();

        let log_format = raw
            .log_format
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ConfigError::Validation)?
            .unwrap_or_default();

        let secret = raw
            .secret_key
            .ok_or_else(|| ConfigError::Validation("SECRET_KEY is required".to_string()))?;
        let keypair = parse_keypair(&secret)?;

        let rpc_url = raw
            .rpc_url
            .unwrap_or_else(|| cluster.default_rpc_url().to_string());
        let ws_url = raw.ws_url.unwrap_or_else(|| ws_url_for(&rpc_url));

        let commitment = parse_commitment(raw.commitment.as_deref().unwrap_or("confirmed"))?;

        let defaults = ConfirmConfig::default();
        let confirm = ConfirmConfig {
            max_attempts: raw.confirm_max_attempts.unwrap_or(defaults.max_attempts),
            base_delay_ms: raw.confirm_base_delay_ms.unwrap_or(defaults.base_delay_ms),
            max_delay_ms: raw.confirm_max_delay_ms.unwrap_or(defaults.max_delay_ms),
        };
        if confirm.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "CONFIRM_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if confirm.base_delay_ms > confirm.max_delay_ms {
            return Err(ConfigError::Validation(
                "CONFIRM_BASE_DELAY_MS exceeds CONFIRM_MAX_DELAY_MS".to_string(),
            ));
        }

        Ok(Settings {
            node_env: raw.node_env.unwrap_or_else(|| DEFAULT_NODE_ENV.to_string()),
            cluster,
            port: raw.port.unwrap_or(DEFAULT_PORT),
            log_format,
            log_dir: raw.log_dir.filter(|d| !d.is_empty()),
            keypair: Arc::new(keypair),
            rpc_url,
            ws_url,
            skip_preflight: raw.skip_preflight.unwrap_or(false),
            commitment,
            market_data_url: raw.market_data_url.filter(|u| !u.is_empty()),
            confirm,
        })
    }

    /// Commitment name as used by the pubsub API.
    pub fn commitment_name(&self) -> &'static str {
        if self.commitment == CommitmentConfig::processed() {
            "processed"
        } else if self.commitment == CommitmentConfig::finalized() {
            "finalized"
        } else {
            "confirmed"
        }
    }
}

/// Secret key as base58 or as a JSON byte array (`solana-keygen` file format).
pub fn parse_keypair(secret: &str) -> Result<Keypair, ConfigError> {
    let secret = secret.trim();
    let bytes = if secret.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(secret)
            .map_err(|e| ConfigError::Validation(format!("SECRET_KEY is not a byte array: {}", e)))?
    } else {
        bs58::decode(secret)
            .into_vec()
            .map_err(|e| ConfigError::Validation(format!("SECRET_KEY is not base58: {}", e)))?
    };
    Keypair::try_from(bytes.as_slice())
        .map_err(|e| ConfigError::Validation(format!("SECRET_KEY is not a keypair: {}", e)))
}

fn parse_commitment(name: &str) -> Result<CommitmentConfig, ConfigError> {
    match name {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(ConfigError::Validation(format!("Unknown commitment: {}", other))),
    }
}
