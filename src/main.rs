use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use zo_gateway::api::{MarketDataClient, RetryConfig};
use zo_gateway::config::Settings;
use zo_gateway::logging;
use zo_gateway::program::client::RpcLedger;
use zo_gateway::server::{self, AppState};
use zo_gateway::session::Session;
use zo_gateway::snapshot::ListenerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    let _log_guard = logging::init(settings.log_format, settings.log_dir.as_deref().map(Path::new))
        .context("initialising logging")?;

    tracing::info!(
        env = %settings.node_env,
        cluster = %settings.cluster,
        rpc = %settings.rpc_url,
        "Starting gateway"
    );

    let ledger = Arc::new(RpcLedger::with_options(
        &settings.rpc_url,
        settings.commitment,
        settings.skip_preflight,
    ));
    let (session, accounts) = Session::bootstrap(
        settings.keypair.clone(),
        settings.cluster.program_keys(),
        ledger,
        settings.confirm.clone(),
    )
    .await
    .context("loading margin account")?;

    let listener_config = ListenerConfig {
        commitment: settings.commitment_name().to_string(),
        ..ListenerConfig::default()
    };
    let listener = session
        .start_listener(&settings.ws_url, listener_config, accounts)
        .await
        .context("starting account subscription")?;

    let market_data = settings
        .market_data_url
        .as_deref()
        .map(|url| MarketDataClient::builder(url).with_retry(RetryConfig::new(2)).build())
        .transpose()
        .context("building market data client")?;
    if market_data.is_none() {
        tracing::warn!("MARKET_DATA_URL not set; history endpoints will answer 501");
    }

    let state = Arc::new(AppState::new(Arc::new(session), market_data));
    let served = server::serve(state, settings.port).await;

    listener.shutdown().await;
    served.context("serving REST API")
}
