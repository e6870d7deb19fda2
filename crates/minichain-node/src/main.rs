use clap::Parser;
use minichain_core::{CancelFlag, SharedLedger};
use minichain_node::{build_router, config::Args, AppState};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.miner_config();
    let ledger = SharedLedger::new(config);
    info!(
        difficulty = config.difficulty_bits,
        parallel = config.parallel,
        "ledger initialised with genesis block"
    );

    let state = AppState::new(ledger).with_mine_timeout(args.mine_timeout());
    let shutdown = state.shutdown.clone();
    let app = build_router(state, &args.allowed_origin)?;

    let addr: SocketAddr = args.listen.parse()?;
    info!("minichain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    info!("minichain-node stopped");
    Ok(())
}

async fn shutdown_signal(flag: CancelFlag) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, cancelling proof searches");
    flag.cancel();
}
