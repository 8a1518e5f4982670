use std::sync::Arc;

use log::info;

use ledger_client::{MemoryLedger, MemoryWallet};
use snapchain_log::{LogViewConfig, MessageLogView, MessagePoster, NetworkConfig, TextRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let network = NetworkConfig::from_env()?;
    info!(
        "using contract {} ({}) via {}",
        network.contract_id, network.network_passphrase, network.rpc_url
    );

    // Everything below runs against an in-memory ledger.
    let ledger = Arc::new(MemoryLedger::new(&network.contract_id));
    let wallet = Arc::new(MemoryWallet::new());
    wallet.add_key("alice-key", "GALICE")?;
    wallet.add_key("bob-key", "GBOB")?;
    let poster = MessagePoster::new(ledger.clone(), wallet, ledger.clone());

    let view = MessageLogView::new(ledger.clone(), &network.contract_id, LogViewConfig::default())?;
    let renderer = TextRenderer::new().with_local_time();

    view.refresh().await?;
    println!("{}\n", view.render_with(&renderer).await);

    view.send_message(&poster, "Hi!", "GALICE", "alice-key").await?;
    view.send_message(&poster, "Hi Alice!", "GBOB", "bob-key").await?;
    ledger.advance(120)?;
    let report = view
        .send_message(&poster, "Anyone else here?", "GALICE", "alice-key")
        .await?;
    info!(
        "{} messages, latest ledger {:?}",
        report.view.len(),
        report.view.latest_ledger_height
    );

    println!("{}", view.render_with(&renderer).await);

    view.shutdown();
    Ok(())
}
