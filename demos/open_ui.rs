/// Example: open the desktop app UI and watch liveness transitions.
///
/// Run with: cargo run --example open_ui
use mate_bridge::transport::{ClientOptions, DesktopClient};
use mate_bridge::{commands, config, status};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let (tx, mut rx) = status::channel();
    tokio::spawn(async move {
        while let Ok(state) = rx.recv().await {
            tracing::info!(?state, "app state changed");
        }
    });

    let client = DesktopClient::new(ClientOptions::new(config::DEFAULT_BASE_URL))
        .with_status_channel(tx);

    if !client.check_availability().await {
        anyhow::bail!("desktop app is not reachable at {}", config::DEFAULT_BASE_URL);
    }

    let result = client.send_command(&commands::open_ui()).await?;
    tracing::info!("result: {}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
