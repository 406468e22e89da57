use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::filter::EnvFilter;

use reviewbot::bot::event::BotEvent;
use reviewbot::bot::{create_bot_process, BotState};
use reviewbot::github::api::client::GithubRepositoryClient;
use reviewbot::github::server::{create_app, ServerState};
use reviewbot::github::GithubAppState;

#[derive(clap::Parser)]
struct Opts {
    /// Github App ID.
    #[arg(long, env = "APP_ID")]
    app_id: u64,

    /// Private key used to authenticate as a Github App.
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Port on which the webhook server listens.
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// How often (in seconds) should open pull requests be re-checked.
    #[arg(long, env = "REFRESH_INTERVAL", default_value = "86400")]
    refresh_interval: u64,
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn refresh_timer(tx: mpsc::Sender<BotEvent>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick finishes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        if tx.send(BotEvent::Refresh).await.is_err() {
            tracing::error!("Cannot send refresh event, the bot process has ended");
            return;
        }
    }
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let state = runtime.block_on(GithubAppState::load(
        opts.app_id.into(),
        opts.private_key.into_bytes().into(),
    ))?;
    let state: Arc<dyn BotState<GithubRepositoryClient>> = Arc::new(state);
    let (tx, bot_process) = create_bot_process(state);

    let refresh_process = refresh_timer(tx.clone(), Duration::from_secs(opts.refresh_interval));
    let server_process = server(ServerState::new(tx), opts.port);

    runtime.block_on(async move {
        tokio::select! {
            () = bot_process => {
                tracing::warn!("Bot process has ended");
                Ok(())
            },
            () = refresh_process => {
                tracing::warn!("Refresh process has ended");
                Ok(())
            }
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })?;

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
