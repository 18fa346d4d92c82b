mod auth;
mod chat;
mod console;
mod error;
mod presence;
mod state;
mod store;
mod user;

use anyhow::Context;
use console::run_console;
use presence::PresenceSimulator;
use rand::{rngs::StdRng, SeedableRng};
use state::{AppState, Config};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing; stdout carries the console protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,topgram=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    // Create application state
    let state = AppState::new(config.clone());
    tracing::info!(
        policy = %state.user_repository.policy(),
        demo_password = config.demo_password.is_some(),
        "Store initialised"
    );

    if config.seed_demo_users {
        state
            .user_repository
            .seed_demo_users()
            .await
            .context("Failed to seed demo users")?;
    }

    // Start presence simulator
    let presence = PresenceSimulator::new(
        state.user_repository.clone(),
        StdRng::from_os_rng(),
        config.presence_online_probability,
    )
    .spawn(config.presence_interval);

    tracing::info!("Topgram console ready, one JSON command per line on stdin");

    let console = run_console(
        state.clone(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );

    tokio::select! {
        _ = console => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, shutting down"),
    }

    presence.shutdown().await;

    if let Some(user) = state.user_repository.current_user().await {
        tracing::info!(username = %user.username, "Session closed while logged in");
    }
    tracing::info!(
        users = state.user_repository.all().await.len(),
        chats = state.chat_repository.count().await,
        "Shutdown complete"
    );

    Ok(())
}
