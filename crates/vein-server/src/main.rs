//! Vein server binary.
//!
//! Wires the account store, session registry, accrual engine and periodic
//! reconciler together, then runs the Telegram bot and the HTTP surface in
//! the same process.

mod bot;
mod challenge_store;
mod http;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vein_application::{BoostService, MiningService, Reconciler};
use vein_core::account::AccountRepository;
use vein_core::accrual::AccrualEngine;
use vein_core::session::SessionRegistry;
use vein_infrastructure::{RetryPolicy, Settings, TomlAccountRepository, retry_with_backoff};

use crate::challenge_store::ChallengeStore;

#[derive(Parser, Debug)]
#[command(name = "vein", version, about = "Promotional mining simulator backend")]
struct Args {
    /// Path to the configuration file (defaults to ~/.config/vein/config.toml)
    #[arg(long, env = "VEIN_CONFIG")]
    config: Option<PathBuf>,
    /// Directory holding account records
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Run only the HTTP surface, without the Telegram bot
    #[arg(long)]
    no_bot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = Some(data_dir);
    }

    let data_dir = settings.data_dir()?;
    tracing::info!(data_dir = %data_dir.display(), "opening account store");
    let repository: Arc<dyn AccountRepository> = Arc::new(
        retry_with_backoff(&RetryPolicy::default(), "open account store", || {
            TomlAccountRepository::new(&data_dir)
        })
        .await
        .context("opening account store")?,
    );

    let registry = Arc::new(SessionRegistry::new());
    let engine = Arc::new(AccrualEngine::with_base_rate(
        repository.clone(),
        settings.mining.base_rate_per_minute,
    ));
    let mining = Arc::new(MiningService::new(
        registry.clone(),
        engine.clone(),
        repository.clone(),
    ));
    let boost = Arc::new(BoostService::new(repository.clone()));

    let reconciler = Arc::new(Reconciler::new(
        registry,
        engine,
        Duration::from_secs(settings.mining.reconcile_interval_secs),
    ));
    let _sweep = reconciler.spawn();

    let challenge_ttl = chrono::Duration::seconds(settings.mining.challenge_ttl_secs as i64);
    let api_state = http::ApiState {
        mining: mining.clone(),
        boost: boost.clone(),
        repository,
        challenges: Arc::new(ChallengeStore::new(challenge_ttl)),
    };
    let http_addr = settings.http_addr.clone();
    let static_dir = settings.static_dir.clone();
    let http_task = tokio::spawn(async move { http::serve(&http_addr, api_state, static_dir).await });

    if args.no_bot {
        http_task.await??;
    } else {
        let token = settings.bot_token()?.to_string();
        let state = Arc::new(bot::BotState::new(mining, boost, challenge_ttl));
        bot::run(token, state).await;
    }

    Ok(())
}
