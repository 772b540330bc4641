// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

use std::path::PathBuf;

use alloy_primitives::Address;
use anyhow::Context;
use async_trait::async_trait;
use autosend_engine::{Command, ConfigStore, EngineState, Scheduler, TokenStore, TransferEngine};
use autosend_provider::{BundlerApi, EvmReader, IdentityApi, TransportSelector};
use autosend_types::ChainSpec;
use autosend_utils::emit::{receive_and_log_events, EVENT_CHANNEL_CAPACITY};
use clap::{Args, Parser};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use ::tracing::info;

use crate::task::{run_task_with_shutdown, Task};

mod inputs;
mod tracing;

/// Automated native-token transfers through ERC-4337 smart wallets.
#[derive(Debug, Parser)]
#[command(name = "autosend", version)]
pub struct Cli {
    #[command(flatten)]
    chain: ChainArgs,

    #[command(flatten)]
    files: FileArgs,

    #[command(flatten)]
    logs: LogsArgs,

    /// Begin auto-transfer passes immediately
    #[arg(long)]
    start: bool,

    /// Log in every account without a cached session before anything else
    #[arg(long)]
    activate: bool,

    /// Override the configured pass limit (0 = unlimited)
    #[arg(long)]
    iterations: Option<u32>,

    /// Override the delay between accounts within a pass, in seconds
    #[arg(long = "account-delay")]
    account_delay: Option<u64>,
}

/// Chain endpoints and constants. Defaults target the Incentiv testnet.
#[derive(Debug, Args)]
struct ChainArgs {
    #[arg(long = "chain.id", name = "chain.id", env = "CHAIN_ID")]
    chain_id: Option<u64>,

    #[arg(long = "chain.rpc_url", name = "chain.rpc_url", env = "RPC_URL")]
    rpc_url: Option<String>,

    #[arg(
        long = "chain.bundler_url",
        name = "chain.bundler_url",
        env = "BUNDLER_URL"
    )]
    bundler_url: Option<String>,

    #[arg(long = "chain.api_url", name = "chain.api_url", env = "API_URL")]
    api_url: Option<String>,

    #[arg(
        long = "chain.entry_point",
        name = "chain.entry_point",
        env = "ENTRY_POINT"
    )]
    entry_point: Option<Address>,
}

impl ChainArgs {
    fn apply(&self, spec: &mut ChainSpec) {
        if let Some(chain_id) = self.chain_id {
            spec.chain_id = chain_id;
        }
        if let Some(rpc_url) = &self.rpc_url {
            spec.rpc_url = rpc_url.clone();
        }
        if let Some(bundler_url) = &self.bundler_url {
            spec.bundler_url = bundler_url.clone();
        }
        if let Some(api_url) = &self.api_url {
            spec.api_url = api_url.clone();
        }
        if let Some(entry_point) = self.entry_point {
            spec.entry_point = entry_point;
        }
    }
}

/// Input and state files, compatible with the original document layouts.
#[derive(Debug, Args)]
struct FileArgs {
    /// Private keys, one per line
    #[arg(long, default_value = "pk.txt")]
    keys: PathBuf,

    /// Recipient addresses, one per line
    #[arg(long, default_value = "wallet.txt")]
    recipients: PathBuf,

    /// Proxy URLs, one per line (optional)
    #[arg(long, default_value = "proxy.txt")]
    proxies: PathBuf,

    /// Transfer settings document
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Session cache document
    #[arg(long, default_value = "token.js")]
    tokens: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct LogsArgs {
    /// Log file; stdout when not provided
    #[arg(long = "log.file", name = "log.file", env = "LOG_FILE")]
    file: Option<String>,

    /// Write logs as JSON
    #[arg(long = "log.json", name = "log.json", env = "LOG_JSON")]
    json: bool,
}

struct SchedulerTask<E, B, I> {
    scheduler: Scheduler<E, B, I>,
    commands: mpsc::Receiver<Command>,
}

#[async_trait]
impl<E, B, I> Task for SchedulerTask<E, B, I>
where
    E: EvmReader,
    B: BundlerApi,
    I: IdentityApi,
{
    async fn run(self: Box<Self>, shutdown_token: CancellationToken) -> anyhow::Result<()> {
        let _ = self.scheduler.run(self.commands, shutdown_token).await;
        Ok(())
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = tracing::configure_logging(&cli.logs)?;

    let mut chain = ChainSpec::default();
    cli.chain.apply(&mut chain);
    info!(
        "targeting chain {} via {} (bundler {})",
        chain.chain_id, chain.rpc_url, chain.bundler_url
    );

    let config_store = ConfigStore::new(&cli.files.config);
    let mut config = config_store.load()?;
    if let Some(iterations) = cli.iterations {
        config.max_iterations = iterations;
    }
    if let Some(delay) = cli.account_delay {
        config.account_delay_secs = delay;
    }
    config.validate()?;

    let token_store = TokenStore::load(&cli.files.tokens)?;
    let accounts = inputs::load_accounts(&cli.files.keys, &token_store)?;
    let recipients = inputs::load_recipients(&cli.files.recipients)?;
    let proxies = inputs::load_proxies(&cli.files.proxies);

    let transports =
        TransportSelector::from_chain(&chain, &proxies).context("failed to build transports")?;

    let (events, events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let event_logger = receive_and_log_events(events_rx);

    let scheduler = Scheduler::new(
        EngineState::new(config, accounts, recipients),
        TransferEngine::new(chain),
        transports,
        config_store,
        token_store,
        events,
    );

    let (commands, commands_rx) = mpsc::channel(64);
    if cli.activate {
        commands
            .send(Command::Activate)
            .await
            .context("scheduler unavailable")?;
    }
    if cli.start {
        commands
            .send(Command::Start)
            .await
            .context("scheduler unavailable")?;
    } else if !cli.activate {
        info!("idle; run with --start to begin transferring");
    }

    run_task_with_shutdown(
        Box::new(SchedulerTask {
            scheduler,
            commands: commands_rx,
        }),
        tokio::signal::ctrl_c(),
    )
    .await;

    drop(commands);
    event_logger.abort();
    Ok(())
}
