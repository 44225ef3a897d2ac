//! YSM CLI
//!
//! Command-line interface for the `.ysm` name service on Polygon Mumbai.

mod interactive;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ysm_app::{AppConfig, NameService, View};
use ysm_core::constants::TARGET_CHAIN_NAME;
use ysm_core::pricing;
use ysm_core::traits::Notifier;
use ysm_core::types::{short_address, MintedName};

/// YSM - the .ysm name service
#[derive(Parser)]
#[command(name = "ysm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Wallet provider JSON-RPC endpoint
    #[arg(long, global = true, env = "YSM_WALLET_URL")]
    wallet_url: Option<String>,

    /// Interactive mode when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the wallet session and current view
    Status,

    /// Connect the wallet
    Connect,

    /// List registered names
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mint a new name
    Mint {
        /// Name without the .ysm suffix
        name: String,
        /// Text record to set after registration
        #[arg(short, long, default_value = "")]
        record: String,
    },

    /// Set the record of a name you own
    SetRecord {
        /// Name without the .ysm suffix
        name: String,
        /// New text record
        record: String,
    },

    /// Ask the wallet to switch to the target network
    SwitchNetwork,
}

/// Prints alerts to stderr.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{} {}", "⚠️ ".yellow(), message.yellow().bold());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ysm=debug,info"
    } else {
        "ysm=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::from_env().context("Invalid YSM_* configuration")?;
    if let Some(url) = cli.wallet_url {
        config = config.with_wallet_url(url);
    }

    let service = NameService::detect(config, Arc::new(TerminalNotifier))
        .await
        .context("Failed to probe wallet provider")?;
    restore_session(&service).await;

    match cli.command {
        None => interactive::run(&service).await,
        Some(Commands::Status) => cmd_status(&service),
        Some(Commands::Connect) => cmd_connect(&service).await,
        Some(Commands::List { json }) => cmd_list(&service, json),
        Some(Commands::Mint { name, record }) => cmd_mint(&service, &name, &record).await,
        Some(Commands::SetRecord { name, record }) => cmd_set_record(&service, &name, &record).await,
        Some(Commands::SwitchNetwork) => cmd_switch_network(&service).await,
    }
}

/// Picks up an already-authorized session.
///
/// A failed read (locked wallet, flaky endpoint) leaves the session unset;
/// `connect` or Refresh tries again.
async fn restore_session(service: &Arc<NameService>) {
    if let Err(e) = service.refresh_session().await {
        warn!(error = %e, "Could not read wallet session; starting disconnected");
    }
}

pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Connects unless a session already exists.
async fn ensure_connected(service: &NameService) -> Result<()> {
    if service.view() == View::NotConnected {
        service.connect().await.context("Failed to connect wallet")?;
    }
    Ok(())
}

/// Show session status
fn cmd_status(service: &NameService) -> Result<()> {
    let state = service.state();
    render::header(&state);
    render::view(&state);
    if state.shows_directory() {
        println!("   {} {}", "Names registered:".dimmed(), state.directory.len());
    }
    Ok(())
}

/// Connect the wallet
async fn cmd_connect(service: &NameService) -> Result<()> {
    let account = service.connect().await.context("Failed to connect wallet")?;
    println!("{} {}", "✅ Connected:".green().bold(), short_address(&account));
    render::header(&service.state());
    Ok(())
}

/// List registered names
fn cmd_list(service: &NameService, json: bool) -> Result<()> {
    let state = service.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.directory_entries())?);
        return Ok(());
    }

    render::header(&state);
    match state.view() {
        View::NotConnected => println!("{}", "Connect a wallet to see the directory (ysm connect).".yellow()),
        View::WrongNetwork => println!(
            "{} {} {}",
            "Switch to".yellow(),
            TARGET_CHAIN_NAME.yellow().bold(),
            "to see the directory (ysm switch-network).".yellow()
        ),
        _ => render::directory(&state),
    }
    Ok(())
}

/// Mint a name
async fn cmd_mint(service: &Arc<NameService>, name: &str, record: &str) -> Result<()> {
    ensure_connected(service).await?;

    let price = pricing::price_label(name).unwrap_or("-");
    let pb = spinner(format!(
        "Minting {} for {} MATIC (confirm in your wallet)...",
        MintedName::display_name_for(name),
        price
    ));
    let result = service.mint(name, record).await;
    pb.finish_and_clear();
    result.context("Mint failed")?;

    println!(
        "{} {}",
        "✅ Minted".green().bold(),
        MintedName::display_name_for(name).bold()
    );
    Ok(())
}

/// Set a record
async fn cmd_set_record(service: &NameService, name: &str, record: &str) -> Result<()> {
    ensure_connected(service).await?;

    let pb = spinner(format!(
        "Setting record of {} (confirm in your wallet)...",
        MintedName::display_name_for(name)
    ));
    let result = service.update_record(name, record).await;
    pb.finish_and_clear();
    result.context("Setting the record failed")?;

    println!("{} {}", "✅ Record set for".green().bold(), MintedName::display_name_for(name));
    Ok(())
}

/// Switch to the target network
async fn cmd_switch_network(service: &NameService) -> Result<()> {
    if service.ensure_network() {
        println!("{} {}", "Already on".green(), TARGET_CHAIN_NAME.bold());
        return Ok(());
    }

    service
        .switch_network()
        .await
        .context("Network switch failed")?;

    let pb = spinner(format!("Waiting for the wallet to switch to {}...", TARGET_CHAIN_NAME));
    let switched = interactive::wait_for_network(service, Duration::from_secs(60)).await;
    pb.finish_and_clear();

    if switched {
        println!("{} {}", "✅ Switched to".green().bold(), TARGET_CHAIN_NAME.bold());
    } else {
        println!("{}", "Wallet did not switch networks.".yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ysm_contract::testing::FakeChain;

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["ysm"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_mint_args() {
        let cli = Cli::try_parse_from(["ysm", "mint", "ninja", "--record", "hello", "-v"]).unwrap();
        match cli.command {
            Some(Commands::Mint { name, record }) => {
                assert_eq!(name, "ninja");
                assert_eq!(record, "hello");
            }
            _ => panic!("expected mint"),
        }
        assert!(cli.verbose);
    }

    #[test]
    fn test_set_record_needs_both_args() {
        assert!(Cli::try_parse_from(["ysm", "set-record", "ninja"]).is_err());
        assert!(Cli::try_parse_from(["ysm", "set-record", "ninja", "hi"]).is_ok());
    }

    #[tokio::test]
    async fn test_locked_wallet_does_not_stop_startup() {
        let chain = FakeChain::new();
        chain.authorize();
        chain.set_locked(true);
        let service = NameService::new(Some(chain.clone()), Arc::new(TerminalNotifier), AppConfig::default());

        restore_session(&service).await;
        assert_eq!(service.view(), View::NotConnected);
        assert_eq!(chain.count("eth_accounts"), 1);

        chain.set_locked(false);
        service.refresh_session().await.unwrap();
        assert_eq!(service.view(), View::MintForm);
    }
}
