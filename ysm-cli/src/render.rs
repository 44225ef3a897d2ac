//! Terminal rendering of the state snapshot.

use colored::*;

use ysm_app::{AppState, View};
use ysm_core::constants::TARGET_CHAIN_NAME;
use ysm_core::pricing;
use ysm_core::types::short_address;

/// Network name and shortened wallet.
pub fn header(state: &AppState) {
    let network = state.session.describe();
    if state.session.on_target_network() {
        println!("{} {}", "🌐".green(), network.green());
    } else {
        println!("{} {}", "🌐".yellow(), network.yellow());
    }
}

/// The primary view.
pub fn view(state: &AppState) {
    match state.view() {
        View::NotConnected => {
            println!("\n{}", "Connect a wallet to get started.".cyan().bold());
        }
        View::WrongNetwork => {
            println!(
                "\n{} {}",
                "Please connect to".yellow().bold(),
                TARGET_CHAIN_NAME.yellow().bold()
            );
        }
        View::MintForm => {
            println!("\n{}", "Mint a .ysm name".cyan().bold());
            if !state.form.name.is_empty() {
                let price = pricing::price_label(&state.form.name).unwrap_or("-");
                println!("   {} {}.ysm ({} MATIC)", "Name:".dimmed(), state.form.name, price);
            }
            if !state.form.record.is_empty() {
                println!("   {} {}", "Record:".dimmed(), state.form.record);
            }
        }
        View::EditRecord { name } => {
            println!("\n{} {}.ysm", "Editing record of".cyan().bold(), name.bold());
        }
    }

    if state.is_busy() {
        println!("   {}", "A transaction is in flight...".dimmed());
    }
}

/// The directory listing, with edit markers on owned names.
pub fn directory(state: &AppState) {
    let entries = state.directory_entries();
    if entries.is_empty() {
        println!("\n{}", "No names minted yet.".dimmed());
        return;
    }

    println!("\n{}", "📜 Recently minted names".cyan().bold());
    for entry in entries {
        let marker = if entry.editable { " ✏️".to_string() } else { String::new() };
        println!("   {} {}{}", format!("#{}", entry.id).dimmed(), entry.display_name.bold(), marker);
        if !entry.record.is_empty() {
            println!("      {} {}", "record:".dimmed(), entry.record);
        }
        println!("      {} {}", "owner:".dimmed(), short_address(&entry.owner));
        println!("      {}", entry.asset_url.dimmed());
    }
}
