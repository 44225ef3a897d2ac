//! Interactive mode: render the current view, offer its actions, repeat.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use ysm_app::{AppError, AppState, NameService, View};
use ysm_core::constants::TARGET_CHAIN_NAME;
use ysm_core::pricing;
use ysm_core::types::MintedName;

use crate::{render, spinner};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Connect,
    SwitchNetwork,
    Mint,
    Edit,
    SetRecord,
    CancelEdit,
    Refresh,
    Quit,
}

impl Action {
    fn label(self) -> String {
        match self {
            Action::Connect => "Connect wallet".into(),
            Action::SwitchNetwork => format!("Switch to {}", TARGET_CHAIN_NAME),
            Action::Mint => "Mint a name".into(),
            Action::Edit => "Edit a record".into(),
            Action::SetRecord => "Set record".into(),
            Action::CancelEdit => "Cancel".into(),
            Action::Refresh => "Refresh".into(),
            Action::Quit => "Quit".into(),
        }
    }
}

/// Actions offered in `view`. Editing is only offered when the user owns a name.
fn actions(view: &View, owns_any: bool) -> Vec<Action> {
    match view {
        View::NotConnected => vec![Action::Connect, Action::Quit],
        View::WrongNetwork => vec![Action::SwitchNetwork, Action::Refresh, Action::Quit],
        View::MintForm if owns_any => vec![Action::Mint, Action::Edit, Action::Refresh, Action::Quit],
        View::MintForm => vec![Action::Mint, Action::Refresh, Action::Quit],
        View::EditRecord { .. } => vec![Action::SetRecord, Action::CancelEdit, Action::Quit],
    }
}

/// Names in `state`'s directory the connected account may edit.
fn owned_names(state: &AppState) -> Vec<String> {
    state
        .directory_entries()
        .into_iter()
        .filter(|e| e.editable)
        .map(|e| e.name)
        .collect()
}

/// Prints errors the notifier has not already shown.
fn report(error: &AppError) {
    if error.is_user_rejection() {
        println!("{}", "Request rejected in wallet.".dimmed());
        return;
    }
    match error {
        AppError::NoWallet | AppError::NameTooShort { .. } | AppError::TransactionFailed(_) => {}
        other => println!("{} {}", "❌".red(), other.to_string().red()),
    }
}

/// Waits until the session is on the target network.
pub async fn wait_for_network(service: &NameService, timeout: Duration) -> bool {
    let mut updates = service.subscribe();
    let reached = tokio::time::timeout(timeout, async {
        updates
            .wait_for(|state| state.session.on_target_network())
            .await
            .is_ok()
    })
    .await;
    matches!(reached, Ok(true))
}

/// Runs the interactive loop until the user quits.
pub async fn run(service: &Arc<NameService>) -> Result<()> {
    let theme = ColorfulTheme::default();

    println!("{}", "🥷 YSM Name Service".cyan().bold());

    loop {
        let state = service.state();
        println!();
        render::header(&state);
        render::view(&state);
        if state.shows_directory() {
            render::directory(&state);
        }

        let view = state.view();
        let owned = owned_names(&state);
        let choices = actions(&view, !owned.is_empty());
        let labels: Vec<String> = choices.iter().map(|a| a.label()).collect();

        let picked = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()?;

        let outcome = match choices[picked] {
            Action::Quit => return Ok(()),
            Action::Connect => service.connect().await.map(|_| ()),
            Action::SwitchNetwork => switch_network(service).await,
            Action::Refresh => refresh(service).await,
            Action::Mint => mint(service, &theme).await?,
            Action::Edit => {
                edit(service, &theme, &owned)?;
                Ok(())
            }
            Action::SetRecord => set_record(service, &theme).await?,
            Action::CancelEdit => {
                service.cancel_edit();
                Ok(())
            }
        };

        if let Err(e) = outcome {
            report(&e);
        }
    }
}

async fn switch_network(service: &NameService) -> Result<(), AppError> {
    service.switch_network().await?;
    let pb = spinner(format!("Waiting for the wallet to switch to {}...", TARGET_CHAIN_NAME));
    wait_for_network(service, Duration::from_secs(60)).await;
    pb.finish_and_clear();
    Ok(())
}

async fn refresh(service: &Arc<NameService>) -> Result<(), AppError> {
    if service.ensure_network() {
        service.fetch_directory().await?;
    } else {
        service.refresh_session().await?;
    }
    Ok(())
}

async fn mint(service: &Arc<NameService>, theme: &ColorfulTheme) -> Result<Result<(), AppError>> {
    let current = service.state().form;

    let name: String = Input::with_theme(theme)
        .with_prompt("Name (without .ysm)")
        .with_initial_text(current.name)
        .allow_empty(true)
        .interact_text()?;
    service.set_domain_input(name.clone());

    if let Some(price) = pricing::price_label(&name) {
        println!("   {} {} MATIC", "Price:".dimmed(), price);
    }

    let record: String = Input::with_theme(theme)
        .with_prompt("Record")
        .with_initial_text(current.record)
        .allow_empty(true)
        .interact_text()?;
    service.set_record_input(record.clone());

    let pb = spinner(format!(
        "Minting {} (confirm in your wallet)...",
        MintedName::display_name_for(&name)
    ));
    let result = service.mint(&name, &record).await;
    pb.finish_and_clear();

    if result.is_ok() {
        println!("{} {}", "✅ Minted".green().bold(), MintedName::display_name_for(&name).bold());
    }
    Ok(result)
}

fn edit(service: &NameService, theme: &ColorfulTheme, owned: &[String]) -> Result<()> {
    if owned.is_empty() {
        return Ok(());
    }
    let labels: Vec<String> = owned.iter().map(|n| MintedName::display_name_for(n)).collect();

    let picked = Select::with_theme(theme)
        .with_prompt("Which name?")
        .items(&labels)
        .default(0)
        .interact()?;
    service.edit_record(owned[picked].clone());
    Ok(())
}

async fn set_record(service: &NameService, theme: &ColorfulTheme) -> Result<Result<(), AppError>> {
    let form = service.state().form;

    let record: String = Input::with_theme(theme)
        .with_prompt(format!("New record for {}", MintedName::display_name_for(&form.name)))
        .with_initial_text(form.record)
        .allow_empty(true)
        .interact_text()?;
    service.set_record_input(record.clone());

    let pb = spinner("Setting record (confirm in your wallet)...");
    let result = service.update_record(&form.name, &record).await;
    pb.finish_and_clear();

    if result.is_ok() {
        println!("{}", "✅ Record set".green().bold());
    }
    Ok(result)
}
