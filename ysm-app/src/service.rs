//! The connection & mint orchestrator.
//!
//! [`NameService`] owns the current [`AppState`] and sequences wallet and
//! contract calls around it. Views never mutate state directly; they call an
//! operation and re-render from the published snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use alloy::primitives::{Address, U256};
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use ysm_contract::DomainsContract;
use ysm_core::constants::MIN_NAME_LENGTH;
use ysm_core::error::NameServiceError;
use ysm_core::pricing;
use ysm_core::traits::{Notifier, WalletProvider};
use ysm_core::types::{short_address, ChainDefinition, ChainId, MintedName, RequestStatus};
use ysm_wallet::{HttpWalletProvider, WalletExt};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::view::{DirectoryEntry, View};

/// Shown when an action needs a wallet and none was detected.
pub const NO_WALLET_MESSAGE: &str = "No wallet found. Install an Ethereum wallet to continue.";

/// Shown when a submitted transaction does not confirm.
pub const TRANSACTION_FAILED_MESSAGE: &str = "Transaction failed!";

/// Releases the in-flight flag when a mint/update finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates the wallet session, the directory and mint/update requests.
pub struct NameService {
    wallet: Option<Arc<dyn WalletProvider>>,
    contract: Option<DomainsContract>,
    notifier: Arc<dyn Notifier>,
    config: AppConfig,
    state: RwLock<AppState>,
    updates: watch::Sender<AppState>,
    in_flight: AtomicBool,
    chain_listener: Mutex<Option<JoinHandle<()>>>,
}

impl NameService {
    /// Creates the orchestrator. `wallet` is `None` when no provider exists.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        notifier: Arc<dyn Notifier>,
        config: AppConfig,
    ) -> Arc<Self> {
        let contract = wallet
            .as_ref()
            .map(|w| DomainsContract::with_config(w.clone(), config.contract_config()));
        let (updates, _) = watch::channel(AppState::default());

        Arc::new(Self {
            wallet,
            contract,
            notifier,
            config,
            state: RwLock::new(AppState::default()),
            updates,
            in_flight: AtomicBool::new(false),
            chain_listener: Mutex::new(None),
        })
    }

    /// Looks for a wallet at the configured endpoint and creates the orchestrator.
    pub async fn detect(config: AppConfig, notifier: Arc<dyn Notifier>) -> AppResult<Arc<Self>> {
        let wallet = HttpWalletProvider::detect(config.wallet_config())
            .await?
            .map(|w| w as Arc<dyn WalletProvider>);
        if wallet.is_none() {
            info!(url = %config.wallet_url, "No wallet provider detected");
        }
        Ok(Self::new(wallet, notifier, config))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATE ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current snapshot.
    pub fn state(&self) -> AppState {
        self.state.read().clone()
    }

    /// Receives every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.updates.subscribe()
    }

    /// Current primary view.
    pub fn view(&self) -> View {
        self.state.read().view()
    }

    /// Current directory rows.
    pub fn directory_entries(&self) -> Vec<DirectoryEntry> {
        self.state.read().directory_entries()
    }

    fn update(&self, transition: impl FnOnce(AppState) -> AppState) {
        let mut state = self.state.write();
        *state = transition(state.clone());
        self.updates.send_replace(state.clone());
    }

    /// Applies `transition` only if no hard reset happened since `epoch`.
    fn update_if_current(&self, epoch: u64, transition: impl FnOnce(AppState) -> AppState) -> bool {
        let mut state = self.state.write();
        if state.epoch != epoch {
            return false;
        }
        *state = transition(state.clone());
        self.updates.send_replace(state.clone());
        true
    }

    fn epoch(&self) -> u64 {
        self.state.read().epoch
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════════════════════════════════════

    fn wallet(&self) -> AppResult<&Arc<dyn WalletProvider>> {
        match &self.wallet {
            Some(wallet) => Ok(wallet),
            None => {
                self.notifier.alert(NO_WALLET_MESSAGE);
                Err(AppError::NoWallet)
            }
        }
    }

    fn contract(&self) -> AppResult<&DomainsContract> {
        match &self.contract {
            Some(contract) => Ok(contract),
            None => {
                self.notifier.alert(NO_WALLET_MESSAGE);
                Err(AppError::NoWallet)
            }
        }
    }

    /// Connected account, provided the wallet is on the target network.
    fn ready_account(&self) -> AppResult<Address> {
        let state = self.state.read();
        let address = state.session.address.ok_or(AppError::NotConnected)?;
        if !state.session.on_target_network() {
            return Err(AppError::WrongNetwork);
        }
        Ok(address)
    }

    /// Asks the wallet for account access and starts a session.
    ///
    /// Refreshes the directory once if the wallet is already on the target
    /// network.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> AppResult<Address> {
        let wallet = self.wallet()?;

        let accounts = wallet.request_accounts().await.map_err(|e| {
            error!(error = %e, "Wallet connection failed");
            AppError::from(e)
        })?;
        let account = accounts.first().copied().ok_or(NameServiceError::NoAccounts)?;

        let known = self.state.read().session.chain_id;
        let chain = match known {
            Some(chain) => chain,
            None => wallet.chain_id().await?,
        };

        self.update(|s| s.with_account(Some(account)).with_chain(Some(chain)));
        info!(account = %short_address(&account), %chain, "Wallet connected");

        if chain.is_target() {
            self.refresh_directory().await;
        }
        Ok(account)
    }

    /// Startup: picks up an already-authorized session and starts listening
    /// for network changes.
    ///
    /// Without a wallet this does nothing. A network change later resets the
    /// whole state and runs the same bootstrap again.
    #[instrument(skip(self))]
    pub async fn refresh_session(self: &Arc<Self>) -> AppResult<()> {
        let Some(wallet) = &self.wallet else {
            debug!("No wallet provider; staying disconnected");
            return Ok(());
        };

        self.ensure_chain_listener(wallet.subscribe_chain_changed());
        self.bootstrap().await
    }

    async fn bootstrap(&self) -> AppResult<()> {
        let Some(wallet) = &self.wallet else {
            return Ok(());
        };
        let epoch = self.epoch();

        let accounts = wallet.accounts().await?;
        let chain = wallet.chain_id().await?;
        let account = accounts.first().copied();

        if !self.update_if_current(epoch, |s| s.with_account(account).with_chain(Some(chain))) {
            debug!("Session read superseded by a network change");
            return Ok(());
        }

        match account {
            Some(account) => {
                info!(account = %short_address(&account), %chain, "Restored wallet session");
                if chain.is_target() {
                    self.refresh_directory().await;
                }
            }
            None => debug!(%chain, "No authorized account"),
        }
        Ok(())
    }

    fn ensure_chain_listener(self: &Arc<Self>, changes: broadcast::Receiver<ChainId>) {
        let mut listener = self.chain_listener.lock();
        if listener.is_some() {
            return;
        }
        *listener = Some(tokio::spawn(listen_for_chain_changes(Arc::downgrade(self), changes)));
    }

    /// Re-initializes session, directory, form and status in place.
    ///
    /// Directory refreshes and transactions started before the reset can no
    /// longer write into the new state.
    pub fn hard_reset(&self) {
        self.update(AppState::reset);
        info!(epoch = self.epoch(), "State reset");
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Whether the wallet is on the target network.
    pub fn ensure_network(&self) -> bool {
        let on_target = self.state.read().session.on_target_network();
        if !on_target {
            debug!("Wallet is not on the target network");
        }
        on_target
    }

    /// Asks the wallet to switch to the target network, adding it first if
    /// the wallet does not know it.
    ///
    /// The new network takes effect through the chain-change notification.
    #[instrument(skip(self))]
    pub async fn switch_network(&self) -> AppResult<()> {
        let wallet = self.wallet()?;

        match wallet.switch_chain(ChainId::TARGET).await {
            Ok(()) => {
                info!(chain = %ChainId::TARGET, "Switch requested");
                Ok(())
            }
            Err(e) if e.is_unrecognized_chain() => {
                info!(chain = %ChainId::TARGET, "Wallet does not know the target chain; adding it");
                wallet.add_chain(&ChainDefinition::target()).await.map_err(|e| {
                    error!(error = %e, "Adding the target chain failed");
                    AppError::from(e)
                })
            }
            Err(e) => {
                error!(error = %e, "Network switch failed");
                Err(e.into())
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DIRECTORY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Re-reads every registered name with its record and owner.
    ///
    /// All per-name reads run concurrently and land by index, so the snapshot
    /// order matches `getAllNames()`. Any failure keeps the previous
    /// snapshot. Returns `false` if a hard reset happened meanwhile and the
    /// result was dropped.
    #[instrument(skip(self))]
    pub async fn fetch_directory(&self) -> AppResult<bool> {
        let epoch = self.epoch();
        self.ready_account()?;
        let contract = self.contract()?;

        let names = contract.get_all_names().await?;

        let mut lookups: FuturesUnordered<_> = names
            .iter()
            .enumerate()
            .map(|(index, name)| async move {
                let (record, owner) = tokio::try_join!(contract.record(name), contract.owner(name))?;
                Ok::<_, NameServiceError>(MintedName {
                    id: index,
                    name: name.clone(),
                    record,
                    owner,
                })
            })
            .collect();

        let mut slots: Vec<Option<MintedName>> = vec![None; names.len()];
        while let Some(entry) = lookups.next().await {
            let entry = entry?;
            let index = entry.id;
            slots[index] = Some(entry);
        }
        let directory: Vec<MintedName> = slots.into_iter().flatten().collect();
        let count = directory.len();

        if !self.update_if_current(epoch, |s| s.with_directory(directory)) {
            debug!("Discarding directory read from before a reset");
            return Ok(false);
        }
        debug!(count, "Directory refreshed");
        Ok(true)
    }

    async fn refresh_directory(&self) {
        if let Err(e) = self.fetch_directory().await {
            warn!(error = %e, "Directory refresh failed; keeping previous snapshot");
        }
    }

    fn schedule_refresh(self: &Arc<Self>) {
        let service = Arc::downgrade(self);
        let delay = self.config.refresh_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(service) = service.upgrade() {
                service.refresh_directory().await;
            }
        });
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FORM
    // ═══════════════════════════════════════════════════════════════════════════

    /// Updates the candidate name.
    pub fn set_domain_input(&self, name: impl Into<String>) {
        let name = name.into();
        self.update(|s| s.with_domain_input(name));
    }

    /// Updates the candidate record.
    pub fn set_record_input(&self, record: impl Into<String>) {
        let record = record.into();
        self.update(|s| s.with_record_input(record));
    }

    /// Switches the form to editing `name`'s record.
    pub fn edit_record(&self, name: impl Into<String>) {
        let name = name.into();
        self.update(|s| s.editing(name));
    }

    /// Back to the mint form.
    pub fn cancel_edit(&self) {
        self.update(AppState::cancel_edit);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSACTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn begin_request(&self) -> AppResult<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::RequestInFlight)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    fn report_failure(&self, error: &NameServiceError) {
        if error.is_user_rejection() {
            warn!("Request rejected in wallet");
        } else {
            error!(error = %error, "Transaction failed");
            self.notifier.alert(TRANSACTION_FAILED_MESSAGE);
        }
    }

    /// Registers `name` and then sets its record.
    ///
    /// The record is only submitted once the registration has confirmed. A
    /// failure after registration leaves the name registered with no record.
    /// On success the form is cleared and the directory is refreshed after
    /// the configured delay.
    #[instrument(skip(self, record))]
    pub async fn mint(self: &Arc<Self>, name: &str, record: &str) -> AppResult<()> {
        if name.is_empty() {
            return Err(AppError::EmptyField("name"));
        }
        if pricing::validate_name(name).is_err() {
            let err = AppError::NameTooShort { min: MIN_NAME_LENGTH };
            self.notifier.alert(&err.to_string());
            return Err(err);
        }
        let value = pricing::price_wei(name).ok_or(AppError::NameTooShort { min: MIN_NAME_LENGTH })?;

        let contract = self.contract()?;
        let from = self.ready_account()?;
        let _guard = self.begin_request()?;

        let epoch = self.epoch();
        self.update(|s| s.with_status(RequestStatus::InFlight));

        match self.register_and_record(contract, from, name, record, value).await {
            Ok(()) => {
                self.update_if_current(epoch, |s| s.cleared_form().with_status(RequestStatus::Idle));
                self.schedule_refresh();
                Ok(())
            }
            Err(e) => {
                self.update_if_current(epoch, |s| s.with_status(RequestStatus::Failed));
                self.report_failure(&e);
                Err(AppError::TransactionFailed(e))
            }
        }
    }

    async fn register_and_record(
        &self,
        contract: &DomainsContract,
        from: Address,
        name: &str,
        record: &str,
        value: U256,
    ) -> Result<(), NameServiceError> {
        let registration = contract.register(from, name, value).await?;
        registration.confirm().await?;
        info!(name, "Domain minted");

        self.submit_record(contract, from, name, record).await
    }

    async fn submit_record(
        &self,
        contract: &DomainsContract,
        from: Address,
        name: &str,
        record: &str,
    ) -> Result<(), NameServiceError> {
        let update = contract.set_record(from, name, record).await?;
        update.confirm().await?;
        info!(name, "Record set");
        Ok(())
    }

    /// Sets the record of an owned name and refreshes the directory.
    ///
    /// Ownership is left to the contract to enforce.
    #[instrument(skip(self, record))]
    pub async fn update_record(&self, name: &str, record: &str) -> AppResult<()> {
        if name.is_empty() {
            return Err(AppError::EmptyField("name"));
        }
        if record.is_empty() {
            return Err(AppError::EmptyField("record"));
        }

        let contract = self.contract()?;
        let from = self.ready_account()?;
        let _guard = self.begin_request()?;

        let epoch = self.epoch();
        self.update(|s| s.with_status(RequestStatus::InFlight));

        match self.submit_record(contract, from, name, record).await {
            Ok(()) => {
                if self.update_if_current(epoch, |s| s.cleared_form().with_status(RequestStatus::Idle)) {
                    self.refresh_directory().await;
                }
                Ok(())
            }
            Err(e) => {
                self.update_if_current(epoch, |s| s.with_status(RequestStatus::Failed));
                self.report_failure(&e);
                Err(AppError::TransactionFailed(e))
            }
        }
    }
}

impl Drop for NameService {
    fn drop(&mut self) {
        if let Some(handle) = self.chain_listener.lock().take() {
            handle.abort();
        }
    }
}

async fn listen_for_chain_changes(service: Weak<NameService>, mut changes: broadcast::Receiver<ChainId>) {
    loop {
        let chain = match changes.recv().await {
            Ok(chain) => chain,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Missed chain notifications");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        let Some(service) = service.upgrade() else {
            return;
        };

        info!(%chain, "Network changed");
        service.hard_reset();
        if let Err(e) = service.bootstrap().await {
            warn!(error = %e, "Session refresh after network change failed");
        }
    }
}
