//! End-to-end orchestrator behaviour against the in-process fake chain.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::utils::parse_ether;
use alloy::primitives::Address;
use parking_lot::Mutex;
use proptest::prelude::*;

use ysm_app::{AppConfig, AppError, AppState, NameService, View, NO_WALLET_MESSAGE, TRANSACTION_FAILED_MESSAGE};
use ysm_contract::testing::FakeChain;
use ysm_core::traits::Notifier;
use ysm_core::types::{ChainDefinition, ChainId, RequestStatus};

// ═══════════════════════════════════════════════════════════════════════════════
// HARNESS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        refresh_delay_ms: 0,
        receipt_poll_ms: 1,
        receipt_timeout_secs: 5,
        ..AppConfig::default()
    }
}

fn setup() -> (Arc<FakeChain>, Arc<RecordingNotifier>, Arc<NameService>) {
    let chain = FakeChain::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = NameService::new(Some(chain.clone()), notifier.clone(), test_config());
    (chain, notifier, service)
}

async fn wait_for(service: &NameService, mut predicate: impl FnMut(&AppState) -> bool) {
    let mut updates = service.subscribe();
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        updates.wait_for(|state| predicate(state)).await.map(|_| ())
    })
    .await;
    assert!(matches!(reached, Ok(Ok(()))), "state never reached: {:?}", service.state());
}

fn stranger() -> Address {
    Address::repeat_byte(0x0b)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_connect_on_target_network_fetches_directory_once() {
    let (chain, notifier, service) = setup();
    chain.seed_name("ninja", stranger(), "hi");
    chain.seed_name("pirate", stranger(), "");

    assert_eq!(service.view(), View::NotConnected);

    let account = service.connect().await.unwrap();

    assert_eq!(account, chain.account());
    assert_eq!(service.view(), View::MintForm);
    assert_eq!(chain.directory_reads(), 1);
    assert_eq!(service.state().directory.len(), 2);
    assert!(service.state().shows_directory());
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_connect_without_wallet_alerts() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = NameService::new(None, notifier.clone(), test_config());

    assert!(matches!(service.connect().await, Err(AppError::NoWallet)));
    assert_eq!(notifier.alerts(), vec![NO_WALLET_MESSAGE.to_string()]);
    assert_eq!(service.view(), View::NotConnected);

    // Startup without a wallet is silent.
    service.refresh_session().await.unwrap();
    assert_eq!(notifier.alerts().len(), 1);
}

#[tokio::test]
async fn test_connect_rejected_is_only_logged() {
    let (chain, notifier, service) = setup();
    chain.set_reject_connect(true);

    let err = service.connect().await.unwrap_err();

    assert!(err.is_user_rejection());
    assert!(notifier.alerts().is_empty());
    assert_eq!(service.view(), View::NotConnected);
}

#[tokio::test]
async fn test_connect_on_wrong_network_skips_directory() {
    let (chain, _, service) = setup();
    chain.set_chain_silently(ChainId(1));
    chain.seed_name("ninja", stranger(), "");

    service.connect().await.unwrap();

    assert_eq!(service.view(), View::WrongNetwork);
    assert!(!service.ensure_network());
    assert_eq!(chain.directory_reads(), 0);
    assert_eq!(service.state().session.describe(), "Mainnet | Wallet: 0xa1a1...a1a1");
}

#[tokio::test]
async fn test_refresh_session_restores_authorized_account() {
    let (chain, _, service) = setup();
    chain.authorize();
    chain.seed_name("ninja", stranger(), "");

    service.refresh_session().await.unwrap();

    assert_eq!(service.state().session.address, Some(chain.account()));
    assert_eq!(service.view(), View::MintForm);
    assert_eq!(chain.count("eth_requestAccounts"), 0);
    assert_eq!(chain.directory_reads(), 1);
}

#[tokio::test]
async fn test_refresh_session_without_authorized_account_is_silent() {
    let (chain, notifier, service) = setup();

    service.refresh_session().await.unwrap();

    assert_eq!(service.view(), View::NotConnected);
    assert_eq!(service.state().session.chain_id, Some(ChainId::TARGET));
    assert_eq!(chain.directory_reads(), 0);
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_chain_change_resets_and_bootstraps_again() {
    let (chain, _, service) = setup();
    chain.authorize();
    chain.set_chain_silently(ChainId(1));
    chain.seed_name("ninja", stranger(), "");

    service.refresh_session().await.unwrap();
    service.refresh_session().await.unwrap();
    assert_eq!(service.view(), View::WrongNetwork);

    service.set_domain_input("draft");
    chain.switch_externally(ChainId::TARGET);

    wait_for(&service, |s| s.view() == View::MintForm && s.shows_directory()).await;

    let state = service.state();
    assert_eq!(state.epoch, 1);
    assert_eq!(state.form.name, "");
    // One listener only, despite two startups.
    assert_eq!(chain.directory_reads(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_switch_to_unknown_chain_adds_it() {
    let (chain, _, service) = setup();
    chain.set_chain_silently(ChainId(1));
    chain.forget_chain(ChainId::TARGET);
    service.connect().await.unwrap();

    service.switch_network().await.unwrap();

    let methods: Vec<String> = chain
        .requests()
        .into_iter()
        .map(|(method, _)| method)
        .filter(|m| m.starts_with("wallet_"))
        .collect();
    assert_eq!(methods, vec!["wallet_switchEthereumChain", "wallet_addEthereumChain"]);

    let (_, params) = chain
        .requests()
        .into_iter()
        .find(|(method, _)| method == "wallet_addEthereumChain")
        .unwrap();
    assert_eq!(params[0], serde_json::to_value(ChainDefinition::target()).unwrap());
    assert_eq!(params[0]["chainId"], "0x13881");
    assert_eq!(params[0]["chainName"], "Polygon Mumbai Testnet");
    assert_eq!(params[0]["rpcUrls"][0], "https://rpc-mumbai.maticvigil.com/");
    assert_eq!(params[0]["nativeCurrency"]["symbol"], "MATIC");
    assert_eq!(params[0]["nativeCurrency"]["decimals"], 18);
    assert_eq!(params[0]["blockExplorerUrls"][0], "https://mumbai.polygonscan.com/");

    assert_eq!(chain.chain(), ChainId::TARGET);
}

#[tokio::test]
async fn test_switch_failure_stays_on_wrong_network() {
    let (chain, notifier, service) = setup();
    chain.set_chain_silently(ChainId(1));
    chain.fail_switch_with(4001);
    service.connect().await.unwrap();

    assert!(service.switch_network().await.is_err());

    assert_eq!(chain.count("wallet_addEthereumChain"), 0);
    assert_eq!(service.view(), View::WrongNetwork);
    assert!(notifier.alerts().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTORY
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_directory_keeps_request_order() {
    let (chain, _, service) = setup();
    chain.seed_name("alpha", stranger(), "a");
    chain.seed_name("bravo", stranger(), "b");
    chain.seed_name("charlie", stranger(), "c");
    chain.delay_reads("alpha", Duration::from_millis(60));
    chain.delay_reads("bravo", Duration::from_millis(30));

    service.connect().await.unwrap();

    let directory = service.state().directory;
    let got: Vec<(usize, &str, &str)> = directory
        .iter()
        .map(|m| (m.id, m.name.as_str(), m.record.as_str()))
        .collect();
    assert_eq!(got, vec![(0, "alpha", "a"), (1, "bravo", "b"), (2, "charlie", "c")]);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let (chain, _, service) = setup();
    chain.seed_name("ninja", stranger(), "");
    service.connect().await.unwrap();

    chain.seed_name("pirate", stranger(), "");
    chain.set_fail_reads(true);

    assert!(service.fetch_directory().await.is_err());
    assert_eq!(service.state().directory.len(), 1);
}

#[tokio::test]
async fn test_refresh_requires_session() {
    let (chain, _, service) = setup();

    assert!(matches!(service.fetch_directory().await, Err(AppError::NotConnected)));
    assert!(chain.requests().is_empty());
}

#[tokio::test]
async fn test_stale_refresh_is_discarded_after_reset() {
    let (chain, _, service) = setup();
    chain.seed_name("ninja", stranger(), "");
    service.connect().await.unwrap();

    chain.delay_reads("ninja", Duration::from_millis(200));
    let refresh = {
        let service = service.clone();
        tokio::spawn(async move { service.fetch_directory().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    service.hard_reset();

    assert!(!refresh.await.unwrap().unwrap());
    assert!(service.state().directory.is_empty());
    assert_eq!(service.view(), View::NotConnected);
}

#[tokio::test]
async fn test_only_owned_names_are_editable() {
    let (chain, _, service) = setup();
    chain.seed_name("mine", chain.account(), "");
    chain.seed_name("theirs", stranger(), "");

    service.connect().await.unwrap();

    let entries = service.directory_entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].editable);
    assert!(!entries[1].editable);
    assert_eq!(entries[0].display_name, "mine.ysm");
    assert!(entries[1].asset_url.ends_with("/1"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// MINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_short_name_is_rejected_locally() {
    let (chain, notifier, service) = setup();
    service.connect().await.unwrap();
    let before = chain.requests().len();

    let err = service.mint("ab", "x").await.unwrap_err();

    assert!(matches!(err, AppError::NameTooShort { min: 3 }));
    assert_eq!(chain.requests().len(), before);
    assert!(chain.transactions().is_empty());
    assert_eq!(notifier.alerts(), vec!["Domain must be at least 3 characters long".to_string()]);
}

#[tokio::test]
async fn test_empty_name_is_ignored() {
    let (chain, notifier, service) = setup();
    service.connect().await.unwrap();

    assert!(matches!(service.mint("", "x").await, Err(AppError::EmptyField("name"))));
    assert!(chain.transactions().is_empty());
    assert!(notifier.alerts().is_empty());
}

proptest! {
    #[test]
    fn prop_short_names_never_reach_the_network(name in "\\PC{1,2}") {
        tokio_test::block_on(async {
            let (chain, _, service) = setup();
            let result = service.mint(&name, "record").await;
            prop_assert!(
                matches!(result, Err(AppError::NameTooShort { .. })),
                "expected NameTooShort, got {:?}",
                result
            );
            prop_assert!(chain.requests().is_empty());
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_mint_registers_then_sets_record() {
    let (chain, notifier, service) = setup();
    service.connect().await.unwrap();
    service.set_domain_input("abcd");
    service.set_record_input("hello");

    service.mint("abcd", "hello").await.unwrap();

    let txs = chain.transactions();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].call, "register(abcd)");
    assert_eq!(txs[0].value, parse_ether("0.3").unwrap());
    assert_eq!(txs[0].from, chain.account());
    assert_eq!(txs[1].call, "setRecord(abcd,hello)");
    assert!(txs[1].value.is_zero());

    let state = service.state();
    assert_eq!(state.form.name, "");
    assert_eq!(state.form.record, "");
    assert_eq!(state.status, RequestStatus::Idle);
    assert!(notifier.alerts().is_empty());

    wait_for(&service, |s| s.directory.iter().any(|m| m.name == "abcd" && m.record == "hello")).await;
}

#[tokio::test]
async fn test_directory_refresh_after_mint_waits_for_delay() {
    let chain = FakeChain::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let config = AppConfig {
        refresh_delay_ms: 500,
        ..test_config()
    };
    let service = NameService::new(Some(chain.clone()), notifier, config);
    service.connect().await.unwrap();
    assert_eq!(chain.directory_reads(), 1);

    service.mint("abcd", "hello").await.unwrap();

    assert_eq!(chain.directory_reads(), 1);
    assert!(service.state().directory.is_empty());

    wait_for(&service, |s| s.directory.iter().any(|m| m.name == "abcd")).await;
    assert_eq!(chain.directory_reads(), 2);
}

#[tokio::test]
async fn test_mint_prices_by_length() {
    let (chain, _, service) = setup();
    service.connect().await.unwrap();

    service.mint("abc", "").await.unwrap();
    service.mint("abcde", "").await.unwrap();
    service.mint("abcdefghij", "").await.unwrap();

    let values: Vec<_> = chain
        .transactions()
        .into_iter()
        .filter(|tx| tx.call.starts_with("register"))
        .map(|tx| tx.value)
        .collect();
    assert_eq!(
        values,
        vec![
            parse_ether("0.5").unwrap(),
            parse_ether("0.1").unwrap(),
            parse_ether("0.1").unwrap(),
        ]
    );
}

#[tokio::test]
async fn test_failed_registration_never_sets_record() {
    let (chain, notifier, service) = setup();
    chain.set_revert_register(true);
    service.connect().await.unwrap();
    service.set_domain_input("abcd");
    service.set_record_input("hello");

    let err = service.mint("abcd", "hello").await.unwrap_err();

    assert!(matches!(err, AppError::TransactionFailed(_)));
    let txs = chain.transactions();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].call, "register(abcd)");
    assert_eq!(notifier.alerts(), vec![TRANSACTION_FAILED_MESSAGE.to_string()]);

    let state = service.state();
    assert_eq!(state.status, RequestStatus::Failed);
    assert_eq!(state.form.name, "abcd");
    assert_eq!(state.form.record, "hello");
}

#[tokio::test]
async fn test_failed_record_leaves_name_registered() {
    let (chain, notifier, service) = setup();
    chain.set_revert_set_record(true);
    service.connect().await.unwrap();

    assert!(service.mint("abcd", "hello").await.is_err());
    assert_eq!(chain.transactions().len(), 2);
    assert_eq!(notifier.alerts(), vec![TRANSACTION_FAILED_MESSAGE.to_string()]);

    service.fetch_directory().await.unwrap();
    let directory = service.state().directory;
    assert_eq!(directory[0].name, "abcd");
    assert_eq!(directory[0].record, "");
    assert_eq!(directory[0].owner, chain.account());
}

#[tokio::test]
async fn test_rejected_mint_is_not_alerted() {
    let (chain, notifier, service) = setup();
    chain.set_reject_transactions(true);
    service.connect().await.unwrap();

    let err = service.mint("abcd", "hello").await.unwrap_err();

    assert!(err.is_user_rejection());
    assert!(chain.transactions().is_empty());
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_mint_requires_target_network() {
    let (chain, _, service) = setup();
    chain.set_chain_silently(ChainId(1));
    service.connect().await.unwrap();

    assert!(matches!(service.mint("abcd", "").await, Err(AppError::WrongNetwork)));
    assert!(chain.transactions().is_empty());
}

#[tokio::test]
async fn test_second_request_while_in_flight_is_refused() {
    let (chain, _, service) = setup();
    chain.delay_transactions(Duration::from_millis(150));
    service.connect().await.unwrap();

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.mint("abcd", "one").await })
    };
    wait_for(&service, |s| s.is_busy()).await;

    assert!(matches!(service.mint("efgh", "two").await, Err(AppError::RequestInFlight)));
    assert!(matches!(
        service.update_record("abcd", "two").await,
        Err(AppError::RequestInFlight)
    ));

    first.await.unwrap().unwrap();
    let calls: Vec<String> = chain.transactions().into_iter().map(|tx| tx.call).collect();
    assert_eq!(calls, vec!["register(abcd)", "setRecord(abcd,one)"]);

    // Released once the first request finished.
    service.mint("efgh", "two").await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORD UPDATES
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_update_record_refreshes_immediately() {
    let (chain, notifier, service) = setup();
    chain.seed_name("ninja", chain.account(), "old");
    service.connect().await.unwrap();

    service.edit_record("ninja");
    service.set_record_input("new");
    assert_eq!(service.view(), View::EditRecord { name: "ninja".into() });

    service.update_record("ninja", "new").await.unwrap();

    assert_eq!(chain.transactions()[0].call, "setRecord(ninja,new)");
    assert_eq!(service.state().directory[0].record, "new");
    assert_eq!(service.view(), View::MintForm);
    assert_eq!(service.state().form.record, "");
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_update_record_requires_both_fields() {
    let (chain, notifier, service) = setup();
    service.connect().await.unwrap();

    assert!(matches!(service.update_record("ninja", "").await, Err(AppError::EmptyField("record"))));
    assert!(matches!(service.update_record("", "x").await, Err(AppError::EmptyField("name"))));
    assert!(chain.transactions().is_empty());
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_update_record_of_foreign_name_fails_on_chain() {
    let (chain, notifier, service) = setup();
    chain.seed_name("theirs", stranger(), "keep");
    service.connect().await.unwrap();

    let err = service.update_record("theirs", "mine now").await.unwrap_err();

    assert!(matches!(err, AppError::TransactionFailed(_)));
    assert_eq!(chain.transactions().len(), 1);
    assert_eq!(notifier.alerts(), vec![TRANSACTION_FAILED_MESSAGE.to_string()]);
    assert_eq!(service.state().directory[0].record, "keep");
}

#[tokio::test]
async fn test_cancel_edit_keeps_record_input() {
    let (_, _, service) = setup();
    service.connect().await.unwrap();

    service.set_record_input("draft");
    service.edit_record("ninja");
    service.cancel_edit();

    let state = service.state();
    assert_eq!(state.view(), View::MintForm);
    assert_eq!(state.form.record, "draft");
}
