//! In-process wallet + chain for tests.
//!
//! [`FakeChain`] answers the EIP-1193 methods the client uses, executes the
//! name-service contract in memory, and records every request so tests can
//! assert on exactly what reached the "network".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use ysm_core::constants::{UNAUTHORIZED, UNRECOGNIZED_CHAIN, UNSUPPORTED_METHOD, USER_REJECTED_REQUEST};
use ysm_core::error::{NameServiceError, ProviderRpcError, Result};
use ysm_core::traits::WalletProvider;
use ysm_core::types::{parse_address, ChainId};

use crate::abi::IDomains::{self, IDomainsCalls};

/// A transaction the fake wallet accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedTx {
    /// Hash handed back to the client
    pub hash: TxHash,
    /// Sender
    pub from: Address,
    /// Attached value in wei
    pub value: U256,
    /// Decoded call, e.g. `register(abcd)`
    pub call: String,
}

struct Entry {
    owner: Address,
    record: String,
}

struct State {
    accounts: Vec<Address>,
    authorized: bool,
    chain: ChainId,
    known_chains: HashSet<ChainId>,
    switch_after_add: bool,
    switch_failure: Option<i64>,
    reject_connect: bool,
    reject_transactions: bool,
    locked: bool,
    fail_reads: bool,
    revert_register: bool,
    revert_set_record: bool,
    order: Vec<String>,
    entries: HashMap<String, Entry>,
    read_delays: HashMap<String, Duration>,
    tx_delay: Option<Duration>,
    requests: Vec<(String, serde_json::Value)>,
    transactions: Vec<RecordedTx>,
    receipts: HashMap<TxHash, bool>,
}

/// Scripted wallet in front of an in-memory name-service contract.
pub struct FakeChain {
    state: Mutex<State>,
    chain_tx: broadcast::Sender<ChainId>,
}

fn provider_error(code: i64, message: &str) -> NameServiceError {
    ProviderRpcError::new(code, message).into()
}

impl FakeChain {
    /// One account, already on the target network, not yet authorized.
    pub fn new() -> Arc<Self> {
        let (chain_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(State {
                accounts: vec![Address::repeat_byte(0xa1)],
                authorized: false,
                chain: ChainId::TARGET,
                known_chains: [ChainId(1), ChainId::TARGET].into_iter().collect(),
                switch_after_add: true,
                switch_failure: None,
                reject_connect: false,
                reject_transactions: false,
                locked: false,
                fail_reads: false,
                revert_register: false,
                revert_set_record: false,
                order: Vec::new(),
                entries: HashMap::new(),
                read_delays: HashMap::new(),
                tx_delay: None,
                requests: Vec::new(),
                transactions: Vec::new(),
                receipts: HashMap::new(),
            }),
            chain_tx,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCRIPTING
    // ═══════════════════════════════════════════════════════════════════════════

    /// The wallet's (first) account.
    pub fn account(&self) -> Address {
        self.state.lock().accounts[0]
    }

    /// Replaces the wallet's accounts.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts;
    }

    /// Marks the account as already connected (so `eth_accounts` returns it).
    pub fn authorize(&self) {
        self.state.lock().authorized = true;
    }

    /// Sets the active chain without notifying listeners.
    pub fn set_chain_silently(&self, chain: ChainId) {
        self.state.lock().chain = chain;
    }

    /// Simulates the user switching network in the wallet.
    pub fn switch_externally(&self, chain: ChainId) {
        self.state.lock().chain = chain;
        let _ = self.chain_tx.send(chain);
    }

    /// Makes the wallet forget a chain (switching to it yields 4902).
    pub fn forget_chain(&self, chain: ChainId) {
        self.state.lock().known_chains.remove(&chain);
    }

    /// Whether the wallet switches to a chain right after adding it.
    pub fn set_switch_after_add(&self, switch: bool) {
        self.state.lock().switch_after_add = switch;
    }

    /// Makes `wallet_switchEthereumChain` fail with `code`.
    pub fn fail_switch_with(&self, code: i64) {
        self.state.lock().switch_failure = Some(code);
    }

    /// Makes `eth_requestAccounts` fail with a user rejection.
    pub fn set_reject_connect(&self, reject: bool) {
        self.state.lock().reject_connect = reject;
    }

    /// Makes `eth_sendTransaction` fail with a user rejection.
    pub fn set_reject_transactions(&self, reject: bool) {
        self.state.lock().reject_transactions = reject;
    }

    /// Makes `eth_accounts` fail with 4100, like a locked wallet.
    pub fn set_locked(&self, locked: bool) {
        self.state.lock().locked = locked;
    }

    /// Makes every `eth_call` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Makes `register` transactions revert.
    pub fn set_revert_register(&self, revert: bool) {
        self.state.lock().revert_register = revert;
    }

    /// Makes `setRecord` transactions revert.
    pub fn set_revert_set_record(&self, revert: bool) {
        self.state.lock().revert_set_record = revert;
    }

    /// Delays record/owner reads for `name`.
    pub fn delay_reads(&self, name: &str, delay: Duration) {
        self.state.lock().read_delays.insert(name.to_string(), delay);
    }

    /// Delays every `eth_sendTransaction` (the user taking time to sign).
    pub fn delay_transactions(&self, delay: Duration) {
        self.state.lock().tx_delay = Some(delay);
    }

    /// Registers `name` directly in contract storage.
    pub fn seed_name(&self, name: &str, owner: Address, record: &str) {
        let mut state = self.state.lock();
        state.order.push(name.to_string());
        state.entries.insert(
            name.to_string(),
            Entry {
                owner,
                record: record.to_string(),
            },
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.state.lock().requests.clone()
    }

    /// Number of requests for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state.lock().requests.iter().filter(|(m, _)| m == method).count()
    }

    /// Number of `getAllNames()` reads.
    pub fn directory_reads(&self) -> usize {
        let selector = format!("0x{}", hex::encode(IDomains::getAllNamesCall::SELECTOR));
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(m, p)| m == "eth_call" && p[0]["data"] == selector.as_str())
            .count()
    }

    /// Accepted transactions, in order.
    pub fn transactions(&self) -> Vec<RecordedTx> {
        self.state.lock().transactions.clone()
    }

    /// The active chain.
    pub fn chain(&self) -> ChainId {
        self.state.lock().chain
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HANDLERS
    // ═══════════════════════════════════════════════════════════════════════════

    fn request_accounts(&self) -> Result<serde_json::Value> {
        {
            let mut state = self.state.lock();
            if state.reject_connect {
                return Err(provider_error(USER_REJECTED_REQUEST, "User rejected the request."));
            }
            state.authorized = true;
        }
        Ok(self.authorized_accounts())
    }

    fn authorized_accounts(&self) -> serde_json::Value {
        let state = self.state.lock();
        let accounts: Vec<String> = if state.authorized {
            state.accounts.iter().map(|a| format!("{:#x}", a)).collect()
        } else {
            Vec::new()
        };
        serde_json::json!(accounts)
    }

    fn switch_chain(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let target = params[0]["chainId"]
            .as_str()
            .map(ChainId::parse)
            .transpose()?
            .ok_or_else(|| provider_error(-32602, "missing chainId"))?;

        let mut state = self.state.lock();
        if let Some(code) = state.switch_failure {
            return Err(provider_error(code, "switch failed"));
        }
        if !state.known_chains.contains(&target) {
            return Err(provider_error(UNRECOGNIZED_CHAIN, "Unrecognized chain ID"));
        }
        state.chain = target;
        drop(state);

        let _ = self.chain_tx.send(target);
        Ok(serde_json::Value::Null)
    }

    fn add_chain(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let chain = params[0]["chainId"]
            .as_str()
            .map(ChainId::parse)
            .transpose()?
            .ok_or_else(|| provider_error(-32602, "missing chainId"))?;

        let mut state = self.state.lock();
        state.known_chains.insert(chain);
        if state.switch_after_add {
            state.chain = chain;
            drop(state);
            let _ = self.chain_tx.send(chain);
        }
        Ok(serde_json::Value::Null)
    }

    async fn eth_call(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let data = hex::decode(params[0]["data"].as_str().unwrap_or("0x").trim_start_matches("0x"))?;
        let call = IDomainsCalls::abi_decode(&data, true)
            .map_err(|e| provider_error(-32000, &format!("execution reverted: {}", e)))?;

        let delay = {
            let state = self.state.lock();
            if state.fail_reads {
                return Err(provider_error(-32603, "header not found"));
            }
            match &call {
                IDomainsCalls::records(c) => state.read_delays.get(&c.name).copied(),
                IDomainsCalls::domains(c) => state.read_delays.get(&c.name).copied(),
                _ => None,
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        let ret = match call {
            IDomainsCalls::getAllNames(_) => (state.order.clone(),).abi_encode_params(),
            IDomainsCalls::records(c) => {
                let record = state.entries.get(&c.name).map(|e| e.record.clone()).unwrap_or_default();
                (record,).abi_encode_params()
            }
            IDomainsCalls::domains(c) => {
                let owner = state.entries.get(&c.name).map(|e| e.owner).unwrap_or_default();
                (owner,).abi_encode_params()
            }
            _ => return Err(provider_error(-32000, "execution reverted")),
        };
        Ok(serde_json::json!(format!("0x{}", hex::encode(ret))))
    }

    fn send_transaction(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let tx = &params[0];
        let from = parse_address(tx["from"].as_str().unwrap_or_default())?;
        let value = tx["value"]
            .as_str()
            .unwrap_or("0x0")
            .parse::<U256>()
            .map_err(|e| provider_error(-32602, &e.to_string()))?;
        let data = hex::decode(tx["data"].as_str().unwrap_or("0x").trim_start_matches("0x"))?;
        let call = IDomainsCalls::abi_decode(&data, true)
            .map_err(|e| provider_error(-32602, &e.to_string()))?;

        let mut state = self.state.lock();
        if state.reject_transactions {
            return Err(provider_error(USER_REJECTED_REQUEST, "User denied transaction signature."));
        }

        let (description, success) = match call {
            IDomainsCalls::register(c) => {
                let ok = !state.revert_register && !state.entries.contains_key(&c.name);
                if ok {
                    state.order.push(c.name.clone());
                    state.entries.insert(c.name.clone(), Entry { owner: from, record: String::new() });
                }
                (format!("register({})", c.name), ok)
            }
            IDomainsCalls::setRecord(c) => {
                let owned = state.entries.get(&c.name).is_some_and(|e| e.owner == from);
                let ok = !state.revert_set_record && owned;
                if ok {
                    if let Some(entry) = state.entries.get_mut(&c.name) {
                        entry.record = c.record.clone();
                    }
                }
                (format!("setRecord({},{})", c.name, c.record), ok)
            }
            _ => return Err(provider_error(-32602, "not a transaction")),
        };

        let nonce = state.transactions.len() as u64 + 1;
        let hash = TxHash::left_padding_from(&nonce.to_be_bytes());
        state.receipts.insert(hash, success);
        state.transactions.push(RecordedTx {
            hash,
            from,
            value,
            call: description,
        });
        Ok(serde_json::json!(format!("{:#x}", hash)))
    }

    fn receipt(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let hash = params[0]
            .as_str()
            .unwrap_or_default()
            .parse::<TxHash>()
            .map_err(|e| provider_error(-32602, &e.to_string()))?;

        let state = self.state.lock();
        Ok(match state.receipts.get(&hash) {
            Some(success) => serde_json::json!({
                "transactionHash": format!("{:#x}", hash),
                "status": if *success { "0x1" } else { "0x0" },
                "blockNumber": "0x1",
            }),
            None => serde_json::Value::Null,
        })
    }
}

#[async_trait]
impl WalletProvider for FakeChain {
    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        self.state.lock().requests.push((method.to_string(), params.clone()));

        match method {
            "eth_requestAccounts" => self.request_accounts(),
            "eth_accounts" => {
                if self.state.lock().locked {
                    return Err(provider_error(UNAUTHORIZED, "wallet locked"));
                }
                Ok(self.authorized_accounts())
            }
            "eth_chainId" => {
                let chain = self.chain();
                Ok(serde_json::json!(chain.to_hex()))
            }
            "wallet_switchEthereumChain" => self.switch_chain(&params),
            "wallet_addEthereumChain" => self.add_chain(&params),
            "eth_call" => self.eth_call(&params).await,
            "eth_sendTransaction" => {
                let delay = self.state.lock().tx_delay;
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                self.send_transaction(&params)
            }
            "eth_getTransactionReceipt" => self.receipt(&params),
            _ => Err(provider_error(UNSUPPORTED_METHOD, "Unsupported method")),
        }
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId> {
        self.chain_tx.subscribe()
    }
}
