//! In-process wallet used for demos and tests.

use std::sync::Mutex;

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::provider::{
    ListenerRegistry, ProviderError, ProviderEvent, ProviderResult, RpcMethod, SubscriptionId,
    WalletProvider,
};

pub const DEFAULT_CHAIN_ID: &str = "0x1";

#[derive(Debug)]
struct WalletState {
    accounts: Vec<String>,
    authorized: bool,
    rejecting: bool,
    chain_id: String,
}

/// A wallet with a fixed account list that behaves like a browser extension.
///
/// Accounts are only reported by `eth_accounts` after the user has approved
/// `eth_requestAccounts` (or the wallet was created pre-authorized).
#[derive(Debug)]
pub struct DevWallet {
    state: Mutex<WalletState>,
    listeners: ListenerRegistry,
}

impl DevWallet {
    pub fn new(accounts: Vec<String>) -> Self {
        Self {
            state: Mutex::new(WalletState {
                accounts,
                authorized: false,
                rejecting: false,
                chain_id: DEFAULT_CHAIN_ID.to_string(),
            }),
            listeners: ListenerRegistry::default(),
        }
    }

    /// A wallet that already trusts the application.
    pub fn authorized(accounts: Vec<String>) -> Self {
        let wallet = Self::new(accounts);
        wallet.lock().authorized = true;
        wallet
    }

    /// Makes every following connection prompt fail as if the user declined.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.lock().rejecting = rejecting;
    }

    /// Moves `account` to the front of the list and notifies listeners.
    pub fn switch_account(&self, account: &str) {
        let accounts = {
            let mut state = self.lock();
            state.accounts.retain(|a| a != account);
            state.accounts.insert(0, account.to_string());
            if !state.authorized {
                return;
            }
            state.accounts.clone()
        };
        self.listeners.emit(ProviderEvent::AccountsChanged(accounts));
    }

    /// Revokes authorization; listeners see an empty account list.
    pub fn lock_wallet(&self) {
        self.lock().authorized = false;
        self.listeners.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }

    pub fn switch_chain(&self, chain_id: &str) {
        self.lock().chain_id = chain_id.to_string();
        self.listeners.emit(ProviderEvent::ChainChanged(chain_id.to_string()));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WalletProvider for DevWallet {
    fn request(&self, method: RpcMethod) -> ProviderResult<Value> {
        debug!(method = method.as_str(), "dev wallet request");
        let mut state = self.lock();
        match method {
            RpcMethod::Accounts => {
                if state.authorized {
                    Ok(json!(state.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            RpcMethod::RequestAccounts => {
                if state.rejecting {
                    return Err(ProviderError::Rejected("User rejected the request.".to_string()));
                }
                if state.accounts.is_empty() {
                    return Err(ProviderError::Rejected("Wallet has no accounts".to_string()));
                }
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            RpcMethod::ChainId => Ok(json!(state.chain_id)),
        }
    }

    fn add_listener(&self, listener: UnboundedSender<ProviderEvent>) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::request_accounts;
    use tokio::sync::mpsc;

    fn accounts() -> Vec<String> {
        vec!["0x1111".to_string(), "0x2222".to_string()]
    }

    #[test]
    fn test_accounts_hidden_until_authorized() {
        let wallet = DevWallet::new(accounts());
        assert!(request_accounts(&wallet, RpcMethod::Accounts).unwrap().is_empty());

        let granted = request_accounts(&wallet, RpcMethod::RequestAccounts).unwrap();
        assert_eq!(granted, accounts());
        assert_eq!(request_accounts(&wallet, RpcMethod::Accounts).unwrap(), accounts());
    }

    #[test]
    fn test_rejecting_wallet() {
        let wallet = DevWallet::new(accounts());
        wallet.set_rejecting(true);
        let result = request_accounts(&wallet, RpcMethod::RequestAccounts);
        assert!(matches!(result, Err(ProviderError::Rejected(_))));
        assert!(request_accounts(&wallet, RpcMethod::Accounts).unwrap().is_empty());
    }

    #[test]
    fn test_events_reach_listeners() {
        let wallet = DevWallet::authorized(accounts());
        let (tx, mut rx) = mpsc::unbounded_channel();
        wallet.add_listener(tx);

        wallet.switch_account("0x2222");
        assert_eq!(
            rx.try_recv().unwrap(),
            ProviderEvent::AccountsChanged(vec!["0x2222".to_string(), "0x1111".to_string()])
        );

        wallet.lock_wallet();
        assert_eq!(rx.try_recv().unwrap(), ProviderEvent::AccountsChanged(Vec::new()));

        wallet.switch_chain("0x5");
        assert_eq!(rx.try_recv().unwrap(), ProviderEvent::ChainChanged("0x5".to_string()));
    }

    #[test]
    fn test_account_switch_silent_while_unauthorized() {
        let wallet = DevWallet::new(accounts());
        let (tx, mut rx) = mpsc::unbounded_channel();
        wallet.add_listener(tx);

        wallet.switch_account("0x2222");
        assert!(rx.try_recv().is_err());
    }
}
