//! Wallet provider boundary.
//!
//! A provider answers account queries and pushes account/network change
//! events. The application never implements a wallet; it only talks to one
//! through [`WalletProvider`].

use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Requests the application issues to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    /// Non-intrusive query for already-authorized accounts.
    Accounts,
    /// Prompts the user to authorize the application.
    RequestAccounts,
    ChainId,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::Accounts => "eth_accounts",
            RpcMethod::RequestAccounts => "eth_requestAccounts",
            RpcMethod::ChainId => "eth_chainId",
        }
    }
}

/// Notifications pushed by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Ordered account list; empty means the wallet is no longer connected.
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("No wallet provider found")]
    NotFound,
    #[error("{0}")]
    Rejected(String),
    #[error("Provider request failed: {0}")]
    Transport(String),
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("Provider error {code}: {message}")]
    Rpc { code: i64, message: String },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

pub type SubscriptionId = u64;

/// An injected wallet such as a browser extension or a JSON-RPC node.
///
/// Requests may block; callers on the UI loop run them on a blocking task.
pub trait WalletProvider: Send + Sync {
    fn request(&self, method: RpcMethod) -> ProviderResult<Value>;

    /// Registers `listener` for account and chain events.
    fn add_listener(&self, listener: UnboundedSender<ProviderEvent>) -> SubscriptionId;

    fn remove_listener(&self, id: SubscriptionId);
}

/// Issues an account request and decodes the address list.
pub fn request_accounts(provider: &dyn WalletProvider, method: RpcMethod) -> ProviderResult<Vec<String>> {
    let value = provider.request(method)?;
    serde_json::from_value(value).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

/// Listener bookkeeping shared by provider implementations.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    inner: Mutex<Listeners>,
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, UnboundedSender<ProviderEvent>)>,
}

impl ListenerRegistry {
    pub fn add(&self, listener: UnboundedSender<ProviderEvent>) -> SubscriptionId {
        let mut listeners = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, listener));
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        let mut listeners = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Delivers `event` to every live listener and forgets closed ones.
    pub fn emit(&self, event: ProviderEvent) {
        let mut listeners = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        listeners
            .entries
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped provider event subscription.
///
/// The listener is removed from the provider exactly once, either through
/// [`EventSubscription::release`] or when the guard is dropped.
pub struct EventSubscription {
    provider: Arc<dyn WalletProvider>,
    id: Option<SubscriptionId>,
}

impl EventSubscription {
    pub fn new(provider: Arc<dyn WalletProvider>, listener: UnboundedSender<ProviderEvent>) -> Self {
        let id = provider.add_listener(listener);
        Self {
            provider,
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn release(mut self) {
        self.unsubscribe();
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            self.provider.remove_listener(id);
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription").field("id", &self.id).finish()
    }
}
