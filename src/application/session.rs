//! Wallet connection state.
//!
//! [`WalletSession`] owns the provider handle and the event subscription and
//! publishes every state change on a watch channel.

use std::sync::Arc;

use tokio::sync::{mpsc::UnboundedSender, watch};
use tracing::{error, info, warn};

use crate::domain::SessionState;
use crate::infrastructure::{
    request_accounts, EventSubscription, ProviderError, ProviderEvent, ProviderResult, RpcMethod,
    WalletProvider,
};

/// What the owner of a session has to do after a provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Updated,
    /// The network changed; every piece of session and proposal state is stale.
    Reload,
}

/// Tracks whether a wallet is connected and which account is active.
///
/// Provider requests can block, so the connect and initialize flows come in
/// two halves: the caller runs the provider request wherever it likes and
/// hands the result to `complete_*`. [`WalletSession::initialize`] and
/// [`WalletSession::connect`] run both halves inline.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    state: SessionState,
    notifier: watch::Sender<SessionState>,
    subscription: Option<EventSubscription>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let (notifier, _) = watch::channel(SessionState::disconnected());
        Self {
            provider,
            state: SessionState::disconnected(),
            notifier,
            subscription: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected
    }

    pub fn account(&self) -> &str {
        &self.state.account
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    /// Receives `(is_connected, account)` after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.notifier.subscribe()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Registers for provider account and chain events.
    ///
    /// Returns `false` when no provider is installed. Attaching twice keeps
    /// the first subscription.
    pub fn attach(&mut self, events: UnboundedSender<ProviderEvent>) -> bool {
        let Some(provider) = self.provider.clone() else {
            return false;
        };
        if self.subscription.is_none() {
            self.subscription = Some(EventSubscription::new(provider, events));
        }
        true
    }

    /// Releases the provider subscription, if any.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
    }

    /// Subscribes to provider events and adopts any already-authorized account
    /// without prompting the user.
    pub fn initialize(&mut self, events: UnboundedSender<ProviderEvent>) {
        if !self.attach(events) {
            return;
        }
        if let Some(provider) = self.provider.clone() {
            let result = request_accounts(provider.as_ref(), RpcMethod::Accounts);
            self.complete_initialize(result);
        }
    }

    /// Applies the result of an `eth_accounts` query. Failures are only logged.
    pub fn complete_initialize(&mut self, result: ProviderResult<Vec<String>>) {
        match result {
            Ok(accounts) => {
                if let Some(account) = accounts.into_iter().next() {
                    info!(%account, "wallet already authorized");
                    self.set_state(SessionState::connected(account));
                }
            }
            Err(e) => error!(error = %e, "error checking wallet connection"),
        }
    }

    /// Prompts the user through the provider and connects the primary account.
    pub fn connect(&mut self) -> ProviderResult<String> {
        let provider = self.provider.clone().ok_or(ProviderError::NotFound)?;
        let result = request_accounts(provider.as_ref(), RpcMethod::RequestAccounts);
        self.complete_connect(result)
    }

    /// Applies the result of an `eth_requestAccounts` prompt.
    ///
    /// # Errors
    ///
    /// Passes provider errors through unchanged and reports an empty account
    /// list as [`ProviderError::InvalidResponse`]. The session state is only
    /// touched on success.
    pub fn complete_connect(&mut self, result: ProviderResult<Vec<String>>) -> ProviderResult<String> {
        let account = result
            .and_then(|accounts| {
                accounts
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProviderError::InvalidResponse("provider returned no accounts".to_string()))
            })
            .inspect_err(|e| warn!(error = %e, "wallet connection failed"))?;
        info!(%account, "wallet connected");
        self.set_state(SessionState::connected(account.clone()));
        Ok(account)
    }

    /// Forgets the connection locally; providers offer no revocation.
    pub fn disconnect(&mut self) {
        info!("wallet disconnected");
        self.set_state(SessionState::disconnected());
    }

    pub fn handle_event(&mut self, event: ProviderEvent) -> SessionOutcome {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                match accounts.into_iter().next() {
                    Some(account) => {
                        info!(%account, "active account changed");
                        self.set_state(SessionState::connected(account));
                    }
                    None => {
                        info!("provider reported no accounts");
                        self.set_state(SessionState::disconnected());
                    }
                }
                SessionOutcome::Updated
            }
            ProviderEvent::ChainChanged(chain_id) => {
                warn!(%chain_id, "network changed, reloading");
                SessionOutcome::Reload
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state.clone();
        self.notifier.send_replace(state);
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("state", &self.state)
            .field("has_provider", &self.provider.is_some())
            .field("subscription", &self.subscription)
            .finish()
    }
}
