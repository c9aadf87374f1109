//! JSON-RPC wallet provider over HTTP.
//!
//! Talks to a node or wallet bridge exposing the standard `eth_*` account
//! methods. HTTP has no push channel, so account and chain changes are
//! detected by polling on a background thread while listeners are attached.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::provider::{
    ListenerRegistry, ProviderError, ProviderEvent, ProviderResult, RpcMethod, SubscriptionId,
    WalletProvider,
};

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Decodes a JSON-RPC response body into its result value.
fn decode_response(body: &str) -> ProviderResult<Value> {
    let response: RpcResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    if let Some(error) = response.error {
        if error.code == USER_REJECTED_CODE {
            return Err(ProviderError::Rejected(error.message));
        }
        return Err(ProviderError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| ProviderError::InvalidResponse("response has neither result nor error".to_string()))
}

#[derive(Debug)]
struct RpcClient {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    fn call(&self, method: RpcMethod) -> ProviderResult<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.as_str(),
            params: Vec::new(),
        };
        let body = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .and_then(|response| response.text())
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        decode_response(&body)
    }
}

/// Remembers the last observed wallet state and reports differences.
#[derive(Debug, Default)]
struct ChangeTracker {
    accounts: Option<Vec<String>>,
    chain_id: Option<String>,
}

impl ChangeTracker {
    /// The first observation only primes the tracker.
    fn observe_accounts(&mut self, accounts: Vec<String>) -> Option<ProviderEvent> {
        let previous = self.accounts.replace(accounts.clone())?;
        (previous != accounts).then_some(ProviderEvent::AccountsChanged(accounts))
    }

    fn observe_chain(&mut self, chain_id: String) -> Option<ProviderEvent> {
        let previous = self.chain_id.replace(chain_id.clone())?;
        (previous != chain_id).then_some(ProviderEvent::ChainChanged(chain_id))
    }
}

/// Wallet provider reached through a JSON-RPC HTTP endpoint.
pub struct HttpProvider {
    rpc: Arc<RpcClient>,
    listeners: Arc<ListenerRegistry>,
    poll_interval: Duration,
    poller_started: AtomicBool,
    stop: Arc<AtomicBool>,
}

impl HttpProvider {
    /// Builds the HTTP client. Must be called outside of an async context.
    pub fn new(url: impl Into<String>, poll_interval: Duration) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            rpc: Arc::new(RpcClient {
                url: url.into(),
                client,
                next_id: AtomicU64::new(1),
            }),
            listeners: Arc::new(ListenerRegistry::default()),
            poll_interval,
            poller_started: AtomicBool::new(false),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn url(&self) -> &str {
        &self.rpc.url
    }

    fn start_poller(&self) {
        if self.poller_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let rpc = Arc::clone(&self.rpc);
        let listeners = Arc::clone(&self.listeners);
        let stop = Arc::clone(&self.stop);
        let interval = self.poll_interval;
        info!(url = %rpc.url, ?interval, "starting provider poller");
        thread::spawn(move || poll_loop(|method| rpc.call(method), &listeners, interval, &stop));
    }
}

fn poll_loop<F>(call: F, listeners: &ListenerRegistry, interval: Duration, stop: &AtomicBool)
where
    F: Fn(RpcMethod) -> ProviderResult<Value>,
{
    let mut tracker = ChangeTracker::default();
    while !stop.load(Ordering::Relaxed) {
        if !listeners.is_empty() {
            poll_once(&call, &mut tracker, listeners);
        }
        thread::sleep(interval);
    }
    debug!("provider poller stopped");
}

/// Queries accounts and chain once and emits whatever changed since the
/// previous round.
fn poll_once<F>(call: &F, tracker: &mut ChangeTracker, listeners: &ListenerRegistry)
where
    F: Fn(RpcMethod) -> ProviderResult<Value>,
{
    let accounts = call(RpcMethod::Accounts).and_then(|value| {
        serde_json::from_value::<Vec<String>>(value)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    });
    match accounts {
        Ok(accounts) => {
            if let Some(event) = tracker.observe_accounts(accounts) {
                listeners.emit(event);
            }
        }
        Err(e) => debug!(error = %e, "account poll failed"),
    }

    let chain = call(RpcMethod::ChainId).and_then(|value| {
        serde_json::from_value::<String>(value)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    });
    match chain {
        Ok(chain_id) => {
            if let Some(event) = tracker.observe_chain(chain_id) {
                listeners.emit(event);
            }
        }
        Err(e) => debug!(error = %e, "chain poll failed"),
    }
}

impl WalletProvider for HttpProvider {
    fn request(&self, method: RpcMethod) -> ProviderResult<Value> {
        let result = self.rpc.call(method);
        if let Err(ref e) = result {
            warn!(method = method.as_str(), error = %e, "provider request failed");
        }
        result
    }

    fn add_listener(&self, listener: UnboundedSender<ProviderEvent>) -> SubscriptionId {
        self.start_poller();
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
