//! Application state management for the voting terminal.
//!
//! This module contains the main application state and mode management for
//! the terminal user interface. Every store mutation goes through
//! [`VotingWorkflow`]; the presentation layer only reads from [`App`] and
//! calls its intent methods.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc::UnboundedSender, watch};
use tokio::task::JoinSet;
use tracing::debug;

use crate::domain::{DomainError, Proposal, ProposalId, ProposalStore, SessionState};
use crate::infrastructure::{
    request_accounts, ProviderError, ProviderEvent, ProviderResult, RpcMethod, Settings,
    WalletProvider,
};

use super::mascot::Mascot;
use super::notifications::{Notification, NotificationSink, ToastQueue};
use super::session::{SessionOutcome, WalletSession};
use super::workflow::{Operation, PendingSubmission, PendingVote, VotingWorkflow};

/// Represents the current mode of the application.
///
/// The mode determines how key presses are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Browsing proposals; single-key shortcuts are active
    Normal,
    /// Typing into the proposal form
    Editing,
    /// Help screen is displayed
    Help,
}

/// Results of background work, delivered back to the UI loop.
#[derive(Debug)]
pub enum AppMessage {
    /// Answer to the start-up `eth_accounts` query.
    AuthorizedAccounts(ProviderResult<Vec<String>>),
    /// Answer to the `eth_requestAccounts` prompt.
    ConnectFinished(ProviderResult<Vec<String>>),
    SubmissionConfirmed {
        pending: PendingSubmission,
        outcome: Result<(), String>,
    },
    VoteConfirmed {
        pending: PendingVote,
        outcome: Result<(), String>,
    },
}

/// Everything needed to build a fresh [`App`].
#[derive(Clone)]
pub struct AppOptions {
    pub provider: Option<Arc<dyn WalletProvider>>,
    pub workflow: VotingWorkflow,
    pub store: ProposalStore,
    pub toast_duration: Duration,
}

impl AppOptions {
    /// Options as described by `settings`, using an already built provider.
    pub fn from_settings(settings: &Settings, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let store = if settings.ui.seed_demo_proposals {
            ProposalStore::demo()
        } else {
            ProposalStore::new()
        };
        Self {
            provider,
            workflow: VotingWorkflow::simulated(
                settings.workflow.submit_delay(),
                settings.workflow.vote_delay(),
            ),
            store: store.with_description_limit(settings.workflow.max_description_chars),
            toast_duration: settings.ui.toast_duration(),
        }
    }
}

/// Main application state containing the proposals, the wallet session and
/// UI state.
///
/// # Examples
///
/// ```
/// use clubvote::application::{App, AppMode, AppOptions, VotingWorkflow};
/// use clubvote::domain::ProposalStore;
/// use std::time::Duration;
/// use tokio::sync::mpsc;
///
/// let (messages, _) = mpsc::unbounded_channel();
/// let (events, _) = mpsc::unbounded_channel();
/// let app = App::new(
///     AppOptions {
///         provider: None,
///         workflow: VotingWorkflow::immediate(),
///         store: ProposalStore::demo(),
///         toast_duration: Duration::from_secs(4),
///     },
///     messages,
///     events,
/// );
/// assert_eq!(app.mode, AppMode::Normal);
/// assert_eq!(app.store.len(), 3);
/// assert!(!app.session.is_connected());
/// ```
pub struct App {
    /// Proposals shown in the list
    pub store: ProposalStore,
    /// Wallet connection
    pub session: WalletSession,
    workflow: VotingWorkflow,
    /// Current application mode
    pub mode: AppMode,
    /// Proposal form text
    pub input: String,
    /// Cursor position within the form text, in characters
    pub cursor_position: usize,
    /// Index of the highlighted proposal card
    pub selected: usize,
    /// A connection prompt is open in the wallet
    pub connecting: bool,
    /// A proposal submission is waiting for confirmation
    pub submitting: bool,
    /// Proposals with a vote waiting for confirmation
    pub voting: HashSet<ProposalId>,
    pub toasts: ToastQueue,
    pub mascot: Mascot,
    /// Scroll position in help text
    pub help_scroll: usize,
    pub should_quit: bool,
    /// Set when the network changed and all state must be rebuilt
    pub reload_requested: bool,
    messages: UnboundedSender<AppMessage>,
    events: UnboundedSender<ProviderEvent>,
    session_changes: watch::Receiver<SessionState>,
    /// Running confirmation delays; aborted when the app is dropped.
    confirmations: JoinSet<()>,
}

impl App {
    /// Builds the state. Background work only starts with [`App::start`].
    pub fn new(
        options: AppOptions,
        messages: UnboundedSender<AppMessage>,
        events: UnboundedSender<ProviderEvent>,
    ) -> Self {
        let session = WalletSession::new(options.provider);
        let session_changes = session.subscribe();
        let mut app = Self {
            store: options.store,
            session,
            workflow: options.workflow,
            mode: AppMode::Normal,
            input: String::new(),
            cursor_position: 0,
            selected: 0,
            connecting: false,
            submitting: false,
            voting: HashSet::new(),
            toasts: ToastQueue::new(options.toast_duration),
            mascot: Mascot::default(),
            help_scroll: 0,
            should_quit: false,
            reload_requested: false,
            messages,
            events,
            session_changes,
            confirmations: JoinSet::new(),
        };
        app.refresh_mascot();
        app
    }

    /// Subscribes to provider events and looks for an already-authorized
    /// account without prompting. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        if !self.session.attach(self.events.clone()) {
            debug!("no wallet provider installed");
            return;
        }
        let Some(provider) = self.session.provider() else {
            return;
        };
        let messages = self.messages.clone();
        tokio::task::spawn_blocking(move || {
            let result = request_accounts(provider.as_ref(), RpcMethod::Accounts);
            let _ = messages.send(AppMessage::AuthorizedAccounts(result));
        });
    }

    pub fn notify(&mut self, notification: Notification) {
        self.toasts.notify(notification);
    }

    /// Opens the wallet's connection prompt.
    pub fn connect_wallet(&mut self) {
        if self.connecting || self.session.is_connected() {
            return;
        }
        let Some(provider) = self.session.provider() else {
            self.notify(Notification::connection_failed(&ProviderError::NotFound));
            return;
        };
        self.connecting = true;
        let messages = self.messages.clone();
        tokio::task::spawn_blocking(move || {
            let result = request_accounts(provider.as_ref(), RpcMethod::RequestAccounts);
            let _ = messages.send(AppMessage::ConnectFinished(result));
        });
    }

    pub fn disconnect_wallet(&mut self) {
        if !self.session.is_connected() {
            return;
        }
        self.session.disconnect();
        self.notify(Notification::wallet_disconnected());
        self.sync_session_changes();
    }

    /// Switches to the proposal form. The form is locked while disconnected.
    pub fn start_editing(&mut self) {
        if !self.session.is_connected() {
            self.notify(Notification::submission_error(&DomainError::NotConnected));
            return;
        }
        self.mode = AppMode::Editing;
        self.cursor_position = self.input.chars().count();
    }

    /// Leaves the form, keeping its text.
    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let index = self.byte_index();
        self.input.remove(index);
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            let index = self.byte_index();
            self.input.remove(index);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(index, _)| index)
            .unwrap_or(self.input.len())
    }

    /// Length of the form text in characters.
    pub fn input_length(&self) -> usize {
        self.input.chars().count()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.session.is_connected()
            && !self.submitting
            && !self.input.trim().is_empty()
            && self.input_length() <= self.store.description_limit()
    }

    /// Validates the form and starts the submission confirmation.
    pub fn submit_proposal(&mut self) {
        if self.submitting {
            return;
        }
        let pending = match self
            .workflow
            .begin_submission(self.session.state(), &self.store, &self.input)
        {
            Ok(pending) => pending,
            Err(e) => {
                self.notify(Notification::submission_error(&e));
                return;
            }
        };
        self.submitting = true;
        let confirmation = self.workflow.confirm(Operation::SubmitProposal);
        let messages = self.messages.clone();
        self.confirmations.spawn(async move {
            let outcome = confirmation.await;
            let _ = messages.send(AppMessage::SubmissionConfirmed { pending, outcome });
        });
    }

    pub fn selected_proposal(&self) -> Option<&Proposal> {
        self.store.list().get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.store.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn vote_selected(&mut self) {
        if let Some(id) = self.selected_proposal().map(|p| p.id) {
            self.cast_vote(id);
        }
    }

    /// Validates and starts the vote confirmation for `proposal_id`.
    pub fn cast_vote(&mut self, proposal_id: ProposalId) {
        if self.voting.contains(&proposal_id) {
            return;
        }
        let pending = match self
            .workflow
            .begin_vote(self.session.state(), &self.store, proposal_id)
        {
            Ok(pending) => pending,
            Err(e) => {
                self.notify(Notification::vote_error(&e));
                return;
            }
        };
        self.voting.insert(proposal_id);
        let confirmation = self.workflow.confirm(Operation::CastVote(proposal_id));
        let messages = self.messages.clone();
        self.confirmations.spawn(async move {
            let outcome = confirmation.await;
            let _ = messages.send(AppMessage::VoteConfirmed { pending, outcome });
        });
    }

    pub fn is_voting_on(&self, proposal_id: ProposalId) -> bool {
        self.voting.contains(&proposal_id)
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::AuthorizedAccounts(result) => {
                self.session.complete_initialize(result);
            }
            AppMessage::ConnectFinished(result) => {
                self.connecting = false;
                match self.session.complete_connect(result) {
                    Ok(_) => self.notify(Notification::wallet_connected()),
                    Err(e) => self.notify(Notification::connection_failed(&e)),
                }
            }
            AppMessage::SubmissionConfirmed { pending, outcome } => {
                self.submitting = false;
                match self.workflow.finish_submission(&mut self.store, pending, outcome) {
                    Ok(_) => {
                        self.input.clear();
                        self.cursor_position = 0;
                        self.mode = AppMode::Normal;
                        self.selected = 0;
                        self.notify(Notification::proposal_submitted());
                    }
                    Err(e) => self.notify(Notification::submission_error(&e)),
                }
            }
            AppMessage::VoteConfirmed { pending, outcome } => {
                self.voting.remove(&pending.proposal_id());
                match self.workflow.finish_vote(&mut self.store, pending, outcome) {
                    Ok(_) => self.notify(Notification::vote_cast()),
                    Err(e) => self.notify(Notification::vote_error(&e)),
                }
            }
        }
        self.sync_session_changes();
    }

    pub fn handle_provider_event(&mut self, event: ProviderEvent) {
        if self.session.handle_event(event) == SessionOutcome::Reload {
            self.reload_requested = true;
        }
        self.sync_session_changes();
    }

    pub fn set_copy_result(&mut self, result: Result<(), String>) {
        self.notify(Notification::copy_result(result));
    }

    /// Periodic housekeeping driven by the UI loop.
    pub fn tick(&mut self, now: Instant) {
        while self.confirmations.try_join_next().is_some() {}
        self.toasts.expire(now);
        self.sync_session_changes();
    }

    /// Propagates session changes to the parts of the UI derived from them.
    pub fn sync_session_changes(&mut self) {
        if self.session_changes.has_changed().unwrap_or(false) {
            let state = self.session_changes.borrow_and_update().clone();
            debug!(connected = state.is_connected, account = %state.account, "session changed");
            if !state.is_connected && self.mode == AppMode::Editing {
                self.mode = AppMode::Normal;
            }
        }
        self.refresh_mascot();
    }

    fn refresh_mascot(&mut self) {
        let connected = self.session.is_connected();
        let count = self.store.len();
        self.mascot.refresh(connected, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{FailingConfirmation, Severity};
    use crate::infrastructure::DevWallet;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Harness {
        app: App,
        messages: UnboundedReceiver<AppMessage>,
        events: UnboundedReceiver<ProviderEvent>,
        wallet: Arc<DevWallet>,
    }

    impl Harness {
        fn new(wallet: DevWallet, workflow: VotingWorkflow) -> Self {
            let wallet = Arc::new(wallet);
            let (message_tx, messages) = mpsc::unbounded_channel();
            let (event_tx, events) = mpsc::unbounded_channel();
            let app = App::new(
                AppOptions {
                    provider: Some(wallet.clone()),
                    workflow,
                    store: ProposalStore::demo(),
                    toast_duration: Duration::from_secs(4),
                },
                message_tx,
                event_tx,
            );
            Self {
                app,
                messages,
                events,
                wallet,
            }
        }

        async fn pump(&mut self) {
            let message = self.messages.recv().await.unwrap();
            self.app.handle_message(message);
        }

        async fn connect(&mut self) {
            self.app.connect_wallet();
            assert!(self.app.connecting);
            self.pump().await;
        }
    }

    fn wallet() -> DevWallet {
        DevWallet::new(vec!["0x71c7656ec7ab88b098defb751b7401b5f6d8976f".to_string()])
    }

    #[tokio::test]
    async fn test_start_adopts_authorized_account() {
        let mut h = Harness::new(
            DevWallet::authorized(vec!["0xaaaa".to_string()]),
            VotingWorkflow::immediate(),
        );
        h.app.start();
        h.pump().await;
        assert!(h.app.session.is_connected());
        assert_eq!(h.wallet.listener_count(), 1);
        assert!(h.app.toasts.is_empty());
    }

    #[tokio::test]
    async fn test_connect_flow() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.connect().await;
        assert!(!h.app.connecting);
        assert!(h.app.session.is_connected());
        assert_eq!(h.app.toasts.latest().unwrap().title, "Wallet connected!");

        h.app.disconnect_wallet();
        assert!(!h.app.session.is_connected());
        assert_eq!(h.app.toasts.latest().unwrap().title, "Wallet disconnected");
    }

    #[tokio::test]
    async fn test_rejected_connect() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.wallet.set_rejecting(true);
        h.connect().await;
        assert!(!h.app.session.is_connected());
        let toast = h.app.toasts.latest().unwrap();
        assert_eq!(toast.title, "Connection failed");
        assert_eq!(toast.severity, Severity::Destructive);
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let (message_tx, _messages) = mpsc::unbounded_channel();
        let (event_tx, _events) = mpsc::unbounded_channel();
        let mut app = App::new(
            AppOptions {
                provider: None,
                workflow: VotingWorkflow::immediate(),
                store: ProposalStore::new(),
                toast_duration: Duration::from_secs(4),
            },
            message_tx,
            event_tx,
        );
        app.start();
        app.connect_wallet();
        assert!(!app.connecting);
        assert_eq!(app.toasts.latest().unwrap().title, "Wallet not found");
    }

    #[tokio::test]
    async fn test_submit_flow() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.connect().await;

        h.app.start_editing();
        assert_eq!(h.app.mode, AppMode::Editing);
        for c in "Add a rooftop garden".chars() {
            h.app.insert_char(c);
        }
        assert!(h.app.can_submit());

        h.app.submit_proposal();
        assert!(h.app.submitting);
        assert!(!h.app.can_submit());
        h.pump().await;

        assert!(!h.app.submitting);
        assert_eq!(h.app.store.len(), 4);
        assert_eq!(h.app.store.list()[0].description, "Add a rooftop garden");
        assert!(h.app.input.is_empty());
        assert_eq!(h.app.mode, AppMode::Normal);
        assert_eq!(h.app.toasts.latest().unwrap().title, "Proposal submitted!");
    }

    #[tokio::test]
    async fn test_submit_while_disconnected() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.app.input = "Movie night".to_string();
        h.app.submit_proposal();
        assert!(!h.app.submitting);
        assert_eq!(h.app.store.len(), 3);
        assert_eq!(h.app.toasts.latest().unwrap().title, "Wallet not connected");
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_input() {
        let workflow = VotingWorkflow::new(Arc::new(FailingConfirmation::new("timeout")));
        let mut h = Harness::new(wallet(), workflow);
        h.connect().await;
        h.app.input = "Movie night".to_string();
        h.app.submit_proposal();
        h.pump().await;

        assert_eq!(h.app.store.len(), 3);
        assert_eq!(h.app.input, "Movie night");
        let toast = h.app.toasts.latest().unwrap();
        assert_eq!(toast.title, "Submission failed");
        assert_eq!(toast.description, "timeout");
    }

    #[tokio::test]
    async fn test_vote_flow() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.connect().await;

        h.app.vote_selected();
        assert!(h.app.is_voting_on(1));
        h.app.vote_selected();
        h.pump().await;

        assert!(!h.app.is_voting_on(1));
        assert_eq!(h.app.store.get(1).unwrap().vote_count, 16);
        assert_eq!(h.app.store.total_votes(), 47);
        assert_eq!(h.app.toasts.latest().unwrap().title, "Vote cast!");

        h.app.vote_selected();
        assert_eq!(h.app.toasts.latest().unwrap().title, "Already voted");
        assert!(h.messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_selection_bounds() {
        let mut h = Harness::new(wallet(), VotingWorkflow::immediate());
        h.app.select_previous();
        assert_eq!(h.app.selected, 0);
        for _ in 0..10 {
            h.app.select_next();
        }
        assert_eq!(h.app.selected, 2);
        assert_eq!(h.app.selected_proposal().unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_account_events_and_reload() {
        let mut h = Harness::new(
            DevWallet::authorized(vec!["0xaaaa".to_string(), "0xbbbb".to_string()]),
            VotingWorkflow::immediate(),
        );
        h.app.start();
        h.pump().await;

        h.wallet.switch_account("0xbbbb");
        let event = h.events.recv().await.unwrap();
        h.app.handle_provider_event(event);
        assert_eq!(h.app.session.account(), "0xbbbb");
        assert!(!h.app.reload_requested);

        h.app.start_editing();
        h.wallet.lock_wallet();
        let event = h.events.recv().await.unwrap();
        h.app.handle_provider_event(event);
        assert!(!h.app.session.is_connected());
        assert_eq!(h.app.mode, AppMode::Normal);

        h.wallet.switch_chain("0x89");
        let event = h.events.recv().await.unwrap();
        h.app.handle_provider_event(event);
        assert!(h.app.reload_requested);
    }

    #[tokio::test]
    async fn test_dropping_app_releases_subscription() {
        let h = Harness::new(wallet(), VotingWorkflow::immediate());
        let Harness { mut app, wallet, .. } = h;
        app.start();
        assert_eq!(wallet.listener_count(), 1);
        drop(app);
        assert_eq!(wallet.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_app_cancels_confirmations() {
        let (message_tx, mut messages) = mpsc::unbounded_channel();
        let (event_tx, _events) = mpsc::unbounded_channel();
        let wallet = Arc::new(DevWallet::new(vec!["0xaaaa".to_string()]));
        let mut app = App::new(
            AppOptions {
                provider: Some(wallet),
                workflow: VotingWorkflow::simulated(
                    Duration::from_millis(1000),
                    Duration::from_millis(1500),
                ),
                store: ProposalStore::demo(),
                toast_duration: Duration::from_secs(4),
            },
            message_tx,
            event_tx,
        );
        app.session.connect().unwrap();
        app.vote_selected();
        assert!(app.is_voting_on(1));

        drop(app);
        assert!(messages.recv().await.is_none());
    }

    #[test]
    fn test_options_from_settings() {
        let mut settings = Settings::default();
        settings.ui.seed_demo_proposals = false;
        settings.workflow.max_description_chars = 140;
        let options = AppOptions::from_settings(&settings, None);
        assert!(options.store.is_empty());
        assert_eq!(options.store.description_limit(), 140);
        assert_eq!(options.toast_duration, Duration::from_secs(4));
        assert!(options.provider.is_none());

        let options = AppOptions::from_settings(&Settings::default(), None);
        assert_eq!(options.store.len(), 3);
    }

    #[test]
    fn test_form_editing_is_char_aware() {
        let (message_tx, _messages) = mpsc::unbounded_channel();
        let (event_tx, _events) = mpsc::unbounded_channel();
        let mut app = App::new(
            AppOptions {
                provider: None,
                workflow: VotingWorkflow::immediate(),
                store: ProposalStore::new(),
                toast_duration: Duration::from_secs(4),
            },
            message_tx,
            event_tx,
        );
        for c in "café".chars() {
            app.insert_char(c);
        }
        assert_eq!(app.input_length(), 4);
        app.move_cursor_left();
        app.delete_before_cursor();
        assert_eq!(app.input, "caé");
        app.move_cursor_home();
        app.delete_at_cursor();
        assert_eq!(app.input, "aé");
        app.move_cursor_end();
        app.insert_char('!');
        assert_eq!(app.input, "aé!");
    }

    #[test]
    fn test_over_limit_disables_submit() {
        let (message_tx, _messages) = mpsc::unbounded_channel();
        let (event_tx, _events) = mpsc::unbounded_channel();
        let wallet = Arc::new(DevWallet::new(vec!["0xaaaa".to_string()]));
        let mut app = App::new(
            AppOptions {
                provider: Some(wallet),
                workflow: VotingWorkflow::immediate(),
                store: ProposalStore::new(),
                toast_duration: Duration::from_secs(4),
            },
            message_tx,
            event_tx,
        );
        app.session.connect().unwrap();
        app.input = "x".repeat(501);
        assert!(!app.can_submit());
        app.input.pop();
        assert!(app.can_submit());
    }
}
