use std::sync::Arc;
use std::time::Duration;

use clubvote::application::{
    AppMessage, AppOptions, FailingConfirmation, Notification, VotingWorkflow, WalletSession,
};
use clubvote::domain::{DomainError, ProposalStore, SessionState};
use clubvote::infrastructure::{DevWallet, ProviderEvent};
use clubvote::App;
use tokio::sync::mpsc;

fn connected() -> SessionState {
    SessionState::connected("0x71c7656ec7ab88b098defb751b7401b5f6d8976f")
}

#[tokio::test]
async fn seeded_store_voting_scenario() {
    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::demo();
    let before = store.list().to_vec();

    let result = workflow
        .cast_vote(&SessionState::disconnected(), &mut store, 1)
        .await;
    assert_eq!(result, Err(DomainError::NotConnected));
    assert_eq!(store.list(), before.as_slice());

    let session = connected();
    let proposal = workflow.cast_vote(&session, &mut store, 1).await.unwrap();
    assert_eq!(proposal.vote_count, 16);
    assert!(proposal.has_voted);
    assert_eq!(store.total_votes(), 16 + 8 + 23);

    let snapshot = store.list().to_vec();
    let result = workflow.cast_vote(&session, &mut store, 2).await;
    assert_eq!(result, Err(DomainError::AlreadyVoted(2)));
    assert_eq!(store.list(), snapshot.as_slice());
}

#[tokio::test]
async fn double_vote_counts_once() {
    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::demo();
    let session = connected();

    assert!(workflow.cast_vote(&session, &mut store, 3).await.is_ok());
    assert_eq!(
        workflow.cast_vote(&session, &mut store, 3).await,
        Err(DomainError::AlreadyVoted(3))
    );
    assert_eq!(store.get(3).unwrap().vote_count, 24);
}

#[tokio::test]
async fn description_length_boundary() {
    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::new();
    let session = connected();

    for blank in ["", "   "] {
        let result = workflow.submit_proposal(&session, &mut store, blank).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }
    assert!(store.is_empty());

    let too_long = "a".repeat(501);
    let result = workflow.submit_proposal(&session, &mut store, &too_long).await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    assert!(store.is_empty());

    let padded = format!("  {}  ", "a".repeat(499));
    let result = workflow.submit_proposal(&session, &mut store, &padded).await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    assert!(store.is_empty());

    let exact = "a".repeat(500);
    assert!(workflow.submit_proposal(&session, &mut store, &exact).await.is_ok());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn submission_is_prepended() {
    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::demo();

    let proposal = workflow
        .submit_proposal(&connected(), &mut store, "Add a rooftop garden")
        .await
        .unwrap();
    assert_eq!(store.len(), 4);
    assert_eq!(store.list()[0], proposal);
    assert_eq!(proposal.vote_count, 0);
    assert!(!proposal.has_voted);
    assert_eq!(proposal.id, 4);
}

#[tokio::test]
async fn totals_track_mixed_operations() {
    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::demo();
    let session = connected();

    workflow.submit_proposal(&session, &mut store, "Hackathon").await.unwrap();
    workflow.cast_vote(&session, &mut store, 4).await.unwrap();
    workflow.cast_vote(&session, &mut store, 1).await.unwrap();
    let _ = workflow.cast_vote(&session, &mut store, 2).await;
    workflow.submit_proposal(&session, &mut store, "Book club").await.unwrap();

    let sum: u64 = store.list().iter().map(|p| p.vote_count).sum();
    assert_eq!(store.total_votes(), sum);
    assert_eq!(sum, 48);
}

#[tokio::test]
async fn failed_confirmation_is_reported_as_workflow_failure() {
    let workflow = VotingWorkflow::new(Arc::new(FailingConfirmation::new("user rejected")));
    let mut store = ProposalStore::demo();
    let before = store.list().to_vec();

    let error = workflow
        .submit_proposal(&connected(), &mut store, "Picnic")
        .await
        .unwrap_err();
    assert_eq!(Notification::submission_error(&error).description, "user rejected");

    let error = workflow.cast_vote(&connected(), &mut store, 1).await.unwrap_err();
    assert_eq!(Notification::vote_error(&error).title, "Voting failed");
    assert_eq!(store.list(), before.as_slice());
}

#[tokio::test]
async fn account_switch_keeps_vote_flags() {
    let wallet = Arc::new(DevWallet::authorized(vec![
        "0xaaaa".to_string(),
        "0xbbbb".to_string(),
    ]));
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut session = WalletSession::new(Some(wallet.clone()));
    session.initialize(events_tx);

    let workflow = VotingWorkflow::immediate();
    let mut store = ProposalStore::demo();
    workflow.cast_vote(session.state(), &mut store, 1).await.unwrap();

    wallet.switch_account("0xbbbb");
    let event = events.recv().await.unwrap();
    session.handle_event(event);
    assert_eq!(session.account(), "0xbbbb");

    let result = workflow.cast_vote(session.state(), &mut store, 1).await;
    assert_eq!(result, Err(DomainError::AlreadyVoted(1)));
}

#[tokio::test]
async fn app_releases_subscription_on_reload() {
    let wallet = Arc::new(DevWallet::authorized(vec!["0xaaaa".to_string()]));
    let (message_tx, mut messages) = mpsc::unbounded_channel();
    let (event_tx, mut events) = mpsc::unbounded_channel::<ProviderEvent>();
    let mut app = App::new(
        AppOptions {
            provider: Some(wallet.clone()),
            workflow: VotingWorkflow::immediate(),
            store: ProposalStore::demo(),
            toast_duration: Duration::from_secs(4),
        },
        message_tx,
        event_tx,
    );
    app.start();
    let message: AppMessage = messages.recv().await.unwrap();
    app.handle_message(message);
    assert!(app.session.is_connected());
    assert_eq!(wallet.listener_count(), 1);

    wallet.switch_chain("0x89");
    app.handle_provider_event(events.recv().await.unwrap());
    assert!(app.reload_requested);

    drop(app);
    assert_eq!(wallet.listener_count(), 0);
}
