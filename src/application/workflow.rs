//! Proposal submission and voting workflow.
//!
//! Every operation runs in three steps: validation against the wallet session
//! and the store, a confirmation delay that stands in for an external
//! transaction, and finally the store mutation. A failure at any step leaves
//! the store unchanged.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{info, warn};

use crate::domain::{
    validate_description, DomainError, DomainResult, Proposal, ProposalId, ProposalStore,
    SessionState,
};

/// The operation a confirmation delay is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SubmitProposal,
    CastVote(ProposalId),
}

/// Source of the simulated confirmation latency.
///
/// The returned future is `'static` so it can be driven on its own task while
/// the UI keeps rendering.
pub trait ConfirmationDelay: Send + Sync {
    fn wait(&self, operation: Operation) -> BoxFuture<'static, Result<(), String>>;
}

/// Sleeps for a fixed time per operation kind.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedConfirmation {
    pub submit: Duration,
    pub vote: Duration,
}

impl Default for SimulatedConfirmation {
    fn default() -> Self {
        Self {
            submit: Duration::from_millis(1000),
            vote: Duration::from_millis(1500),
        }
    }
}

impl ConfirmationDelay for SimulatedConfirmation {
    fn wait(&self, operation: Operation) -> BoxFuture<'static, Result<(), String>> {
        let delay = match operation {
            Operation::SubmitProposal => self.submit,
            Operation::CastVote(_) => self.vote,
        };
        async move {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        .boxed()
    }
}

/// Confirms instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateConfirmation;

impl ConfirmationDelay for ImmediateConfirmation {
    fn wait(&self, _operation: Operation) -> BoxFuture<'static, Result<(), String>> {
        future::ready(Ok(())).boxed()
    }
}

/// Fails every confirmation with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingConfirmation {
    message: String,
}

impl FailingConfirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl ConfirmationDelay for FailingConfirmation {
    fn wait(&self, _operation: Operation) -> BoxFuture<'static, Result<(), String>> {
        future::ready(Err(self.message.clone())).boxed()
    }
}

/// A validated submission waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    description: String,
}

impl PendingSubmission {
    /// The trimmed description that will be stored.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A validated vote waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingVote {
    proposal_id: ProposalId,
}

impl PendingVote {
    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }
}

/// The only path through which proposals are created or voted on.
#[derive(Clone)]
pub struct VotingWorkflow {
    delay: Arc<dyn ConfirmationDelay>,
}

impl VotingWorkflow {
    pub fn new(delay: Arc<dyn ConfirmationDelay>) -> Self {
        Self { delay }
    }

    pub fn simulated(submit: Duration, vote: Duration) -> Self {
        Self::new(Arc::new(SimulatedConfirmation { submit, vote }))
    }

    pub fn immediate() -> Self {
        Self::new(Arc::new(ImmediateConfirmation))
    }

    /// Checks that a proposal may be submitted.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotConnected`] takes precedence over
    /// [`DomainError::InvalidInput`].
    pub fn begin_submission(
        &self,
        session: &SessionState,
        store: &ProposalStore,
        description: &str,
    ) -> DomainResult<PendingSubmission> {
        if !session.is_connected {
            warn!("proposal submission without a connected wallet");
            return Err(DomainError::NotConnected);
        }
        let description = validate_description(description, store.description_limit())
            .inspect_err(|e| warn!(error = %e, "proposal rejected"))?;
        Ok(PendingSubmission { description })
    }

    /// Checks that a vote may be cast on `proposal_id`.
    pub fn begin_vote(
        &self,
        session: &SessionState,
        store: &ProposalStore,
        proposal_id: ProposalId,
    ) -> DomainResult<PendingVote> {
        if !session.is_connected {
            warn!(proposal_id, "vote without a connected wallet");
            return Err(DomainError::NotConnected);
        }
        let proposal = store
            .get(proposal_id)
            .ok_or(DomainError::NotFound(proposal_id))?;
        if proposal.has_voted {
            warn!(proposal_id, "repeat vote rejected");
            return Err(DomainError::AlreadyVoted(proposal_id));
        }
        Ok(PendingVote { proposal_id })
    }

    /// Waits out the confirmation step for `operation`.
    pub fn confirm(&self, operation: Operation) -> BoxFuture<'static, Result<(), String>> {
        self.delay.wait(operation)
    }

    /// Applies a confirmed submission.
    ///
    /// # Errors
    ///
    /// Any failure, from the confirmation or from the store, is reported as
    /// [`DomainError::SubmissionFailed`].
    pub fn finish_submission(
        &self,
        store: &mut ProposalStore,
        pending: PendingSubmission,
        confirmation: Result<(), String>,
    ) -> DomainResult<Proposal> {
        confirmation.map_err(DomainError::SubmissionFailed)?;
        let proposal = store
            .create(&pending.description)
            .map_err(|e| DomainError::SubmissionFailed(e.to_string()))?;
        info!(proposal_id = proposal.id, "proposal submitted");
        Ok(proposal)
    }

    /// Applies a confirmed vote. Failures become [`DomainError::VoteFailed`].
    pub fn finish_vote(
        &self,
        store: &mut ProposalStore,
        pending: PendingVote,
        confirmation: Result<(), String>,
    ) -> DomainResult<Proposal> {
        confirmation.map_err(DomainError::VoteFailed)?;
        let proposal = store
            .cast_vote(pending.proposal_id)
            .map_err(|e| DomainError::VoteFailed(e.to_string()))?;
        info!(proposal_id = proposal.id, votes = proposal.vote_count, "vote recorded");
        Ok(proposal)
    }

    pub async fn submit_proposal(
        &self,
        session: &SessionState,
        store: &mut ProposalStore,
        description: &str,
    ) -> DomainResult<Proposal> {
        let pending = self.begin_submission(session, store, description)?;
        let confirmation = self.confirm(Operation::SubmitProposal).await;
        self.finish_submission(store, pending, confirmation)
    }

    pub async fn cast_vote(
        &self,
        session: &SessionState,
        store: &mut ProposalStore,
        proposal_id: ProposalId,
    ) -> DomainResult<Proposal> {
        let pending = self.begin_vote(session, store, proposal_id)?;
        let confirmation = self.confirm(Operation::CastVote(proposal_id)).await;
        self.finish_vote(store, pending, confirmation)
    }
}

impl std::fmt::Debug for VotingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingWorkflow").finish_non_exhaustive()
    }
}
