use thiserror::Error;

use super::models::ProposalId;

/// Outcomes that reject a proposal or vote operation.
///
/// None of these are fatal; the application turns every one of them into a
/// user-visible notification and leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Invalid proposal: {0}")]
    InvalidInput(String),
    #[error("Already voted on proposal #{0}")]
    AlreadyVoted(ProposalId),
    #[error("Proposal #{0} not found")]
    NotFound(ProposalId),
    #[error("{0}")]
    SubmissionFailed(String),
    #[error("{0}")]
    VoteFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
