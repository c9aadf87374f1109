//! In-memory proposal store.
//!
//! Holds the ordered list of proposals for the lifetime of the process and is
//! the only place where proposals are created or voted on.

use chrono::{DateTime, Duration, Local};

use super::errors::{DomainError, DomainResult};
use super::models::{Proposal, ProposalId};

/// Default upper bound on proposal description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Checks a raw description against `limit` and trims it.
///
/// Returns the trimmed text that should be stored. The limit applies to the
/// text as typed, surrounding whitespace included, so it agrees with the
/// form's character counter.
///
/// # Errors
///
/// Returns [`DomainError::InvalidInput`] if the trimmed text is empty or the
/// raw text is longer than `limit` characters.
pub fn validate_description(raw: &str, limit: usize) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(
            "Please enter a proposal description".to_string(),
        ));
    }
    let length = raw.chars().count();
    if length > limit {
        return Err(DomainError::InvalidInput(format!(
            "Description is {} characters, the limit is {}",
            length, limit
        )));
    }
    Ok(trimmed.to_string())
}

/// Ordered collection of proposals, newest first.
///
/// # Examples
///
/// ```
/// use clubvote::domain::ProposalStore;
///
/// let mut store = ProposalStore::new();
/// let created = store.create("Weekly chess club").unwrap();
/// assert_eq!(created.id, 1);
/// assert_eq!(store.cast_vote(created.id).unwrap().vote_count, 1);
/// assert_eq!(store.total_votes(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
    next_id: ProposalId,
    description_limit: usize,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self {
            proposals: Vec::new(),
            next_id: 1,
            description_limit: MAX_DESCRIPTION_CHARS,
        }
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `proposals` in the given order.
    ///
    /// New ids continue after the highest id present, so later removals or
    /// gaps never cause a collision.
    pub fn with_proposals(proposals: Vec<Proposal>) -> Self {
        let next_id = proposals.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            proposals,
            next_id,
            ..Self::default()
        }
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    /// The three club proposals shown on first launch.
    pub fn demo() -> Self {
        let now = Local::now();
        Self::with_proposals(vec![
            Proposal::new(
                1,
                "Should we organize a monthly tech meetup for club members?",
                now - Duration::days(2),
            )
            .with_votes(15, false),
            Proposal::new(
                2,
                "Proposal to allocate budget for new club equipment and workspace upgrades",
                now - Duration::days(1),
            )
            .with_votes(8, true),
            Proposal::new(
                3,
                "Should we create a mentorship program pairing senior and junior members?",
                now - Duration::hours(3),
            )
            .with_votes(23, false),
        ])
    }

    pub fn description_limit(&self) -> usize {
        self.description_limit
    }

    pub fn list(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    /// Creates a proposal stamped with the current local time.
    pub fn create(&mut self, description: &str) -> DomainResult<Proposal> {
        self.create_at(description, Local::now())
    }

    /// Creates a proposal and prepends it to the list.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidInput`] if the description is blank or
    /// over the store's character limit.
    pub fn create_at(&mut self, description: &str, created: DateTime<Local>) -> DomainResult<Proposal> {
        let description = validate_description(description, self.description_limit)?;
        let proposal = Proposal::new(self.next_id, description, created);
        self.next_id += 1;
        self.proposals.insert(0, proposal.clone());
        Ok(proposal)
    }

    /// Records one vote on the proposal with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] for an unknown id and
    /// [`DomainError::AlreadyVoted`] if this session already voted on it. In
    /// both cases the store is unchanged.
    pub fn cast_vote(&mut self, id: ProposalId) -> DomainResult<Proposal> {
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::NotFound(id))?;
        if proposal.has_voted {
            return Err(DomainError::AlreadyVoted(id));
        }
        proposal.record_vote();
        Ok(proposal.clone())
    }

    /// Sum of vote counts over all proposals, computed on demand.
    pub fn total_votes(&self) -> u64 {
        self.proposals.iter().map(|p| p.vote_count).sum()
    }
}
