use chrono::{DateTime, Local};

/// Identifier assigned to a proposal when it is created.
pub type ProposalId = u64;

/// A single votable proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub vote_count: u64,
    pub created: DateTime<Local>,
    /// Set once a vote succeeds in this session. Not tied to the wallet account.
    pub has_voted: bool,
}

impl Proposal {
    pub fn new(id: ProposalId, description: impl Into<String>, created: DateTime<Local>) -> Self {
        Self {
            id,
            description: description.into(),
            vote_count: 0,
            created,
            has_voted: false,
        }
    }

    /// Builder used for seeding a store with existing tallies.
    pub fn with_votes(mut self, vote_count: u64, has_voted: bool) -> Self {
        self.vote_count = vote_count;
        self.has_voted = has_voted;
        self
    }

    pub(crate) fn record_vote(&mut self) {
        self.vote_count += 1;
        self.has_voted = true;
    }
}

/// Connection state of the wallet session as seen by the rest of the app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_connected: bool,
    /// Active account address, empty while disconnected.
    pub account: String,
}

impl SessionState {
    pub fn connected(account: impl Into<String>) -> Self {
        Self {
            is_connected: true,
            account: account.into(),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Abbreviates the account as `0x1234...abcd`.
    ///
    /// Addresses too short to abbreviate are returned as-is.
    pub fn short_account(&self) -> String {
        let chars: Vec<char> = self.account.chars().collect();
        if chars.len() <= 10 {
            return self.account.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
