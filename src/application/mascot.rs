//! The voting mascot's speech bubble.

use rand::seq::SliceRandom;
use rand::Rng;

/// Candidate messages for the given session and proposal count.
pub fn message_set(is_connected: bool, proposal_count: usize) -> Vec<String> {
    if !is_connected {
        vec![
            "Hi there! 👋 Connect your wallet to get started!".to_string(),
            "Welcome to ClubVote! Let's connect your wallet first.".to_string(),
            "Ready to vote? Connect your wallet and join the fun!".to_string(),
        ]
    } else if proposal_count > 0 {
        vec![
            format!("Awesome! There are {} proposals to vote on!", proposal_count),
            format!("{} proposals are waiting for your vote!", proposal_count),
            "Don't forget to vote on the proposals below! 🗳️".to_string(),
        ]
    } else {
        vec![
            "Great! You're all set to vote and create proposals! ✨".to_string(),
            "Your wallet is connected! Time to make your voice heard!".to_string(),
            "Perfect! Now you can participate in club decisions!".to_string(),
        ]
    }
}

/// Picks one message uniformly from the applicable set.
pub fn pick_message<R: Rng + ?Sized>(is_connected: bool, proposal_count: usize, rng: &mut R) -> String {
    message_set(is_connected, proposal_count)
        .choose(rng)
        .cloned()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct Mascot {
    message: String,
    shown_for: Option<(bool, usize)>,
}

impl Mascot {
    /// Re-picks the message when the inputs changed since the last pick.
    ///
    /// Returns `true` if a new message was chosen.
    pub fn refresh(&mut self, is_connected: bool, proposal_count: usize) -> bool {
        if self.shown_for == Some((is_connected, proposal_count)) {
            return false;
        }
        self.message = pick_message(is_connected, proposal_count, &mut rand::thread_rng());
        self.shown_for = Some((is_connected, proposal_count));
        true
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
