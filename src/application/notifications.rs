//! User-facing notifications.
//!
//! Workflow and session outcomes are turned into `{title, description,
//! severity}` notifications and handed to a [`NotificationSink`]. The terminal
//! UI uses [`ToastQueue`], which shows a few of them at a time and expires them.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::domain::DomainError;
use crate::infrastructure::ProviderError;

const MAX_VISIBLE_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }

    pub fn wallet_connected() -> Self {
        Self::info("Wallet connected!", "You're now ready to vote and create proposals")
    }

    pub fn wallet_disconnected() -> Self {
        Self::info("Wallet disconnected", "You've been disconnected from your wallet")
    }

    pub fn connection_failed(error: &ProviderError) -> Self {
        match error {
            ProviderError::NotFound => Self::destructive(
                "Wallet not found",
                "Configure a wallet provider to use ClubVote",
            ),
            other => Self::destructive("Connection failed", non_empty(other.to_string(), "Failed to connect wallet")),
        }
    }

    pub fn proposal_submitted() -> Self {
        Self::info("Proposal submitted!", "Your proposal has been added to the voting list")
    }

    pub fn vote_cast() -> Self {
        Self::info("Vote cast!", "Your vote has been recorded")
    }

    pub fn submission_error(error: &DomainError) -> Self {
        match error {
            DomainError::NotConnected => Self::destructive(
                "Wallet not connected",
                "Please connect your wallet to submit a proposal",
            ),
            DomainError::InvalidInput(reason) => Self::destructive("Invalid proposal", reason.clone()),
            DomainError::SubmissionFailed(reason) => {
                Self::destructive("Submission failed", non_empty(reason.clone(), "Failed to submit proposal"))
            }
            other => Self::destructive("Submission failed", other.to_string()),
        }
    }

    pub fn vote_error(error: &DomainError) -> Self {
        match error {
            DomainError::NotConnected => {
                Self::destructive("Wallet not connected", "Please connect your wallet to vote")
            }
            DomainError::AlreadyVoted(_) => {
                Self::destructive("Already voted", "You have already voted on this proposal")
            }
            DomainError::VoteFailed(reason) => {
                Self::destructive("Voting failed", non_empty(reason.clone(), "Failed to cast vote"))
            }
            other => Self::destructive("Voting failed", other.to_string()),
        }
    }

    pub fn copy_result(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::info("Address copied", "Wallet address copied to the clipboard"),
            Err(e) => Self::destructive("Copy failed", e),
        }
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Anything that can deliver notifications to the user.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires_at: Instant,
}

/// Short-lived notifications, oldest first.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    lifetime: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(4))
    }
}

impl ToastQueue {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            lifetime,
        }
    }

    pub fn push_at(&mut self, notification: Notification, now: Instant) {
        if self.toasts.len() == MAX_VISIBLE_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            notification,
            expires_at: now + self.lifetime,
        });
    }

    /// Drops every toast whose lifetime has passed.
    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.toasts.iter().map(|toast| &toast.notification)
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.toasts.back().map(|toast| &toast.notification)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl NotificationSink for ToastQueue {
    fn notify(&mut self, notification: Notification) {
        self.push_at(notification, Instant::now());
    }
}
