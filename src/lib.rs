//! ClubVote - Terminal Club Voting Library
//!
//! Wallet-gated proposals and votes for a small club, with a terminal UI.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod cli;
pub mod errors;
pub mod tui;

pub use domain::*;
pub use application::*;
