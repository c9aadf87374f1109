//! Infrastructure layer providing external service integrations.
//!
//! This module contains the wallet provider boundary and its implementations,
//! settings loading, logging setup and clipboard access.

pub mod clipboard;
pub mod settings;
pub mod dev_wallet;
pub mod logging;
pub mod provider;
pub mod rpc;

pub use clipboard::*;
pub use settings::*;
pub use dev_wallet::*;
pub use provider::*;
pub use rpc::*;
