//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer,
//! managing the wallet session, the voting workflow and UI state.

pub mod mascot;
pub mod notifications;
pub mod session;
pub mod state;
pub mod workflow;

pub use mascot::*;
pub use notifications::*;
pub use session::*;
pub use state::*;
pub use workflow::*;
