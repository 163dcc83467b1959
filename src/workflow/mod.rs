//! Comparison workflow: the state machine and a synchronous driver for it.

pub mod session;
pub mod state;

pub use session::Session;
pub use state::*;
