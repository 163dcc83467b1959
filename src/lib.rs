//! `forecast-compare` library crate.
//!
//! The binary (`fcmp`) is a thin wrapper around this library so that:
//!
//! - the workflow state machine is testable without a terminal or a server
//! - collaborators (transport, renderer, report encoder) are swappable traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod compare;
pub mod domain;
pub mod error;
pub mod render;
pub mod report;
pub mod service;
pub mod tui;
pub mod workflow;
