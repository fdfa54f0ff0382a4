//! Deep Research Backend Library
//!
//! This library exposes modules for testing and external use.
//! The server binary is in `src/main.rs`; `research-cli` runs a single
//! query from the command line.

pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod orchestrator;
/// Application state shared by request handlers
pub mod state;
