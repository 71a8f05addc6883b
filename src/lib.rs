// ABOUTME: Library root for hoist - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cancel;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod events;
pub mod output;
pub mod provider;
pub mod publish;
pub mod stack;
pub mod types;
