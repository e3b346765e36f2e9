//! Shared utilities, configuration, and error handling for thread2task
//!
//! This crate provides common functionality used across the thread2task service:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - State machine error types
//! - Slack request signature verification

pub mod config;
pub mod crypto;
pub mod error;
pub mod state;

pub use config::Config;
pub use crypto::{compute_slack_signature, verify_slack_signature, SIGNATURE_MAX_AGE_SECS};
pub use error::{Error, Result};
pub use state::StateError;
