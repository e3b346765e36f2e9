//! HTTP handlers for the Workflows domain

pub mod events;
pub mod interactions;
