//! Workflow integration tests
//!
//! Drive the composed router end to end over mock Slack, LLM and CRM
//! services: Slack events, button interactions, and full thread scenarios.

#![allow(dead_code)]

mod common;
mod events;
mod interactions;
mod scenarios;
