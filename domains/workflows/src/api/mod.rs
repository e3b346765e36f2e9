//! API layer for the Workflows domain
//!
//! Contains the Slack inbound handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::{Dispatch, WorkflowsState};
pub use routes::routes;
