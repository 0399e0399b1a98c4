//! EscalationRouter - Main API for routing escalation events
//!
//! - `types`: Request/Response types (RouteRequest, RouteResponse)
//! - `engine`: the EscalationRouter facade over the routing engine

mod engine;
mod types;

pub use engine::EscalationRouter;
pub use types::{RouteRequest, RouteResponse};
