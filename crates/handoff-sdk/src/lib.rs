//! Escalation routing SDK
//!
//! High-level API for loading routing rules and routing escalation events.
//!
//! ```rust,ignore
//! use handoff_sdk::{RouteRequest, RouterBuilder};
//!
//! let router = RouterBuilder::new()
//!     .add_rule_file("rules/routing.yaml")
//!     .build()
//!     .await?;
//!
//! let response = router.route(RouteRequest::new(context).with_decision(decision));
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod loader;
pub mod router;

// Re-export main types
pub use builder::RouterBuilder;
pub use config::EngineConfig;
pub use error::{Result, SdkError};
pub use loader::{FileRuleSource, InlineRuleSource, RuleSource};
pub use router::{EscalationRouter, RouteRequest, RouteResponse};

// Re-export commonly used types from dependencies
pub use handoff_core::{
    Assignment, Condition, ConditionKind, ConditionOperator, EvaluationContext, HandoffDecision,
    Message, Priority, RequestMetadata, RoutingConfig, RoutingRule, RuleAction, Value,
};
pub use handoff_runtime::{
    ActionOutcome, CacheStats, Clock, FixedClock, MetricsSnapshot, ProfileReport, RoutingResult,
    RuleTestReport, SkippedAction, SystemClock,
};
