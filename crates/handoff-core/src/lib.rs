//! Handoff Core - Core types and definitions for the escalation routing engine
//!
//! This crate provides the fundamental types shared by the routing runtime and SDK:
//! - Value types for attribute, entity and metadata maps
//! - Condition definitions and their resolvable field references
//! - Routing rules, rule actions and the routing configuration aggregate
//! - Evaluation context and handoff decision types
//! - Error types

pub mod action;
pub mod condition;
pub mod context;
pub mod error;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use action::{Assignment, Priority, RuleAction};
pub use condition::{
    Condition, ConditionKind, ConditionOperator, FieldRef, MessageField, TimeOfDay, TimeWindow,
    TriggerField,
};
pub use context::{EvaluationContext, HandoffDecision, Message, RequestMetadata};
pub use error::{CoreError, Result};
pub use rule::{RoutingConfig, RoutingRule, RuleMetadata};
pub use types::Value;
