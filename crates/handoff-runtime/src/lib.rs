//! Handoff Runtime - Rule routing engine for escalation events
//!
//! This crate evaluates routing rules against an evaluation context:
//! - `evaluator`: typed condition evaluation over context fields
//! - `matcher`: AND-combination of a rule's conditions
//! - `registry`: versioned, hot-swappable rule sets
//! - `cache`: fingerprint-keyed result cache with TTL expiry
//! - `engine`: priority walk with first-match-wins
//! - `executor`: applies a matched rule's actions to a decision
//! - `profiler`: rule testing and comparative cost diagnostics

pub mod cache;
pub mod clock;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod matcher;
pub mod observability;
pub mod profiler;
pub mod registry;
pub mod result;

// Re-export main types
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::RoutingEngine;
pub use error::{Result, RuntimeError};
pub use evaluator::{ConditionEvaluator, EvaluationScope};
pub use executor::{ActionExecutor, ActionOutcome, SkippedAction};
pub use matcher::{MatchResult, RuleMatcher};
pub use observability::{Counter, Histogram, MetricsCollector, MetricsSnapshot};
pub use profiler::{ProfileReport, RuleProfile, RuleProfiler, RuleTestReport};
pub use registry::{RegisteredRule, RuleRegistry, RuleSet};
pub use result::{ConditionTrace, EvaluationDiagnostic, RoutingResult, RuleTrace};
