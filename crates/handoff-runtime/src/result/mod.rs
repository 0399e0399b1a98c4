//! Routing results and diagnostics
//!
//! This module defines the output of one evaluation and the per-rule and
//! per-condition traces used by rule authors to inspect it.

mod result;
mod trace;

pub use result::RoutingResult;
pub use trace::{ConditionTrace, EvaluationDiagnostic, RuleTrace};
