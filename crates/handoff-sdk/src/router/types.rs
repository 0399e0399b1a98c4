//! Request/Response types for EscalationRouter

use handoff_core::{EvaluationContext, HandoffDecision, RequestMetadata};
use handoff_runtime::{RoutingResult, SkippedAction};
use serde::{Deserialize, Serialize};

/// Routing request
///
/// Deserializes from `{ "context": ..., "decision": ..., "metadata": ... }`;
/// everything but `context` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub context: EvaluationContext,

    /// Upstream handoff decision
    #[serde(default)]
    pub decision: HandoffDecision,

    #[serde(default)]
    pub metadata: RequestMetadata,

    /// Evaluate only; do not apply the matched actions
    #[serde(default)]
    pub dry_run: bool,

    /// Caller-supplied id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl RouteRequest {
    pub fn new(context: EvaluationContext) -> Self {
        Self {
            context,
            decision: HandoffDecision::default(),
            metadata: RequestMetadata::new(),
            dry_run: false,
            request_id: None,
        }
    }

    pub fn with_decision(mut self, decision: HandoffDecision) -> Self {
        self.decision = decision;
        self
    }

    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Routing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub request_id: String,

    pub result: RoutingResult,

    /// Decision after applying the matched actions (unchanged on dry runs)
    pub decision: HandoffDecision,

    pub metadata: RequestMetadata,

    /// Whether actions were applied
    pub applied: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAction>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
