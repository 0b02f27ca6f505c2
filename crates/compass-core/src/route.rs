//! The closed route enumeration and per-turn routing decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which specialized pipeline should handle a turn. Closed set: the dispatcher
/// always resolves to one of these; anything else from the classifier is a
/// classification error, not a new route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteLabel {
    /// First-time review of an ingested document.
    AnalyzeDocument,
    /// Follow-up question about a document already in context.
    DocumentFollowUp,
    /// General career questions; also the deterministic fallback.
    GeneralAdvice,
    /// Personalized study plan toward a target role.
    LearningPlan,
    /// Live job listing search.
    ExternalSearch,
    /// Off-topic request; canned redirect, no pipeline.
    Irrelevant,
    /// Conversation closing; canned goodbye, no pipeline.
    End,
}

impl RouteLabel {
    pub const ALL: [RouteLabel; 7] = [
        RouteLabel::AnalyzeDocument,
        RouteLabel::DocumentFollowUp,
        RouteLabel::GeneralAdvice,
        RouteLabel::LearningPlan,
        RouteLabel::ExternalSearch,
        RouteLabel::Irrelevant,
        RouteLabel::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteLabel::AnalyzeDocument => "AnalyzeDocument",
            RouteLabel::DocumentFollowUp => "DocumentFollowUp",
            RouteLabel::GeneralAdvice => "GeneralAdvice",
            RouteLabel::LearningPlan => "LearningPlan",
            RouteLabel::ExternalSearch => "ExternalSearch",
            RouteLabel::Irrelevant => "Irrelevant",
            RouteLabel::End => "End",
        }
    }
}

impl fmt::Display for RouteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for labels outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoute(pub String);

impl fmt::Display for UnknownRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown route label: {}", self.0)
    }
}

impl std::error::Error for UnknownRoute {}

impl FromStr for RouteLabel {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteLabel::ALL
            .iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

/// How the route was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A safety-net rule matched; the classifier was never consulted.
    RuleMatch,
    /// The classifier returned a valid label.
    ModelClassified,
    /// The classifier failed or returned an out-of-set label.
    FallbackDefault,
}

/// Produced once per turn; never persisted beyond the turn's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub route: RouteLabel,
    pub reason: DecisionReason,
}

impl RoutingDecision {
    pub fn rule(route: RouteLabel) -> Self {
        Self {
            route,
            reason: DecisionReason::RuleMatch,
        }
    }

    pub fn classified(route: RouteLabel) -> Self {
        Self {
            route,
            reason: DecisionReason::ModelClassified,
        }
    }

    pub fn fallback() -> Self {
        Self {
            route: RouteLabel::GeneralAdvice,
            reason: DecisionReason::FallbackDefault,
        }
    }
}
