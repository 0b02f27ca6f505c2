//! Route table: one exhaustive lookup from route to pipeline descriptor.
//!
//! All branching lives in the rule engine and the classifier; this module is a
//! single `match`. `Irrelevant` and `End` have no descriptor because they map
//! to canned, non-generative replies.

use crate::route::RouteLabel;

/// How the pipeline's parameters are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStrategy {
    /// No structured extraction; the pipeline works from the turn text and state.
    None,
    /// Extract `{topic, location}`; topic is required.
    Search,
    /// Extract `{background, target_role}`; target role is required.
    Learning,
}

/// Static description of the pipeline a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineDescriptor {
    pub pipeline_id: &'static str,
    pub params: ParamStrategy,
}

/// Resolves a route to its pipeline. `None` means a canned reply.
pub fn descriptor_for(route: RouteLabel) -> Option<PipelineDescriptor> {
    match route {
        RouteLabel::AnalyzeDocument => Some(PipelineDescriptor {
            pipeline_id: "document_analysis",
            params: ParamStrategy::None,
        }),
        RouteLabel::DocumentFollowUp => Some(PipelineDescriptor {
            pipeline_id: "document_followup",
            params: ParamStrategy::None,
        }),
        RouteLabel::GeneralAdvice => Some(PipelineDescriptor {
            pipeline_id: "general_advice",
            params: ParamStrategy::None,
        }),
        RouteLabel::LearningPlan => Some(PipelineDescriptor {
            pipeline_id: "learning_plan",
            params: ParamStrategy::Learning,
        }),
        RouteLabel::ExternalSearch => Some(PipelineDescriptor {
            pipeline_id: "external_search",
            params: ParamStrategy::Search,
        }),
        RouteLabel::Irrelevant | RouteLabel::End => None,
    }
}

/// Default canned texts. The closing and redirect messages can be overridden
/// through `CoreConfig`.
pub const DEFAULT_CLOSING_MESSAGE: &str =
    "Glad I could help. Good luck with your career, and come back any time.";

pub const DEFAULT_IRRELEVANT_MESSAGE: &str = "I focus on careers: job searches, learning plans, \
and feedback on your documents. What career question can I help with?";

/// User-facing message when `AnalyzeDocument` is dispatched with no ingested
/// document. Not an internal error.
pub const MISSING_DOCUMENT_MESSAGE: &str = "It looks like you want a document reviewed, but I \
don't have one on file yet. Please upload it first and then ask again.";

/// Single apology fragment emitted when a pipeline fails. The turn is still
/// persisted with this text; the user never sees silence.
pub const PIPELINE_APOLOGY: &str = "I'm sorry, I ran into a problem handling that request. \
Please try again in a moment or rephrase your question.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_routes_have_no_pipeline() {
        assert!(descriptor_for(RouteLabel::End).is_none());
        assert!(descriptor_for(RouteLabel::Irrelevant).is_none());
    }

    #[test]
    fn generative_routes_resolve_to_distinct_pipelines() {
        let mut ids: Vec<&str> = RouteLabel::ALL
            .iter()
            .filter_map(|r| descriptor_for(*r))
            .map(|d| d.pipeline_id)
            .collect();
        assert_eq!(ids.len(), 5);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5, "pipeline ids must not collide");
    }
}
