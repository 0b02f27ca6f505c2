//! Pipelines: named units of specialized text-producing work.
//!
//! The executor is agnostic to pipeline internals; each pipeline declares its
//! id, receives typed parameters plus conversation state, and returns a
//! fragment stream. Registration mirrors the dispatch table: every generative
//! route's `pipeline_id` must resolve here.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use tracing::info;

use crate::dispatch::MISSING_DOCUMENT_MESSAGE;
use crate::error::CoreError;
use crate::extractor::{PipelineParams, UNSPECIFIED};
use crate::services::Services;
use crate::turn::ConversationState;

/// Ordered fragments as produced by a pipeline.
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Everything a pipeline sees for one turn.
pub struct PipelineInput<'a> {
    /// The incoming turn's text.
    pub text: &'a str,
    pub params: &'a PipelineParams,
    pub state: &'a ConversationState,
}

/// A named, parameterized unit of work. Exactly one runs per turn.
#[async_trait::async_trait]
pub trait Pipeline: Send + Sync {
    /// Unique pipeline id for dispatch.
    fn id(&self) -> &'static str;

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError>;
}

/// Registry of pipelines dispatched by id.
pub struct PipelineRegistry {
    pipelines: Vec<Arc<dyn Pipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self {
            pipelines: Vec::new(),
        }
    }

    /// All five built-in pipelines registered.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GeneralAdvicePipeline));
        registry.register(Arc::new(LearningPlanPipeline));
        registry.register(Arc::new(ExternalSearchPipeline));
        registry.register(Arc::new(DocumentAnalysisPipeline));
        registry.register(Arc::new(DocumentFollowUpPipeline));
        registry
    }

    pub fn register(&mut self, pipeline: Arc<dyn Pipeline>) {
        self.pipelines.push(pipeline);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Pipeline>> {
        self.pipelines.iter().find(|p| p.id() == id).cloned()
    }

    pub fn pipeline_ids(&self) -> Vec<&'static str> {
        self.pipelines.iter().map(|p| p.id()).collect()
    }
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn single_fragment(text: impl Into<String>) -> FragmentStream {
    Box::pin(stream::iter(vec![text.into()]))
}

// ---------------------------------------------------------------------------
// Built-in pipelines
// ---------------------------------------------------------------------------

const ADVICE_INSTRUCTIONS: &str = "\
You are a pragmatic career advisor for the technology industry. Answer the \
user's question with specific, actionable guidance: name concrete skills, \
realistic timelines, and next steps. If the question is too vague to answer \
well, say what additional detail would help. Keep it focused; no filler.";

const LEARNING_INSTRUCTIONS: &str = "\
You are a learning-path planner. Given the user's current background and their \
target role, produce a staged plan: what to learn first, what to build at each \
stage, and how each stage moves them toward the target role. Ground the plan \
in the background they already have instead of starting from zero.";

const SEARCH_SUMMARY_INSTRUCTIONS: &str = "\
You summarize job search results. Using ONLY the provided snippets, list the \
most relevant openings with role, company or source, and location when stated. \
Do not invent listings. Close with one sentence on how well the results match \
the request.";

const DOCUMENT_ANALYSIS_INSTRUCTIONS: &str = "\
You are a senior technical recruiter reviewing a candidate document. Give a \
structured review: overall impression, strongest sections, concrete weaknesses, \
and specific rewrite suggestions. Quote the document where it helps.";

const DOCUMENT_FOLLOWUP_INSTRUCTIONS: &str = "\
You answer follow-up questions about the candidate document provided below. \
Base every statement on the document text; if it does not contain the answer, \
say so plainly. When asked to rewrite a part, output the rewritten text.";

/// Default route: career Q&A over the turn text and recent context.
pub struct GeneralAdvicePipeline;

#[async_trait::async_trait]
impl Pipeline for GeneralAdvicePipeline {
    fn id(&self) -> &'static str {
        "general_advice"
    }

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError> {
        let context = input.state.context_summary(6);
        let prompt = if context.is_empty() {
            format!("Question: {}", input.text)
        } else {
            format!("Conversation so far:\n{}\n\nQuestion: {}", context, input.text)
        };
        services.oracle.generate_stream(ADVICE_INSTRUCTIONS, &prompt).await
    }
}

/// Staged study plan from extracted background and target role.
pub struct LearningPlanPipeline;

#[async_trait::async_trait]
impl Pipeline for LearningPlanPipeline {
    fn id(&self) -> &'static str {
        "learning_plan"
    }

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError> {
        let params = match input.params {
            PipelineParams::Learning(p) => p,
            other => {
                return Err(CoreError::pipeline(
                    self.id(),
                    format!("wrong parameter record: {:?}", other),
                ))
            }
        };
        let background = if params.background == UNSPECIFIED {
            "none stated"
        } else {
            &params.background
        };
        let prompt = format!(
            "Current background: {}\nTarget role: {}",
            background, params.target_role
        );
        services
            .oracle
            .generate_stream(LEARNING_INSTRUCTIONS, &prompt)
            .await
    }
}

/// Live listing search: query the search collaborator, then stream an oracle
/// summary grounded in the snippets. Zero snippets short-circuits without an
/// oracle call.
pub struct ExternalSearchPipeline;

#[async_trait::async_trait]
impl Pipeline for ExternalSearchPipeline {
    fn id(&self) -> &'static str {
        "external_search"
    }

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError> {
        let params = match input.params {
            PipelineParams::Search(p) => p,
            other => {
                return Err(CoreError::pipeline(
                    self.id(),
                    format!("wrong parameter record: {:?}", other),
                ))
            }
        };
        let query = if params.location == UNSPECIFIED {
            format!("{} jobs", params.topic)
        } else {
            format!("{} jobs in {}", params.topic, params.location)
        };
        info!(%query, "running external search");
        let snippets = services.search.search(&query).await?;
        if snippets.is_empty() {
            return Ok(single_fragment(format!(
                "I couldn't find any current listings for '{}'. Try broadening the role or location.",
                query
            )));
        }

        let digest = snippets
            .iter()
            .map(|s| format!("- {} ({})\n  {}", s.title, s.url, s.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("Search query: {}\n\nResult snippets:\n{}", query, digest);
        services
            .oracle
            .generate_stream(SEARCH_SUMMARY_INSTRUCTIONS, &prompt)
            .await
    }
}

/// First-pass review of the ingested document.
pub struct DocumentAnalysisPipeline;

#[async_trait::async_trait]
impl Pipeline for DocumentAnalysisPipeline {
    fn id(&self) -> &'static str {
        "document_analysis"
    }

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError> {
        // The router already turns the missing-document case into a canned
        // reply; this check only covers direct executor use.
        let Some(document) = input.state.reference_document() else {
            return Ok(single_fragment(MISSING_DOCUMENT_MESSAGE));
        };
        let prompt = format!("Document under review:\n{}", document);
        services
            .oracle
            .generate_stream(DOCUMENT_ANALYSIS_INSTRUCTIONS, &prompt)
            .await
    }
}

/// Grounded Q&A over the already-ingested document.
pub struct DocumentFollowUpPipeline;

#[async_trait::async_trait]
impl Pipeline for DocumentFollowUpPipeline {
    fn id(&self) -> &'static str {
        "document_followup"
    }

    async fn run(
        &self,
        input: PipelineInput<'_>,
        services: &Services,
    ) -> Result<FragmentStream, CoreError> {
        let Some(document) = input.state.reference_document() else {
            return Ok(single_fragment(MISSING_DOCUMENT_MESSAGE));
        };
        let prompt = format!(
            "Document:\n{}\n\nQuestion: {}",
            document, input.text
        );
        services
            .oracle
            .generate_stream(DOCUMENT_FOLLOWUP_INSTRUCTIONS, &prompt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::descriptor_for;
    use crate::route::RouteLabel;

    #[test]
    fn defaults_cover_every_generative_route() {
        let registry = PipelineRegistry::defaults();
        for route in RouteLabel::ALL {
            if let Some(desc) = descriptor_for(route) {
                assert!(
                    registry.get(desc.pipeline_id).is_some(),
                    "no pipeline registered for {}",
                    desc.pipeline_id
                );
            }
        }
        assert_eq!(registry.pipeline_ids().len(), 5);
    }
}
