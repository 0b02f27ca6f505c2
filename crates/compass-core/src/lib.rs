//! compass-core: routing and dispatch core for a conversational career
//! assistant.
//!
//! For every incoming user turn the router resolves a route (deterministic
//! safety-net rules first, then the intent classifier), dispatches exactly one
//! pipeline with extracted parameters, streams the result back in order, and
//! hands the turn pair to the persistence collaborator exactly once. All
//! external capabilities (text generation, search, persistence) sit behind
//! injected trait objects; see `services`.

mod classifier;
mod config;
mod dispatch;
mod emitter;
mod error;
mod extractor;
mod pipeline;
mod route;
mod router;
mod rules;
mod services;
mod turn;

pub use classifier::{classify, clean_label, preprocess};
pub use config::CoreConfig;
pub use dispatch::{
    descriptor_for, ParamStrategy, PipelineDescriptor, DEFAULT_CLOSING_MESSAGE,
    DEFAULT_IRRELEVANT_MESSAGE, MISSING_DOCUMENT_MESSAGE, PIPELINE_APOLOGY,
};
pub use emitter::{drain, emit_single, EMPTY_RESPONSE_FALLBACK};
pub use error::CoreError;
pub use extractor::{
    extract, Extraction, LearningParams, PipelineParams, SearchParams, UNSPECIFIED,
};
pub use pipeline::{
    DocumentAnalysisPipeline, DocumentFollowUpPipeline, ExternalSearchPipeline, FragmentStream,
    GeneralAdvicePipeline, LearningPlanPipeline, Pipeline, PipelineInput, PipelineRegistry,
};
pub use route::{DecisionReason, RouteLabel, RoutingDecision, UnknownRoute};
pub use router::TurnRouter;
pub use rules::evaluate as evaluate_rules;
pub use services::{
    MemoryTurnStore, Oracle, SearchProvider, SearchSnippet, Services, TurnStore,
};
pub use turn::{ConversationState, Origin, Turn};
