//! Turn router: one traversal per turn through the routing state machine.
//!
//! Received -> rule check -> (short-circuit | classify) -> dispatch lookup ->
//! extraction -> (clarify | execute) -> stream -> persist. No state is
//! revisited within a turn. The router holds no cross-turn locks; concurrent
//! turns on the same conversation must be serialized by the caller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::classifier;
use crate::config::CoreConfig;
use crate::dispatch::{self, PipelineDescriptor, MISSING_DOCUMENT_MESSAGE, PIPELINE_APOLOGY};
use crate::emitter;
use crate::error::CoreError;
use crate::extractor::{self, Extraction};
use crate::pipeline::{PipelineInput, PipelineRegistry};
use crate::route::{RouteLabel, RoutingDecision};
use crate::rules;
use crate::services::Services;
use crate::turn::{ConversationState, Turn};

/// The routing and dispatch core. Construct once, share across turns.
pub struct TurnRouter {
    services: Services,
    registry: Arc<PipelineRegistry>,
    config: CoreConfig,
}

impl TurnRouter {
    pub fn new(services: Services, registry: Arc<PipelineRegistry>, config: CoreConfig) -> Self {
        Self {
            services,
            registry,
            config,
        }
    }

    /// With the default pipeline set and environment config.
    pub fn with_defaults(services: Services) -> Self {
        Self::new(
            services,
            Arc::new(PipelineRegistry::defaults()),
            CoreConfig::from_env(),
        )
    }

    /// Processes one incoming turn: resolves the route, runs at most one
    /// pipeline, streams fragments to `tx` in production order, persists the
    /// turn pair exactly once, and appends both turns to `state`.
    ///
    /// `Err(Cancelled)` means the caller disconnected: nothing was persisted
    /// and the state was left untouched. All other failure modes degrade to a
    /// deterministic user-visible message and still persist.
    pub async fn process_turn(
        &self,
        conversation_id: &str,
        state: &mut ConversationState,
        incoming: Turn,
        tx: mpsc::Sender<String>,
    ) -> Result<RoutingDecision, CoreError> {
        let decision = match rules::evaluate(state, &incoming) {
            Some(decision) => decision,
            None => {
                let context = state.context_summary(self.config.max_context_turns);
                classifier::classify(self.services.oracle.as_ref(), &incoming.text, &context).await
            }
        };
        info!(
            conversation = conversation_id,
            route = decision.route.as_str(),
            reason = ?decision.reason,
            "turn routed"
        );

        let final_text = match dispatch::descriptor_for(decision.route) {
            None => self.canned_reply(decision.route, &tx).await?,
            Some(descriptor) => {
                self.run_pipeline(descriptor, decision.route, state, &incoming.text, &tx)
                    .await?
            }
        };

        // Past this point the turn counts as processed: persist exactly once,
        // then extend the in-memory state.
        let system_turn = Turn::system(final_text);
        if let Err(e) = self
            .services
            .store
            .append_pair(conversation_id, incoming.clone(), system_turn.clone())
            .await
        {
            // The response is already streamed and cannot be un-sent; log and
            // keep the turn loop alive.
            warn!(conversation = conversation_id, error = %e, "persistence failed");
        }
        state.push(incoming);
        state.push(system_turn);
        state.set_last_route(decision.route);

        Ok(decision)
    }

    async fn canned_reply(
        &self,
        route: RouteLabel,
        tx: &mpsc::Sender<String>,
    ) -> Result<String, CoreError> {
        let text = match route {
            RouteLabel::End => self.config.closing_message.as_str(),
            RouteLabel::Irrelevant => self.config.irrelevant_message.as_str(),
            // descriptor_for returns None only for the two canned routes
            other => {
                return Err(CoreError::pipeline(
                    other.as_str(),
                    "route has no descriptor and no canned reply",
                ))
            }
        };
        emitter::emit_single(text, tx).await
    }

    async fn run_pipeline(
        &self,
        descriptor: PipelineDescriptor,
        route: RouteLabel,
        state: &ConversationState,
        user_text: &str,
        tx: &mpsc::Sender<String>,
    ) -> Result<String, CoreError> {
        // A document route without an ingested document is a user-facing
        // message, not an internal error.
        if matches!(
            route,
            RouteLabel::AnalyzeDocument | RouteLabel::DocumentFollowUp
        ) && state.reference_document().is_none()
        {
            return emitter::emit_single(MISSING_DOCUMENT_MESSAGE, tx).await;
        }

        let params = match extractor::extract(
            self.services.oracle.as_ref(),
            descriptor.params,
            user_text,
        )
        .await
        {
            Extraction::Clarify(question) => {
                info!(pipeline = descriptor.pipeline_id, "clarification gate hit");
                return emitter::emit_single(&question, tx).await;
            }
            Extraction::Ready(params) => params,
        };

        let Some(pipeline) = self.registry.get(descriptor.pipeline_id) else {
            warn!(pipeline = descriptor.pipeline_id, "no pipeline registered for descriptor");
            return emitter::emit_single(PIPELINE_APOLOGY, tx).await;
        };

        let input = PipelineInput {
            text: user_text,
            params: &params,
            state,
        };
        match pipeline.run(input, &self.services).await {
            Ok(stream) => emitter::drain(stream, tx).await,
            Err(e) => {
                warn!(pipeline = descriptor.pipeline_id, error = %e, "pipeline failed");
                emitter::emit_single(PIPELINE_APOLOGY, tx).await
            }
        }
    }
}
