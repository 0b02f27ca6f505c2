//! Collaborator contracts and the injected service registry.
//!
//! Every external capability sits behind a trait object handed to the router
//! at construction, so tests swap in scripted fakes and nothing global is
//! mutable. Client handles are stateless and safe to share across concurrent
//! turns.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pipeline::FragmentStream;
use crate::turn::Turn;

/// The external text-generation capability, treated as a black box that
/// eventually returns text or fails. Non-deterministic by nature; all
/// determinism (validation, fallback) lives in the wrappers that call it.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Complete generation: instructions plus input, one text back.
    async fn generate(&self, instructions: &str, input: &str) -> Result<String, CoreError>;

    /// Streaming variant: fragments in production order.
    async fn generate_stream(
        &self,
        instructions: &str,
        input: &str,
    ) -> Result<FragmentStream, CoreError>;

    /// Structured extraction constrained to a small fixed-schema JSON object.
    /// `schema` is a prose-plus-example description of the expected shape.
    async fn extract_structured(
        &self,
        schema: &str,
        input: &str,
    ) -> Result<serde_json::Value, CoreError>;
}

/// One result snippet from the external search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// External search capability, used only by the job-search pipeline.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, CoreError>;
}

/// Persistence collaborator: appends the user and system turns atomically,
/// exactly once per processed turn.
#[async_trait::async_trait]
pub trait TurnStore: Send + Sync {
    async fn append_pair(
        &self,
        conversation_id: &str,
        user: Turn,
        system: Turn,
    ) -> Result<(), CoreError>;
}

/// Everything the router needs from the outside world, injected once.
#[derive(Clone)]
pub struct Services {
    pub oracle: Arc<dyn Oracle>,
    pub search: Arc<dyn SearchProvider>,
    pub store: Arc<dyn TurnStore>,
}

impl Services {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        search: Arc<dyn SearchProvider>,
        store: Arc<dyn TurnStore>,
    ) -> Self {
        Self {
            oracle,
            search,
            store,
        }
    }
}

/// In-memory turn store for the repl and tests.
#[derive(Default)]
pub struct MemoryTurnStore {
    pairs: Mutex<Vec<(String, Turn, Turn)>>,
}

impl MemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn pairs(&self) -> Vec<(String, Turn, Turn)> {
        self.pairs.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TurnStore for MemoryTurnStore {
    async fn append_pair(
        &self,
        conversation_id: &str,
        user: Turn,
        system: Turn,
    ) -> Result<(), CoreError> {
        self.pairs
            .lock()
            .map_err(|_| CoreError::Persistence("turn store lock poisoned".into()))?
            .push((conversation_id.to_string(), user, system));
        Ok(())
    }
}
