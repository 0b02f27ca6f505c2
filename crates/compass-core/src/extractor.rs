//! Parameter extraction for pipelines that need structured arguments.
//!
//! One policy, applied everywhere: a field not confidently present in the input
//! becomes the `UNSPECIFIED` sentinel, a non-parseable oracle reply is treated
//! as all fields unspecified, and a missing *required* field short-circuits the
//! pipeline with a clarifying question instead of invoking it.

use serde_json::Value;
use tracing::{debug, warn};

use crate::classifier::preprocess;
use crate::dispatch::ParamStrategy;
use crate::services::Oracle;

/// Sentinel for "field not confidently extracted". Distinct from empty string.
pub const UNSPECIFIED: &str = "unspecified";

const SEARCH_SCHEMA: &str = r#"{"topic": "the job title or primary skills the user is looking for", "location": "the geographic location to search in, or remote"}
Use "unspecified" for any field the text does not state. Example: for "find me AI engineer jobs in Lahore" reply {"topic": "AI engineer", "location": "Lahore"}."#;

const LEARNING_SCHEMA: &str = r#"{"background": "the user's current skills or experience, comma separated", "target_role": "the job role the user wants to reach"}
Use "unspecified" for any field the text does not state. Example: for "I know Python, how do I become a data scientist?" reply {"background": "Python", "target_role": "data scientist"}."#;

const SEARCH_CLARIFICATION: &str = "It looks like you're searching for jobs. What role or \
skills should I look for? Mentioning a location (or 'remote') helps narrow it down.";

const LEARNING_CLARIFICATION: &str = "To build a learning plan I need your target role. \
What role are you aiming for? Your current skills, if any, help me personalize it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub topic: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningParams {
    pub background: String,
    pub target_role: String,
}

/// Typed parameter record handed to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineParams {
    None,
    Search(SearchParams),
    Learning(LearningParams),
}

/// Outcome of extraction: either the pipeline can run, or the turn resolves to
/// a single clarifying question and the pipeline is never invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Ready(PipelineParams),
    Clarify(String),
}

/// Extracts parameters for the given strategy. Oracle failures are recovered
/// here (all fields unspecified); this function never errors.
pub async fn extract(oracle: &dyn Oracle, strategy: ParamStrategy, incoming_text: &str) -> Extraction {
    let schema = match strategy {
        ParamStrategy::None => return Extraction::Ready(PipelineParams::None),
        ParamStrategy::Search => SEARCH_SCHEMA,
        ParamStrategy::Learning => LEARNING_SCHEMA,
    };

    let prepped = preprocess(incoming_text);
    let value = match oracle.extract_structured(schema, &prepped).await {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "structured extraction failed, treating all fields as unspecified");
            Value::Null
        }
    };
    debug!(?strategy, "extraction result: {}", value);

    match strategy {
        ParamStrategy::Search => gate_search(search_params_from(&value)),
        ParamStrategy::Learning => gate_learning(learning_params_from(&value)),
        ParamStrategy::None => unreachable!("handled above"),
    }
}

fn gate_search(params: SearchParams) -> Extraction {
    if params.topic == UNSPECIFIED {
        Extraction::Clarify(SEARCH_CLARIFICATION.to_string())
    } else {
        Extraction::Ready(PipelineParams::Search(params))
    }
}

fn gate_learning(params: LearningParams) -> Extraction {
    if params.target_role == UNSPECIFIED {
        Extraction::Clarify(LEARNING_CLARIFICATION.to_string())
    } else {
        Extraction::Ready(PipelineParams::Learning(params))
    }
}

fn search_params_from(value: &Value) -> SearchParams {
    SearchParams {
        topic: field_or_sentinel(value, "topic"),
        location: field_or_sentinel(value, "location"),
    }
}

fn learning_params_from(value: &Value) -> LearningParams {
    LearningParams {
        background: field_or_sentinel(value, "background"),
        target_role: field_or_sentinel(value, "target_role"),
    }
}

/// Reads a string field, mapping absence, emptiness, and the oracle's own
/// "not specified" spellings onto the sentinel.
fn field_or_sentinel(value: &Value, key: &str) -> String {
    let raw = value.get(key).and_then(|v| v.as_str()).unwrap_or("").trim();
    if raw.is_empty()
        || raw.eq_ignore_ascii_case(UNSPECIFIED)
        || raw.eq_ignore_ascii_case("not specified")
        || raw.eq_ignore_ascii_case("none")
        || raw.eq_ignore_ascii_case("n/a")
    {
        UNSPECIFIED.to_string()
    } else {
        raw.to_string()
    }
}
