//! Error taxonomy for the routing core.
//!
//! Recovery policy: classification and extraction errors are absorbed locally
//! (fallback route, sentinel fields); pipeline and search failures degrade to a
//! user-facing apology; persistence failures are logged and never crash the
//! turn loop. `Cancelled` is the only variant that aborts a turn without a
//! persisted response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("classification failed: {0}")]
    Classification(String),

    #[error("parameter extraction failed: {0}")]
    Extraction(String),

    #[error("pipeline '{pipeline}' failed: {message}")]
    Pipeline { pipeline: String, message: String },

    #[error("oracle call failed: {0}")]
    Oracle(String),

    #[error("search call failed: {0}")]
    Search(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The caller dropped the fragment channel mid-turn. Nothing is persisted.
    #[error("turn cancelled by caller")]
    Cancelled,
}

impl CoreError {
    pub fn pipeline(pipeline: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Pipeline {
            pipeline: pipeline.into(),
            message: message.into(),
        }
    }
}
