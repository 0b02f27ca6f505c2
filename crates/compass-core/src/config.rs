//! Core configuration loaded from the environment.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | COMPASS_MAX_CONTEXT_TURNS | 6 | Recent turns included in classifier context. |
//! | COMPASS_CLOSING_MESSAGE | built-in | Canned reply for the `End` route. |
//! | COMPASS_IRRELEVANT_MESSAGE | built-in | Canned reply for the `Irrelevant` route. |

use crate::dispatch::{DEFAULT_CLOSING_MESSAGE, DEFAULT_IRRELEVANT_MESSAGE};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Turns of history handed to the classifier as context.
    pub max_context_turns: usize,
    /// Canned reply for `End`.
    pub closing_message: String,
    /// Canned reply for `Irrelevant`.
    pub irrelevant_message: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_context_turns: 6,
            closing_message: DEFAULT_CLOSING_MESSAGE.to_string(),
            irrelevant_message: DEFAULT_IRRELEVANT_MESSAGE.to_string(),
        }
    }
}

impl CoreConfig {
    /// Load from environment. Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            max_context_turns: env_usize("COMPASS_MAX_CONTEXT_TURNS", 6),
            closing_message: env_string("COMPASS_CLOSING_MESSAGE", DEFAULT_CLOSING_MESSAGE),
            irrelevant_message: env_string("COMPASS_IRRELEVANT_MESSAGE", DEFAULT_IRRELEVANT_MESSAGE),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
