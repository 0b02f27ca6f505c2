//! compass-bridge: concrete clients for the core's collaborator contracts.
//!
//! `OpenRouterClient` implements the `Oracle` trait (completion, SSE
//! streaming, structured extraction); `TavilyClient` implements
//! `SearchProvider`. Both are thin reqwest wrappers with no conversation
//! state, so one instance serves all turns.

mod openrouter;
mod search;

pub use openrouter::OpenRouterClient;
pub use search::TavilyClient;
