//! Intent classifier wrapper.
//!
//! The oracle is non-deterministic; everything around it here is not. The
//! instruction block demands exactly one label from the closed set, the raw
//! reply is cleaned of quoting artifacts, and anything that still fails to
//! parse resolves to the deterministic default (`GeneralAdvice`).

use tracing::{debug, warn};

use crate::route::{RouteLabel, RoutingDecision};
use crate::services::Oracle;

const ROUTING_INSTRUCTIONS: &str = "\
You are the routing stage of a career guidance assistant. Analyze the user's \
request and output exactly ONE word from this list: AnalyzeDocument, \
DocumentFollowUp, GeneralAdvice, LearningPlan, ExternalSearch, Irrelevant, End.\n\
\n\
Routing rules, in order:\n\
1. AnalyzeDocument: the user asks for a first review of their resume, CV, or \
uploaded document ('review my resume', 'analyze my CV').\n\
2. DocumentFollowUp: a follow-up about a document already discussed ('what did \
my resume say about X', 'rewrite my project description').\n\
3. ExternalSearch: the user wants actual job listings or openings ('find data \
science jobs', 'openings for Python developers in Berlin'). Asking what a role \
does is NOT a search.\n\
4. LearningPlan: the user states their current skills or background AND asks \
for a path to a specific target role ('I know Python, how do I become a data \
scientist?'). A generic roadmap question without current skills is GeneralAdvice.\n\
5. End: a clear goodbye or closing ('thanks, that's all', 'bye', 'got it, no \
more questions').\n\
6. Irrelevant: the request has nothing to do with careers, jobs, skills, or \
professional documents.\n\
7. GeneralAdvice: everything else. This is the default.\n\
\n\
Output only the label. No quotes, punctuation, or explanation.";

/// Word-level typo correction applied before classification and extraction.
/// Extend the map as new patterns show up in real usage.
pub fn preprocess(input: &str) -> String {
    const CORRECTIONS: &[(&str, &str)] = &[
        ("comman", "common"),
        ("prject", "project"),
        ("resme", "resume"),
        ("carrer", "career"),
    ];
    input
        .split_whitespace()
        .map(|word| {
            CORRECTIONS
                .iter()
                .find(|(wrong, _)| word.eq_ignore_ascii_case(wrong))
                .map(|(_, right)| *right)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips whitespace, quoting artifacts, and trailing punctuation from the raw
/// oracle reply, keeping only the first token.
pub fn clean_label(raw: &str) -> String {
    raw.trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| matches!(c, '`' | '\'' | '"' | '.' | ',' | ':' | '*'))
        .to_string()
}

/// Classifies the incoming turn. Validation failures and oracle errors both
/// resolve to the deterministic fallback; this function never errors.
pub async fn classify(
    oracle: &dyn Oracle,
    incoming_text: &str,
    context_summary: &str,
) -> RoutingDecision {
    let prepped = preprocess(incoming_text);
    let input = if context_summary.is_empty() {
        format!("User request: '{}'\n\nRouting decision:", prepped)
    } else {
        format!(
            "Conversation so far:\n{}\n\nUser request: '{}'\n\nRouting decision:",
            context_summary, prepped
        )
    };

    let raw = match oracle.generate(ROUTING_INSTRUCTIONS, &input).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "classifier oracle call failed, using default route");
            return RoutingDecision::fallback();
        }
    };

    let cleaned = clean_label(&raw);
    match cleaned.parse::<RouteLabel>() {
        Ok(route) => {
            debug!(route = route.as_str(), "classifier resolved route");
            RoutingDecision::classified(route)
        }
        Err(_) => {
            warn!(label = %cleaned, "classifier returned out-of-set label, using default route");
            RoutingDecision::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_label_strips_artifacts() {
        assert_eq!(clean_label("  `End`  "), "End");
        assert_eq!(clean_label("\"ExternalSearch\"."), "ExternalSearch");
        assert_eq!(clean_label("GeneralAdvice because the user"), "GeneralAdvice");
        assert_eq!(clean_label(""), "");
    }

    #[test]
    fn preprocess_fixes_known_typos() {
        assert_eq!(preprocess("review my resme please"), "review my resume please");
        assert_eq!(preprocess("carrer advice"), "career advice");
        assert_eq!(preprocess("nothing wrong here"), "nothing wrong here");
    }
}
