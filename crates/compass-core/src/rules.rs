//! Deterministic safety net evaluated before the classifier.
//!
//! One ordered rule table, first match wins. The incoming turn is the newest
//! entry of the conversation; it joins the stored history only after the turn
//! completes. The echo-prevention rule is unconditional and must stay first:
//! every other rule is heuristic and could otherwise let the core process its
//! own output.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::route::{RouteLabel, RoutingDecision};
use crate::turn::{ConversationState, Origin, Turn};

/// Possessive/reference patterns that mark a follow-up about the ingested
/// document. Kept in one place so the keyword list cannot drift between call
/// sites.
static FOLLOW_UP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bmy\s+(resume|cv|document|background|profile)\b",
        r"(?i)\b(experience|skills?|education|summary|projects?)\s+section\b",
        r"(?i)\b(rewrite|improve|reword|polish|shorten|fix)\b.*\bmy\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("follow-up pattern must compile"))
    .collect()
});

struct Rule {
    name: &'static str,
    route: RouteLabel,
    matches: fn(&ConversationState, &Turn) -> bool,
}

/// A system-origin incoming turn means the core is being handed its own
/// output; routing it anywhere but `End` would loop.
fn incoming_is_system(_state: &ConversationState, incoming: &Turn) -> bool {
    incoming.origin == Origin::System
}

fn references_document(state: &ConversationState, incoming: &Turn) -> bool {
    state.reference_document().is_some()
        && FOLLOW_UP_PATTERNS.iter().any(|p| p.is_match(&incoming.text))
}

/// Priority high to low. Echo prevention stays at index 0.
static RULES: &[Rule] = &[
    Rule {
        name: "echo-prevention",
        route: RouteLabel::End,
        matches: incoming_is_system,
    },
    Rule {
        name: "document-follow-up",
        route: RouteLabel::DocumentFollowUp,
        matches: references_document,
    },
];

/// Runs the rule table against the incoming turn. `Some` short-circuits the
/// classifier entirely; `None` means proceed to classification. Synchronous,
/// never suspends.
pub fn evaluate(state: &ConversationState, incoming: &Turn) -> Option<RoutingDecision> {
    for rule in RULES {
        if (rule.matches)(state, incoming) {
            debug!(rule = rule.name, route = rule.route.as_str(), "rule matched");
            return Some(RoutingDecision::rule(rule.route));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::DecisionReason;

    #[test]
    fn echo_prevention_fires_on_system_origin_turn() {
        let mut state = ConversationState::new();
        state.push(Turn::user("hello"));
        let decision =
            evaluate(&state, &Turn::system("anything at all")).expect("rule should match");
        assert_eq!(decision.route, RouteLabel::End);
        assert_eq!(decision.reason, DecisionReason::RuleMatch);
    }

    #[test]
    fn echo_prevention_outranks_document_follow_up() {
        let mut state = ConversationState::new();
        state.set_reference_document("resume text");
        let decision = evaluate(&state, &Turn::system("rewrite my experience section")).unwrap();
        assert_eq!(decision.route, RouteLabel::End);
    }

    #[test]
    fn user_turn_after_system_reply_is_not_an_echo() {
        let mut state = ConversationState::new();
        state.push(Turn::user("hello"));
        state.push(Turn::system("hi, how can I help?"));
        assert!(evaluate(&state, &Turn::user("what does a data engineer do?")).is_none());
    }

    #[test]
    fn document_follow_up_requires_a_document() {
        let state = ConversationState::new();
        assert!(evaluate(&state, &Turn::user("rewrite my experience section")).is_none());
    }

    #[test]
    fn document_follow_up_matches_possessive_phrases() {
        let mut state = ConversationState::new();
        state.set_reference_document("resume text");
        for text in [
            "rewrite my experience section",
            "what did my resume say about projects?",
            "please improve my summary",
            "tell me about my background",
        ] {
            let decision = evaluate(&state, &Turn::user(text)).expect(text);
            assert_eq!(decision.route, RouteLabel::DocumentFollowUp, "{}", text);
        }
    }

    #[test]
    fn unrelated_text_falls_through_to_classifier() {
        let mut state = ConversationState::new();
        state.set_reference_document("resume text");
        state.push(Turn::user("earlier question"));
        assert!(evaluate(&state, &Turn::user("find data scientist jobs in Berlin")).is_none());
    }
}
