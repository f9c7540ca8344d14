//! Prompt templates and the assistant system prompt
//!
//! Scripted mode reads its per-stage prompts from here; model-assisted mode
//! sends `SYSTEM_PROMPT` to the completion provider and watches replies for
//! `COMPLETION_MARKER`.

use crate::search::SearchRequest;
use crate::state_machine::state::{Stage, TripParameters};

/// Token the assistant embeds in its reply once every trip parameter has
/// been discussed. Checked via substring match.
pub const COMPLETION_MARKER: &str = "SEARCH_READY";

/// System prompt for model-assisted mode.
pub const SYSTEM_PROMPT: &str = "\
You are WanderAI, a friendly and knowledgeable travel assistant. Your goal is to help users plan their perfect trip through natural conversation.

Follow this conversational flow:
1. Ask about their travel destination or what's inspiring their trip
2. Ask where they're traveling from
3. Ask about their preferred travel dates
4. Ask about the number of travelers
5. Ask about their budget range

Keep your responses:
- Friendly and conversational
- Encouraging about their travel plans
- Helpful with suggestions when appropriate
- Brief but informative

When you have collected all the information (destination, origin, dates, travelers, budget), respond with \"SEARCH_READY\" at the end of your message along with a summary of their travel plans.

Remember to be enthusiastic about travel and make the conversation feel natural and engaging!";

/// Opening assistant message for a fresh session.
pub fn greeting() -> String {
    "Hi, I'm WanderAI! Where would you like to go, or what's inspiring your trip?".to_string()
}

/// Prompt shown on entering a non-terminal stage, optionally echoing
/// already-known fields. Returns the prompt text plus quick-reply
/// suggestions (Travelers and Budget stages only).
pub fn stage_prompt(stage: Stage, parameters: &TripParameters) -> (String, Vec<String>) {
    match stage {
        Stage::AwaitingDestination => (greeting(), Vec::new()),
        Stage::AwaitingOrigin => {
            let text = match &parameters.destination {
                Some(destination) => {
                    format!("{destination} sounds wonderful! Where will you be traveling from?")
                }
                None => "Where will you be traveling from?".to_string(),
            };
            (text, Vec::new())
        }
        Stage::AwaitingDates => (
            "When are you thinking of traveling? Rough dates are fine.".to_string(),
            Vec::new(),
        ),
        Stage::AwaitingTravelers => (
            "How many people are traveling?".to_string(),
            vec![
                "Just me".to_string(),
                "2 people".to_string(),
                "3 people".to_string(),
                "4 people".to_string(),
            ],
        ),
        Stage::AwaitingBudget => (
            "And what's your budget for the whole trip?".to_string(),
            vec![
                "$1,000".to_string(),
                "$2,000".to_string(),
                "$3,000".to_string(),
                "$5,000+".to_string(),
            ],
        ),
        Stage::Ready => (String::new(), Vec::new()),
    }
}

/// Closing assistant message once the search request is finalized.
pub fn ready_summary(request: &SearchRequest) -> String {
    format!(
        "Perfect! Searching trips to {} from {} for {} traveler(s), {} to {}, within ${}.",
        request.destination,
        request.origin,
        request.travelers,
        request.dates.start,
        request.dates.end,
        request.budget,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_prompt_echoes_destination() {
        let parameters = TripParameters {
            destination: Some("Lisbon".to_string()),
            ..TripParameters::default()
        };
        let (text, suggestions) = stage_prompt(Stage::AwaitingOrigin, &parameters);
        assert!(text.contains("Lisbon"));
        assert!(suggestions.is_empty());
    }

    #[test]
    fn only_travelers_and_budget_have_quick_replies() {
        let parameters = TripParameters::default();
        for stage in [
            Stage::AwaitingDestination,
            Stage::AwaitingOrigin,
            Stage::AwaitingDates,
        ] {
            assert!(stage_prompt(stage, &parameters).1.is_empty());
        }
        assert!(!stage_prompt(Stage::AwaitingTravelers, &parameters).1.is_empty());
        assert!(!stage_prompt(Stage::AwaitingBudget, &parameters).1.is_empty());
    }

    #[test]
    fn system_prompt_carries_the_marker() {
        assert!(SYSTEM_PROMPT.contains(COMPLETION_MARKER));
    }
}
