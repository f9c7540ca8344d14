//! Property-based tests for the state machine
//!
//! These verify the invariants that unit tests can only spot-check: any
//! five non-empty inputs terminate a scripted session, extraction never
//! panics on arbitrary text, and parameters only ever grow.

use super::state::{Mode, SessionContext, SessionState, Stage, TripParameters};
use super::transition::transition;
use super::{Effect, Event};
use crate::extract::extract;
use crate::search::SearchDefaults;
use chrono::NaiveDate;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

/// Printable text guaranteed non-empty after trimming.
fn arb_utterance() -> impl Strategy<Value = String> {
    "[ -~]{0,20}[!-~][ -~]{0,20}"
}

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::AwaitingDestination),
        Just(Stage::AwaitingOrigin),
        Just(Stage::AwaitingDates),
        Just(Stage::AwaitingTravelers),
        Just(Stage::AwaitingBudget),
    ]
}

fn context(mode: Mode) -> SessionContext {
    SessionContext {
        mode,
        today: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        defaults: SearchDefaults::default(),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Scripted collection terminates in exactly five turns with exactly
    /// one hand-off, no matter what the user says.
    #[test]
    fn scripted_five_inputs_reach_ready_once(
        inputs in proptest::collection::vec(arb_utterance(), 5)
    ) {
        let ctx = context(Mode::Scripted);
        let mut state = SessionState::default();
        let mut parameters = TripParameters::default();
        let mut handoffs = 0;

        for (i, input) in inputs.iter().enumerate() {
            let result = transition(
                &state,
                &parameters,
                &ctx,
                Event::UserMessage { text: input.clone() },
            ).unwrap();
            state = result.new_state;
            parameters = result.parameters;
            handoffs += result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::HandOffSearch { .. }))
                .count();

            let terminal = i == inputs.len() - 1;
            prop_assert_eq!(state.is_terminal(), terminal);
        }

        prop_assert_eq!(handoffs, 1);
    }

    /// Extraction is total over arbitrary text and never clears a field.
    #[test]
    fn extraction_never_panics_or_clears(
        utterance in "[ -~]{0,60}",
        stage in arb_stage(),
    ) {
        let current = TripParameters {
            destination: Some("Lisbon".to_string()),
            origin: Some("Oslo".to_string()),
            travelers: Some(3),
            budget: Some(1200),
            ..TripParameters::default()
        };
        let out = extract(&utterance, stage, &current, today());

        prop_assert_eq!(out.destination.as_deref(), Some("Lisbon"));
        prop_assert_eq!(out.origin.as_deref(), Some("Oslo"));
        prop_assert_eq!(out.travelers, Some(3));
        prop_assert_eq!(out.budget, Some(1200));
    }

    /// Parameters grow monotonically over any scripted session: a field
    /// set on one turn keeps its value on every later turn.
    #[test]
    fn scripted_parameters_are_monotone(
        inputs in proptest::collection::vec(arb_utterance(), 5)
    ) {
        let ctx = context(Mode::Scripted);
        let mut state = SessionState::default();
        let mut parameters = TripParameters::default();

        for input in inputs {
            let before = parameters.clone();
            let result = transition(
                &state,
                &parameters,
                &ctx,
                Event::UserMessage { text: input },
            ).unwrap();
            state = result.new_state;
            parameters = result.parameters;

            if let Some(destination) = before.destination {
                prop_assert_eq!(parameters.destination.clone(), Some(destination));
            }
            if let Some(origin) = before.origin {
                prop_assert_eq!(parameters.origin.clone(), Some(origin));
            }
            if let Some(dates) = before.dates {
                prop_assert_eq!(parameters.dates, Some(dates));
            }
            if let Some(travelers) = before.travelers {
                prop_assert_eq!(parameters.travelers, Some(travelers));
            }
            if let Some(budget) = before.budget {
                prop_assert_eq!(parameters.budget, Some(budget));
            }
        }
    }

    /// User messages never panic the machine in any state; they either
    /// transition or return a typed error.
    #[test]
    fn user_messages_are_total(
        text in "[ -~]{0,40}",
        stage in arb_stage(),
        busy in any::<bool>(),
    ) {
        let ctx = context(Mode::ModelAssisted);
        let state = if busy {
            SessionState::AwaitingAssistant {
                stage,
                pending_input: "pending".to_string(),
            }
        } else {
            SessionState::Collecting { stage }
        };
        let _ = transition(
            &state,
            &TripParameters::default(),
            &ctx,
            Event::UserMessage { text },
        );
    }
}
