//! Parameter extraction from free-form utterances
//!
//! Deterministic, case-insensitive pattern rules. Extraction is pure: it
//! never mutates its input, never fails on arbitrary text, and returns the
//! parameters unchanged when nothing recognizable matches.

use crate::state_machine::state::{DateRange, Stage, TripParameters};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn money_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\s*([0-9][0-9,]*)").expect("valid regex"))
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("valid regex"))
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("valid regex"))
}

/// Derive an updated parameter set from one utterance.
///
/// `stage` scopes the verbatim destination/origin capture; the keyword
/// rules (budget, travelers, dates) run on every utterance so one message
/// can fill several fields. Already-set fields are never overwritten.
/// `today` anchors relative-date phrases so the function stays pure.
pub fn extract(
    utterance: &str,
    stage: Stage,
    current: &TripParameters,
    today: NaiveDate,
) -> TripParameters {
    let mut out = current.clone();
    let trimmed = utterance.trim();
    if trimmed.is_empty() {
        return out;
    }

    // Stage-scoped capture: the whole utterance is the place name. No
    // geocoding, no keyword search.
    match stage {
        Stage::AwaitingDestination if out.destination.is_none() => {
            out.destination = Some(trimmed.to_string());
        }
        Stage::AwaitingOrigin if out.origin.is_none() => {
            out.origin = Some(trimmed.to_string());
        }
        _ => {}
    }

    if out.budget.is_none() {
        out.budget = parse_budget(trimmed);
    }
    if out.travelers.is_none() {
        out.travelers = parse_travelers(trimmed);
    }
    if out.dates.is_none() {
        out.dates = parse_dates(trimmed, today);
    }

    out
}

/// First `$`-prefixed amount, thousands separators allowed, whole dollars.
fn parse_budget(text: &str) -> Option<u32> {
    let captures = money_re().captures(text)?;
    let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// First integer in text that mentions travelers; digit-free single-person
/// wording maps to one.
fn parse_travelers(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();

    let keyworded = ["person", "people", "traveler", "traveller"]
        .iter()
        .any(|k| lower.contains(k));
    if keyworded {
        // Currency amounts are scrubbed first so "$3,000 for 2 people"
        // reads the 2, not the 3.
        let scrubbed = money_re().replace_all(&lower, " ");
        if let Some(m) = int_re().find(&scrubbed) {
            if let Ok(n) = m.as_str().parse::<u32>() {
                if n >= 1 {
                    return Some(n);
                }
            }
        }
    }

    let has_digit = lower.bytes().any(|b| b.is_ascii_digit());
    if !has_digit {
        let single = ["just me", "only me", "by myself", "solo"];
        if single.iter().any(|p| lower.contains(p)) {
            return Some(1);
        }
    }

    None
}

/// Explicit calendar dates or a relative keyword phrase, resolved to a
/// concrete range. Two dates form the pair, one date starts a week-long
/// trip. Explicit dates win over keywords.
fn parse_dates(text: &str, today: NaiveDate) -> Option<DateRange> {
    let dates: Vec<NaiveDate> = iso_date_re()
        .find_iter(text)
        .filter_map(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
        .collect();
    match dates.as_slice() {
        [] => {}
        [single] => return Some(week_from(*single)),
        [first, second, ..] => return Some(DateRange::new(*first, *second)),
    }

    let lower = text.to_lowercase();
    if lower.contains("next month") {
        return Some(week_from(first_of_next_month(today)));
    }
    if lower.contains("next week") {
        let start = today.checked_add_days(Days::new(7)).unwrap_or(today);
        return Some(week_from(start));
    }

    None
}

fn week_from(start: NaiveDate) -> DateRange {
    let end = start.checked_add_days(Days::new(7)).unwrap_or(start);
    DateRange::new(start, end)
}

fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn empty() -> TripParameters {
        TripParameters::default()
    }

    #[test]
    fn budget_with_thousands_separator() {
        let out = extract(
            "$3,200 for the trip",
            Stage::AwaitingBudget,
            &empty(),
            today(),
        );
        assert_eq!(out.budget, Some(3200));
    }

    #[test]
    fn first_dollar_amount_wins() {
        let out = extract(
            "between $2,000 and $4,000",
            Stage::AwaitingBudget,
            &empty(),
            today(),
        );
        assert_eq!(out.budget, Some(2000));
    }

    #[test]
    fn just_me_is_one_traveler() {
        let out = extract("Just me", Stage::AwaitingTravelers, &empty(), today());
        assert_eq!(out.travelers, Some(1));
    }

    #[test]
    fn traveler_count_from_keyworded_text() {
        let out = extract("4 people total", Stage::AwaitingTravelers, &empty(), today());
        assert_eq!(out.travelers, Some(4));
    }

    #[test]
    fn traveler_count_ignores_currency_digits() {
        let out = extract(
            "$3,000 for 2 people",
            Stage::AwaitingBudget,
            &empty(),
            today(),
        );
        assert_eq!(out.travelers, Some(2));
        assert_eq!(out.budget, Some(3000));
    }

    #[test]
    fn stage_scoped_destination_capture() {
        let out = extract(
            "  Kyoto, ideally in autumn ",
            Stage::AwaitingDestination,
            &empty(),
            today(),
        );
        assert_eq!(out.destination.as_deref(), Some("Kyoto, ideally in autumn"));
        assert_eq!(out.origin, None);
    }

    #[test]
    fn place_names_are_not_captured_outside_their_stage() {
        let out = extract("Kyoto", Stage::AwaitingBudget, &empty(), today());
        assert_eq!(out.destination, None);
        assert_eq!(out.origin, None);
    }

    #[test]
    fn set_fields_are_never_overwritten() {
        let current = TripParameters {
            destination: Some("Lisbon".to_string()),
            ..TripParameters::default()
        };
        let out = extract("Porto", Stage::AwaitingDestination, &current, today());
        assert_eq!(out.destination.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn unrelated_fields_untouched_by_traveler_utterance() {
        let current = TripParameters {
            destination: Some("Lisbon".to_string()),
            budget: Some(1500),
            ..TripParameters::default()
        };
        let out = extract("3 travelers", Stage::AwaitingTravelers, &current, today());
        assert_eq!(out.travelers, Some(3));
        assert_eq!(out.destination.as_deref(), Some("Lisbon"));
        assert_eq!(out.origin, None);
        assert_eq!(out.dates, None);
        assert_eq!(out.budget, Some(1500));
    }

    #[test]
    fn unrecognized_text_returns_input_unchanged() {
        let current = TripParameters {
            budget: Some(900),
            ..TripParameters::default()
        };
        let out = extract(
            "hmm let me think about it",
            Stage::AwaitingDates,
            &current,
            today(),
        );
        assert_eq!(out, current);
    }

    #[test]
    fn explicit_date_pair() {
        let out = extract(
            "2026-12-20 to 2026-12-30",
            Stage::AwaitingDates,
            &empty(),
            today(),
        );
        let dates = out.dates.unwrap();
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2026, 12, 20).unwrap());
        assert_eq!(dates.end, NaiveDate::from_ymd_opt(2026, 12, 30).unwrap());
    }

    #[test]
    fn reversed_date_pair_is_reordered() {
        let out = extract(
            "2026-12-30 back, leaving 2026-12-20",
            Stage::AwaitingDates,
            &empty(),
            today(),
        );
        let dates = out.dates.unwrap();
        assert!(dates.start <= dates.end);
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2026, 12, 20).unwrap());
    }

    #[test]
    fn single_date_starts_a_week_long_trip() {
        let out = extract("2026-10-01", Stage::AwaitingDates, &empty(), today());
        let dates = out.dates.unwrap();
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(dates.end, NaiveDate::from_ymd_opt(2026, 10, 8).unwrap());
    }

    #[test]
    fn next_month_resolves_against_reference_date() {
        let out = extract(
            "sometime next month",
            Stage::AwaitingDates,
            &empty(),
            today(),
        );
        let dates = out.dates.unwrap();
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert_eq!(dates.end, NaiveDate::from_ymd_opt(2026, 9, 8).unwrap());
    }

    #[test]
    fn next_week_resolves_against_reference_date() {
        let out = extract("next week works", Stage::AwaitingDates, &empty(), today());
        let dates = out.dates.unwrap();
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2026, 8, 13).unwrap());
    }

    #[test]
    fn december_rolls_into_january() {
        let december = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        let out = extract("next month", Stage::AwaitingDates, &empty(), december);
        let dates = out.dates.unwrap();
        assert_eq!(dates.start, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn empty_utterance_changes_nothing() {
        let out = extract("   ", Stage::AwaitingDestination, &empty(), today());
        assert_eq!(out, empty());
    }
}
