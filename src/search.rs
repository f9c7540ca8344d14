//! Search hand-off boundary
//!
//! Once collection completes, the gathered parameters are finalized into a
//! fully-populated `SearchRequest` and handed to the search collaborator
//! exactly once per session.

use crate::state_machine::state::{DateRange, TripParameters};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Fallback values substituted for any field never captured in
/// conversation. Applied at finalization only, never during extraction.
#[derive(Debug, Clone)]
pub struct SearchDefaults {
    pub destination: String,
    pub origin: String,
    pub travelers: u32,
    pub budget: u32,
    /// Days from today to the default departure.
    pub trip_offset_days: u64,
    /// Default trip length in days.
    pub trip_length_days: u64,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            destination: "Tokyo".to_string(),
            origin: "New York".to_string(),
            travelers: 2,
            budget: 3000,
            trip_offset_days: 30,
            trip_length_days: 10,
        }
    }
}

impl SearchDefaults {
    fn date_range(&self, today: NaiveDate) -> DateRange {
        let start = today
            .checked_add_days(Days::new(self.trip_offset_days))
            .unwrap_or(today);
        let end = start
            .checked_add_days(Days::new(self.trip_length_days))
            .unwrap_or(start);
        DateRange::new(start, end)
    }
}

/// The finalized parameter bundle handed off when collection completes.
/// Every field is concrete; defaults have already been substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Human-readable one-line summary of the search.
    pub query: String,
    pub destination: String,
    pub origin: String,
    pub dates: DateRange,
    pub travelers: u32,
    pub budget: u32,
}

impl SearchRequest {
    /// Build a request from gathered parameters, substituting the
    /// configured default for any field still unset.
    pub fn finalize(
        parameters: &TripParameters,
        defaults: &SearchDefaults,
        today: NaiveDate,
    ) -> Self {
        let destination = parameters
            .destination
            .clone()
            .unwrap_or_else(|| defaults.destination.clone());
        let origin = parameters
            .origin
            .clone()
            .unwrap_or_else(|| defaults.origin.clone());
        Self {
            query: format!("{destination} from {origin}"),
            destination,
            origin,
            dates: parameters.dates.unwrap_or_else(|| defaults.date_range(today)),
            travelers: parameters.travelers.unwrap_or(defaults.travelers),
            budget: parameters.budget.unwrap_or(defaults.budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn empty_parameters_get_all_defaults() {
        let request = SearchRequest::finalize(
            &TripParameters::default(),
            &SearchDefaults::default(),
            today(),
        );
        assert_eq!(request.destination, "Tokyo");
        assert_eq!(request.origin, "New York");
        assert_eq!(request.travelers, 2);
        assert_eq!(request.budget, 3000);
        assert_eq!(request.query, "Tokyo from New York");
        assert_eq!(
            request.dates.start,
            NaiveDate::from_ymd_opt(2026, 9, 5).unwrap()
        );
        assert_eq!(
            request.dates.end,
            NaiveDate::from_ymd_opt(2026, 9, 15).unwrap()
        );
    }

    #[test]
    fn captured_fields_survive_finalization() {
        let parameters = TripParameters {
            destination: Some("Lisbon".to_string()),
            budget: Some(4500),
            ..TripParameters::default()
        };
        let request =
            SearchRequest::finalize(&parameters, &SearchDefaults::default(), today());
        assert_eq!(request.destination, "Lisbon");
        assert_eq!(request.budget, 4500);
        // Unset fields still get concrete defaults.
        assert_eq!(request.origin, "New York");
        assert_eq!(request.query, "Lisbon from New York");
    }
}
