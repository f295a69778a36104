use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of identical failures before the user is texted about them
pub const ESCALATION_THRESHOLD: u32 = 3;

/// Calendar days each campground has already produced an SMS for
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifiedState {
    notified: HashMap<String, HashSet<NaiveDate>>,
}

impl NotifiedState {
    /// Whether `campground` may still be notified on `date`
    pub fn should_notify(&self, campground: &str, date: NaiveDate) -> bool {
        !self
            .notified
            .get(campground)
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Record that `campground` was notified on `date`. Entries are never removed.
    pub fn mark_notified(&mut self, campground: &str, date: NaiveDate) {
        self.notified
            .entry(campground.to_string())
            .or_default()
            .insert(date);
    }
}

/// Occurrence counts keyed by the exact composed error text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEscalation {
    counts: HashMap<String, u32>,
}

impl ErrorEscalation {
    /// Count one occurrence of `error_text`.
    ///
    /// Returns `true` on the third and every later occurrence of the same text.
    pub fn record(&mut self, error_text: &str) -> bool {
        if !self.counts.contains_key(error_text) {
            self.counts.insert(error_text.to_string(), 0);
        }
        let count = self.counts.get_mut(error_text).map(|c| {
            *c += 1;
            *c
        });

        count.is_some_and(|c| c >= ESCALATION_THRESHOLD)
    }

    /// How many times `error_text` has been recorded
    pub fn count(&self, error_text: &str) -> u32 {
        self.counts.get(error_text).copied().unwrap_or(0)
    }
}

/// Mutable state of one run, owned by whoever drives the poll cycles.
///
/// An HTTP invocation gets a fresh one; the background watcher keeps one across
/// all of its cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Identifier used to correlate log lines of one run
    pub run_id: Uuid,
    /// Dedup of availability notifications
    pub notified: NotifiedState,
    /// Error repetition counts
    pub errors: ErrorEscalation,
}

impl RunState {
    /// Fresh state with a new run id
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            notified: NotifiedState::default(),
            errors: ErrorEscalation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_notify_once_per_campground_per_day() {
        let mut state = NotifiedState::default();

        assert!(state.should_notify("766", day(1)));
        state.mark_notified("766", day(1));
        assert!(!state.should_notify("766", day(1)));

        // other days and other campgrounds are unaffected
        assert!(state.should_notify("766", day(2)));
        assert!(state.should_notify("767", day(1)));
    }

    #[test]
    fn test_marking_twice_is_harmless() {
        let mut state = NotifiedState::default();
        state.mark_notified("766", day(1));
        state.mark_notified("766", day(1));
        assert!(!state.should_notify("766", day(1)));
    }

    #[test]
    fn test_escalates_from_third_occurrence_on() {
        let mut errors = ErrorEscalation::default();

        assert!(!errors.record("boom"));
        assert!(!errors.record("boom"));
        assert!(errors.record("boom"));
        assert!(errors.record("boom"));
        assert_eq!(errors.count("boom"), 4);
    }

    #[test]
    fn test_escalation_is_keyed_by_exact_text() {
        let mut errors = ErrorEscalation::default();

        assert!(!errors.record("boom"));
        assert!(!errors.record("boom "));
        assert!(!errors.record("Boom"));
        assert!(!errors.record("boom"));
        assert_eq!(errors.count("boom"), 2);
        assert_eq!(errors.count("never seen"), 0);
    }

    #[test]
    fn test_run_ids_differ() {
        assert_ne!(RunState::new().run_id, RunState::new().run_id);
    }
}
