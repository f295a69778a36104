use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::scan_types::{ScanError, SiteAvailability};

/// One bookable facility offered when a reference could not be resolved directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityCandidate {
    /// Park the facility belongs to
    pub park: String,
    /// Id to use as campground reference
    pub facility_id: String,
    /// Display name
    pub facility_name: String,
}

/// Outcome of resolving a campground reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Source-specific campground id, ready for fetching
    Resolved(String),
    /// The source needs a facility id; these are the candidates for the reference
    NeedsLookup(Vec<FacilityCandidate>),
}

/// A reservation backend (ReserveCalifornia, recreation.gov, ...)
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Turn a user-supplied reference into a campground id
    async fn resolve_campground(&self, reference: &str) -> Result<Resolution, ScanError>;

    /// Per-site, per-night availability from `start_date` for `months` months
    async fn fetch_availability(
        &self,
        campground_id: &str,
        start_date: NaiveDate,
        months: u32,
    ) -> Result<Vec<SiteAvailability>, ScanError>;

    /// Page where the user can book the campground
    fn campground_url(&self, campground_id: &str) -> String;
}

/// True for non-empty, all-ASCII-digit references
pub fn is_facility_id(reference: &str) -> bool {
    !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit())
}

/// First day after a scan window of `months` months starting at `start`
pub fn window_end(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(chrono::Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_facility_id() {
        assert!(is_facility_id("766"));
        assert!(!is_facility_id("Yosemite"));
        assert!(!is_facility_id("76a"));
        assert!(!is_facility_id(""));
    }

    #[test]
    fn test_window_end() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            window_end(start, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            window_end(start, 2),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );
    }
}
