use campground_scan::table::{AvailabilityRow, create_table_string, table_data};
use campground_scan::{CampgroundReport, CycleOutcome};
use serde::Serialize;

/// Availability table of one campground
#[derive(Debug, Serialize)]
pub struct CampgroundResult {
    /// Campground reference as requested
    pub campground: String,
    /// One row per qualifying stay
    pub availability: Vec<AvailabilityRow>,
}

impl From<CampgroundReport> for CampgroundResult {
    fn from(report: CampgroundReport) -> Self {
        Self {
            availability: table_data(&report.stays),
            campground: report.campground,
        }
    }
}

/// Body of a successful poll response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PollResponse {
    /// Per-campground results of a completed cycle
    Results {
        /// Results in request order
        results: Vec<CampgroundResult>,
    },
    /// Directory of facility ids, returned instead of results
    FacilityIds {
        /// Facility table rendered as text
        facility_ids: String,
    },
}

impl From<CycleOutcome> for PollResponse {
    fn from(outcome: CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Completed(reports) => PollResponse::Results {
                results: reports.into_iter().map(CampgroundResult::from).collect(),
            },
            CycleOutcome::FacilityLookup { facilities, .. } => PollResponse::FacilityIds {
                facility_ids: create_table_string(&facilities),
            },
        }
    }
}
