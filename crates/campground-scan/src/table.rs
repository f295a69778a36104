//! Plain-text tables for logs, SMS bodies and the facility directory.

use serde::Serialize;

use crate::scan_types::{CALENDAR_DATE_FORMAT, QualifyingStay};
use crate::source::FacilityCandidate;

const COLUMN_GAP: usize = 4;

/// Something that renders as one row of a text table
pub trait TableRow {
    /// Column headers, in display order
    fn headers() -> &'static [&'static str];
    /// Cell values, same order as [`TableRow::headers`]
    fn cells(&self) -> Vec<String>;
}

/// Human-facing row describing one qualifying stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityRow {
    /// Site identifier
    #[serde(rename = "Site")]
    pub site: String,
    /// Loop / facility, empty when unknown
    #[serde(rename = "Sub-Campground")]
    pub sub_campground: String,
    /// First night, MM/DD/YYYY
    #[serde(rename = "Date")]
    pub date: String,
    /// Weekday of the first night
    #[serde(rename = "Weekday")]
    pub weekday: String,
    /// Number of nights
    #[serde(rename = "Nights")]
    pub nights: u32,
}

impl From<&QualifyingStay> for AvailabilityRow {
    fn from(stay: &QualifyingStay) -> Self {
        Self {
            site: stay.site_id.clone(),
            sub_campground: stay.sub_campground.clone().unwrap_or_default(),
            date: stay.start_date.format(CALENDAR_DATE_FORMAT).to_string(),
            weekday: stay.start_date.format("%A").to_string(),
            nights: stay.nights,
        }
    }
}

impl TableRow for AvailabilityRow {
    fn headers() -> &'static [&'static str] {
        &["Site", "Sub-Campground", "Date", "Weekday", "Nights"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.site.clone(),
            self.sub_campground.clone(),
            self.date.clone(),
            self.weekday.clone(),
            self.nights.to_string(),
        ]
    }
}

impl TableRow for FacilityCandidate {
    fn headers() -> &'static [&'static str] {
        &["Park", "Facility ID", "Facility Name"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.park.clone(),
            self.facility_id.clone(),
            self.facility_name.clone(),
        ]
    }
}

/// Convert stays into table rows, keeping their order
pub fn table_data(stays: &[QualifyingStay]) -> Vec<AvailabilityRow> {
    stays.iter().map(AvailabilityRow::from).collect()
}

/// Render rows as a left-aligned table, header first.
///
/// Every column is padded to its widest cell plus four spaces.
pub fn create_table_string<R: TableRow>(rows: &[R]) -> String {
    let mut lines: Vec<Vec<String>> = vec![R::headers().iter().map(|h| h.to_string()).collect()];
    lines.extend(rows.iter().map(TableRow::cells));

    let widths: Vec<usize> = (0..R::headers().len())
        .map(|col| {
            lines
                .iter()
                .filter_map(|line| line.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                + COLUMN_GAP
        })
        .collect();

    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Availability report used both for the log and (truncated) for the SMS
pub fn create_log(rows: &[AvailabilityRow], reservation_url: &str) -> String {
    format!(
        "Found Availability:\n\n{}\nReserve a spot here: {}",
        create_table_string(rows),
        reservation_url
    )
}
