use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use rec_gov::FacilitySearch;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::scan_types::{ScanError, SiteAvailability};
use crate::source::{AvailabilitySource, Resolution, is_facility_id, window_end};

/// Client for recreation.gov campground availability
pub struct RecGovClient {
    client: Client,
    internal_base_url: String,
    facility_search: FacilitySearch,
    request_interval: Duration,
}

/// Response structure from recreation.gov internal availability API
#[derive(Debug, Deserialize)]
pub struct RecGovInternalAvailabilityResponse {
    /// Campsites keyed by campsite id
    pub campsites: HashMap<String, CampsiteAvailabilityData>,
}

/// Campsite availability data from internal API
#[derive(Debug, Deserialize)]
pub struct CampsiteAvailabilityData {
    /// Status per night, keyed by `YYYY-MM-DDT00:00:00Z`
    pub availabilities: HashMap<String, String>,
    /// Campsite id
    pub campsite_id: Option<String>,
    /// Site label shown on recreation.gov (e.g. `A012`)
    pub site: Option<String>,
    /// Loop the site belongs to
    #[serde(rename = "loop")]
    pub campsite_loop: Option<String>,
}

impl RecGovClient {
    /// Create a new recreation.gov client; `api_key` is used for RIDB name lookups
    pub fn new(api_key: Option<String>) -> Result<Self, ScanError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        let facility_search = FacilitySearch::new(api_key)
            .map_err(|e| ScanError::ApiError(format!("Failed to create RIDB client: {}", e)))?;

        Ok(Self {
            client,
            internal_base_url: "https://www.recreation.gov/api".to_string(),
            facility_search,
            request_interval: Duration::from_millis(500),
        })
    }

    /// Fetch one calendar month of availability
    async fn get_month(
        &self,
        facility_id: &str,
        month_start: NaiveDate,
    ) -> Result<RecGovInternalAvailabilityResponse, ScanError> {
        let url = format!(
            "{}/camps/availability/campground/{}/month",
            self.internal_base_url, facility_id
        );
        let start_date_param = format!("{}T00:00:00.000Z", month_start.format("%Y-%m-%d"));

        debug!("Making request to: {}?start_date={}", url, start_date_param);

        let response = self
            .client
            .get(&url)
            .query(&[("start_date", start_date_param)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            warn!("API request failed with status {}: {}", status, body);
            return Err(ScanError::from_status(status, &body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AvailabilitySource for RecGovClient {
    async fn resolve_campground(&self, reference: &str) -> Result<Resolution, ScanError> {
        if is_facility_id(reference) {
            return Ok(Resolution::Resolved(reference.to_string()));
        }

        debug!("Looking up recreation.gov facility id for '{}'", reference);
        self.facility_search
            .find_campground_id(reference)
            .await
            .map_err(|e| ScanError::ApiError(e.to_string()))?
            .map(Resolution::Resolved)
            .ok_or_else(|| ScanError::CampgroundNotFound(reference.to_string()))
    }

    async fn fetch_availability(
        &self,
        campground_id: &str,
        start_date: NaiveDate,
        months: u32,
    ) -> Result<Vec<SiteAvailability>, ScanError> {
        let end_date = window_end(start_date, months);
        let mut month_start = NaiveDate::from_ymd_opt(start_date.year(), start_date.month(), 1)
            .ok_or_else(|| ScanError::DataFormat("Invalid date".to_string()))?;

        let mut sites = Vec::new();
        while month_start < end_date {
            let response = self.get_month(campground_id, month_start).await?;
            sites.extend(parse_month(response, start_date, end_date));

            month_start = month_start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| ScanError::DataFormat("Date out of range".to_string()))?;
            if month_start < end_date {
                tokio::time::sleep(self.request_interval).await;
            }
        }

        Ok(sites)
    }

    fn campground_url(&self, campground_id: &str) -> String {
        format!(
            "https://www.recreation.gov/camping/campgrounds/{}",
            campground_id
        )
    }
}

/// Flatten a month response into per-night records within `[start_date, end_date)`
pub fn parse_month(
    response: RecGovInternalAvailabilityResponse,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<SiteAvailability> {
    let mut sites = Vec::new();

    for (campsite_id, data) in response.campsites {
        let site_id = data.site.clone().unwrap_or(campsite_id);

        for (date_str, status) in &data.availabilities {
            // Dates look like "2024-01-15T00:00:00Z"
            let date = match date_str
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            {
                Some(date) => date,
                None => {
                    warn!("Failed to parse date: {}", date_str);
                    continue;
                }
            };

            if date < start_date || date >= end_date {
                continue;
            }

            sites.push(SiteAvailability {
                site_id: site_id.clone(),
                sub_campground: data.campsite_loop.clone(),
                date,
                available: parse_availability_status(status),
            });
        }
    }

    sites
}

/// Whether a recreation.gov status string means the night can be booked
pub fn parse_availability_status(status: &str) -> bool {
    match status {
        "Available" => true,
        "Reserved" | "Not Available" | "Not Reservable" | "Walk-up" | "Open" => false,
        // Legacy RIDB format support
        "A" => true,
        "R" | "X" | "W" | "N" => false,
        // A price string means available
        s if s.starts_with('$') => true,
        _ => {
            debug!("Unknown availability status: {}", status);
            false
        }
    }
}
