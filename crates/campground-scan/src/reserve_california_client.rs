use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::scan_types::{ScanError, SiteAvailability};
use crate::source::{AvailabilitySource, FacilityCandidate, Resolution, is_facility_id, window_end};

const RDR_DATE_FORMAT: &str = "%m-%d-%Y";

/// Client for ReserveCalifornia (UseDirect `rdr` API)
pub struct ReserveCaliforniaClient {
    client: Client,
    base_url: String,
    web_url: String,
}

/// Park entry from the name search endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CityPark {
    /// Park display name
    pub name: String,
    /// Place id used by the place search
    pub place_id: Option<i64>,
}

/// Response of the place search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaceResponse {
    /// The park that was asked for
    pub selected_place: Option<Place>,
}

/// A park and its facilities
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Place {
    /// Park name
    pub name: String,
    /// Facilities keyed by facility id
    #[serde(default)]
    pub facilities: HashMap<String, PlaceFacility>,
}

/// Facility summary inside a place
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaceFacility {
    /// Facility id
    pub facility_id: i64,
    /// Facility name
    pub name: String,
}

/// Response of the grid search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridResponse {
    /// Null when the facility id is unknown
    pub facility: Option<GridFacility>,
}

/// Facility with its bookable units
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridFacility {
    /// Facility name, used as sub-campground
    pub name: String,
    /// Units keyed by unit id
    pub units: Option<HashMap<String, GridUnit>>,
}

/// One bookable unit (site)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridUnit {
    /// Site name as displayed
    pub name: String,
    /// Nights keyed by date
    #[serde(default)]
    pub slices: HashMap<String, GridSlice>,
}

/// Status of a unit on one night
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridSlice {
    /// Night, `YYYY-MM-DD`
    pub date: String,
    /// Not reserved
    pub is_free: bool,
    /// Closed for booking regardless of reservations
    #[serde(default)]
    pub is_blocked: bool,
}

impl ReserveCaliforniaClient {
    /// Create a new ReserveCalifornia client
    pub fn new() -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: "https://calirdr.usedirect.com/rdr/rdr".to_string(),
            web_url: "https://www.reservecalifornia.com".to_string(),
        })
    }

    /// Facilities of every park whose name contains `park_name`
    pub async fn get_facility_ids(
        &self,
        park_name: &str,
    ) -> Result<Vec<FacilityCandidate>, ScanError> {
        let url = format!(
            "{}/fd/citypark/namecontains/{}",
            self.base_url,
            urlencoding::encode(park_name)
        );
        let response = self.client.get(&url).send().await?;
        let parks: Vec<CityPark> = read_json(response).await?;

        debug!("Found {} parks matching '{}'", parks.len(), park_name);

        let today = chrono::Local::now().date_naive();
        let mut candidates = Vec::new();
        for park in parks {
            let Some(place_id) = park.place_id else {
                continue;
            };

            let body = serde_json::json!({
                "PlaceId": place_id,
                "StartDate": today.format(RDR_DATE_FORMAT).to_string(),
                "Nights": 1,
                "CountNearby": false,
                "IsADA": false,
                "UnitCategoryId": 0,
                "SleepingUnitId": 0,
                "MinVehicleLength": 0,
                "UnitTypesGroupIds": [],
            });
            let response = self
                .client
                .post(format!("{}/search/place", self.base_url))
                .json(&body)
                .send()
                .await?;
            let place: PlaceResponse = read_json(response).await?;

            if let Some(place) = place.selected_place {
                candidates.extend(facility_candidates(place));
            }
        }

        Ok(candidates)
    }
}

#[async_trait]
impl AvailabilitySource for ReserveCaliforniaClient {
    async fn resolve_campground(&self, reference: &str) -> Result<Resolution, ScanError> {
        if is_facility_id(reference) {
            return Ok(Resolution::Resolved(reference.to_string()));
        }
        Ok(Resolution::NeedsLookup(self.get_facility_ids(reference).await?))
    }

    async fn fetch_availability(
        &self,
        campground_id: &str,
        start_date: NaiveDate,
        months: u32,
    ) -> Result<Vec<SiteAvailability>, ScanError> {
        let end_date = window_end(start_date, months);
        let last_night = end_date.pred_opt().unwrap_or(end_date);
        let facility_id: i64 = campground_id
            .parse()
            .map_err(|_| ScanError::Validation(format!("Not a facility id: {}", campground_id)))?;

        let body = serde_json::json!({
            "FacilityId": facility_id,
            "StartDate": start_date.format(RDR_DATE_FORMAT).to_string(),
            "EndDate": last_night.format(RDR_DATE_FORMAT).to_string(),
            "IsADA": false,
            "MinVehicleLength": 0,
            "UnitCategoryId": 0,
            "UnitTypesGroupIds": [],
            "WebOnly": true,
            "SleepingUnitId": 0,
            "UnitSort": "orderby",
            "InSeasonOnly": true,
        });

        debug!(
            "Fetching ReserveCalifornia grid for facility {} from {} to {}",
            campground_id, start_date, last_night
        );

        let response = self
            .client
            .post(format!("{}/search/grid", self.base_url))
            .json(&body)
            .send()
            .await?;
        let grid: GridResponse = read_json(response).await?;

        let facility = grid
            .facility
            .ok_or_else(|| ScanError::CampgroundNotFound(campground_id.to_string()))?;

        Ok(parse_grid(facility, start_date, end_date))
    }

    fn campground_url(&self, campground_id: &str) -> String {
        format!(
            "{}/Web/Default.aspx#!park/facility/{}",
            self.web_url, campground_id
        )
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ScanError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        warn!("ReserveCalifornia request failed with status {}: {}", status, body);
        return Err(ScanError::from_status(status, &body));
    }

    Ok(response.json().await?)
}

fn facility_candidates(place: Place) -> Vec<FacilityCandidate> {
    let mut candidates: Vec<_> = place
        .facilities
        .into_values()
        .map(|f| FacilityCandidate {
            park: place.name.clone(),
            facility_id: f.facility_id.to_string(),
            facility_name: f.name,
        })
        .collect();
    candidates.sort_by(|a, b| a.facility_name.cmp(&b.facility_name));
    candidates
}

/// Flatten a grid facility into per-night records within `[start_date, end_date)`
pub fn parse_grid(
    facility: GridFacility,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<SiteAvailability> {
    let mut sites = Vec::new();

    for unit in facility.units.unwrap_or_default().into_values() {
        for slice in unit.slices.values() {
            let Some(date) = slice
                .date
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                warn!("Failed to parse date: {}", slice.date);
                continue;
            };

            if date < start_date || date >= end_date {
                continue;
            }

            sites.push(SiteAvailability {
                site_id: unit.name.clone(),
                sub_campground: Some(facility.name.clone()),
                date,
                available: slice.is_free && !slice.is_blocked,
            });
        }
    }

    sites
}
