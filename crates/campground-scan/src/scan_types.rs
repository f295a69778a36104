use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Date format accepted in `calendar_date` and used in human-facing tables
pub const CALENDAR_DATE_FORMAT: &str = "%m/%d/%Y";

/// Reservation source a poll request is run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Api {
    /// ReserveCalifornia (California State Parks); needs numeric facility ids
    #[default]
    ReserveCalifornia,
    /// recreation.gov; accepts facility ids or campground names
    RecreationGov,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Api::ReserveCalifornia => write!(f, "ReserveCalifornia"),
            Api::RecreationGov => write!(f, "Recreation.gov"),
        }
    }
}

fn default_nights() -> i64 {
    1
}

fn default_months() -> i64 {
    1
}

fn default_check_every() -> i64 {
    5
}

/// Request structure for one poll invocation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PollRequest {
    /// Overrides the SMS destination for this invocation
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Campground references to poll, in order
    pub campground: Vec<String>,

    /// Minimum number of consecutive nights
    #[serde(default = "default_nights")]
    #[validate(range(min = 1, message = "Nights must be greater than 0."))]
    pub nights: i64,

    /// Weekday names a stay may start on (empty = any)
    #[serde(default)]
    pub day: Vec<String>,

    /// Whether a stay must be held on a single site
    #[serde(default)]
    pub require_same_site: bool,

    /// Number of months to scan, starting today
    #[serde(default = "default_months")]
    #[validate(range(min = 1, message = "Months must be greater than 0."))]
    pub months: i64,

    /// Reservation source to query
    #[serde(default)]
    pub api: Api,

    /// Minutes between polls, only used in retry messages and by the watcher
    #[serde(default = "default_check_every")]
    #[validate(range(min = 1, message = "check_every must be greater than 0."))]
    pub check_every: i64,

    /// Site ids to exclude
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Whether to send SMS notifications on matches
    #[serde(default)]
    pub notify: bool,

    /// Specific dates (MM/DD/YYYY) a stay must cover
    #[serde(default)]
    pub calendar_date: Vec<String>,

    /// Sub-campgrounds (loops, facilities) to restrict to
    #[serde(default)]
    pub sub_campground: Vec<String>,
}

impl PollRequest {
    /// Validate the request and turn it into a ready-to-run job.
    ///
    /// Fails with [`ScanError::Validation`] before any network call is made.
    pub fn into_job(self) -> Result<PollJob, ScanError> {
        self.validate()
            .map_err(|e| ScanError::Validation(format!("Validation error: {}", e)))?;

        let allowed_weekdays = self
            .day
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| ScanError::Validation(format!("Unknown weekday: {}", d)))
            })
            .collect::<Result<HashSet<_>, _>>()?;

        let target_dates = self
            .calendar_date
            .iter()
            .map(|d| {
                NaiveDate::parse_from_str(d, CALENDAR_DATE_FORMAT).map_err(|_| {
                    ScanError::Validation(format!("Invalid calendar date (expected MM/DD/YYYY): {}", d))
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let min_nights = bounded_count("nights", self.nights)?;
        let months = bounded_count("months", self.months)?;
        let check_every = bounded_count("check_every", self.check_every)?;

        let criteria = MatchCriteria {
            allowed_weekdays,
            min_nights,
            ignored_site_ids: self.ignore.into_iter().collect(),
            require_same_site: self.require_same_site,
            target_dates,
            target_sub_campgrounds: self.sub_campground.into_iter().collect(),
        };

        Ok(PollJob {
            campgrounds: self.campground,
            criteria,
            api: self.api,
            months,
            check_every,
            notify: self.notify,
            recipient: self.phone_number.filter(|p| !p.trim().is_empty()),
        })
    }
}

fn bounded_count(field: &str, value: i64) -> Result<u32, ScanError> {
    u32::try_from(value)
        .map_err(|_| ScanError::Validation(format!("{} is out of range: {}", field, value)))
}

/// Criteria a stay has to meet to be reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Weekdays a stay may start on (empty = no constraint)
    pub allowed_weekdays: HashSet<Weekday>,
    /// Exact length of reported windows, at least 1
    pub min_nights: u32,
    /// Sites never reported
    pub ignored_site_ids: HashSet<String>,
    /// Whether one physical site must be held for the whole stay
    pub require_same_site: bool,
    /// Dates a stay should cover (empty = any date in the window)
    pub target_dates: BTreeSet<NaiveDate>,
    /// Sub-campgrounds to restrict to (empty = all)
    pub target_sub_campgrounds: HashSet<String>,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            allowed_weekdays: HashSet::new(),
            min_nights: 1,
            ignored_site_ids: HashSet::new(),
            require_same_site: false,
            target_dates: BTreeSet::new(),
            target_sub_campgrounds: HashSet::new(),
        }
    }
}

/// A validated poll request
#[derive(Debug, Clone)]
pub struct PollJob {
    /// Campground references, polled in this order
    pub campgrounds: Vec<String>,
    /// Match criteria shared by every campground
    pub criteria: MatchCriteria,
    /// Source adapter to use
    pub api: Api,
    /// Scan window length in months
    pub months: u32,
    /// Minutes between polls
    pub check_every: u32,
    /// Whether matches are sent by SMS
    pub notify: bool,
    /// Per-invocation SMS destination
    pub recipient: Option<String>,
}

/// One site's open/closed status for one date, as reported by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAvailability {
    /// Site identifier as shown to users
    pub site_id: String,
    /// Loop / facility the site belongs to, when the source exposes one
    pub sub_campground: Option<String>,
    /// Night the status applies to
    pub date: NaiveDate,
    /// Whether the site can be booked for that night
    pub available: bool,
}

/// A bookable window on one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifyingStay {
    /// Site identifier
    pub site_id: String,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Number of nights
    pub nights: u32,
    /// Loop / facility of the site
    pub sub_campground: Option<String>,
}

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Invalid invocation input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Campground not found
    #[error("Campground not found: {0}")]
    CampgroundNotFound(String),

    /// API error
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// The source did not answer within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ScanError {
    /// Map a non-success HTTP status from an upstream source.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            429 => ScanError::RateLimited,
            401 | 403 => ScanError::AuthenticationFailed,
            404 => ScanError::CampgroundNotFound(body.to_string()),
            _ => ScanError::ApiError(format!("HTTP {} - {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ScanError::DataFormat(e.to_string())
        } else {
            ScanError::Network(e.to_string())
        }
    }
}

impl actix_web::ResponseError for ScanError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            ScanError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            ScanError::CampgroundNotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "campground_not_found",
                "message": format!("Campground not found: {}", msg)
            })),
            ScanError::RateLimited => HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": "rate_limited",
                "message": "Rate limited by external service. Please try again later."
            })),
            ScanError::ApiError(_)
            | ScanError::AuthenticationFailed
            | ScanError::Network(_)
            | ScanError::Timeout(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "upstream_error",
                "message": self.to_string()
            })),
            ScanError::DataFormat(msg) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "data_format_error",
                    "message": format!("Data format error: {}", msg)
                }))
            }
        }
    }
}
