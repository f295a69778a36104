use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::criteria::filter_to_criteria;
use crate::run_state::RunState;
use crate::scan_types::*;
use crate::sms_service::{NotificationError, SmsService};
use crate::source::{AvailabilitySource, FacilityCandidate, Resolution};
use crate::table::{create_log, create_table_string, table_data};

const FAILURE_MESSAGE: &str = "Failed to retrieve availability.";

/// The source adapters a poll request can select between
#[derive(Clone)]
pub struct Sources {
    reserve_california: Arc<dyn AvailabilitySource>,
    recreation_gov: Arc<dyn AvailabilitySource>,
}

impl Sources {
    /// Bundle one adapter per [`Api`]
    pub fn new(
        reserve_california: Arc<dyn AvailabilitySource>,
        recreation_gov: Arc<dyn AvailabilitySource>,
    ) -> Self {
        Self {
            reserve_california,
            recreation_gov,
        }
    }

    /// Adapter for `api`
    pub fn get(&self, api: Api) -> &dyn AvailabilitySource {
        match api {
            Api::ReserveCalifornia => self.reserve_california.as_ref(),
            Api::RecreationGov => self.recreation_gov.as_ref(),
        }
    }
}

/// Tunables of the poll engine
#[derive(Debug, Clone)]
pub struct ScanExecutorConfig {
    /// Upper bound for each resolve/fetch call (default: 30 seconds)
    pub fetch_timeout: Duration,

    /// Rows of the availability table included in an SMS (default: 2)
    pub notification_rows: usize,

    /// SMS destination used when a request does not carry one
    pub default_recipient: Option<String>,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            notification_rows: 2,
            default_recipient: None,
        }
    }
}

/// Qualifying stays found for one campground
#[derive(Debug, Clone, Serialize)]
pub struct CampgroundReport {
    /// Reference as given in the request
    pub campground: String,
    /// Source-specific id the reference resolved to
    pub campground_id: String,
    /// Booking page
    pub reservation_url: String,
    /// Matching windows, never empty
    pub stays: Vec<QualifyingStay>,
}

/// What one poll cycle produced
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Every campground was processed; failed and empty ones are missing from the list
    Completed(Vec<CampgroundReport>),
    /// A reference needs a facility id; the run stops and returns the candidates
    FacilityLookup {
        /// The reference that could not be used as-is
        campground: String,
        /// Facilities the user can pick from
        facilities: Vec<FacilityCandidate>,
    },
}

/// Drives poll cycles: resolve, fetch, filter, notify.
///
/// Campgrounds are processed one after the other, so the [`RunState`] passed in
/// needs no locking.
pub struct ScanExecutor {
    sources: Sources,
    sms_service: Arc<dyn SmsService>,
    config: ScanExecutorConfig,
}

impl ScanExecutor {
    /// Create a new executor
    pub fn new(
        sources: Sources,
        sms_service: Arc<dyn SmsService>,
        config: Option<ScanExecutorConfig>,
    ) -> Self {
        Self {
            sources,
            sms_service,
            config: config.unwrap_or_default(),
        }
    }

    /// Run one cycle for `job`, scanning from today's local date
    pub async fn run_cycle(&self, job: &PollJob, state: &mut RunState) -> CycleOutcome {
        self.run_cycle_on(job, state, Local::now().date_naive()).await
    }

    /// Run one cycle as if the current date were `today`
    pub async fn run_cycle_on(
        &self,
        job: &PollJob,
        state: &mut RunState,
        today: NaiveDate,
    ) -> CycleOutcome {
        info!(
            "Starting poll cycle {} on {} for {} campground(s)",
            state.run_id,
            job.api,
            job.campgrounds.len()
        );

        let source = self.sources.get(job.api);
        let mut reports = Vec::new();

        for campground in &job.campgrounds {
            let campground_id = match self.bounded(source.resolve_campground(campground)).await {
                Ok(Resolution::Resolved(id)) => id,
                Ok(Resolution::NeedsLookup(facilities)) => {
                    info!(
                        "{} must use facility ID. Searching for facility IDs using provided \
                         campground `{}` (note: this must be the park that the campground is in)",
                        job.api, campground
                    );
                    info!(
                        "Found facilities in park:\n\n{}\n",
                        create_table_string(&facilities)
                    );
                    return CycleOutcome::FacilityLookup {
                        campground: campground.clone(),
                        facilities,
                    };
                }
                Err(e) => {
                    self.log_and_text_error(FAILURE_MESSAGE, e.to_string(), job, state, today)
                        .await;
                    continue;
                }
            };

            if let Some(report) = self
                .poll_campground(source, campground, campground_id, job, state, today)
                .await
            {
                reports.push(report);
            }
        }

        info!(
            "Finished poll cycle {}: {} campground(s) reported",
            state.run_id,
            reports.len()
        );
        CycleOutcome::Completed(reports)
    }

    /// Fetch, filter and notify for a single campground
    async fn poll_campground(
        &self,
        source: &dyn AvailabilitySource,
        campground: &str,
        campground_id: String,
        job: &PollJob,
        state: &mut RunState,
        today: NaiveDate,
    ) -> Option<CampgroundReport> {
        debug!(
            "Fetching {} month(s) of availability for {} ({})",
            job.months, campground, campground_id
        );

        let records = match self
            .bounded(source.fetch_availability(&campground_id, today, job.months))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                self.log_and_text_error(FAILURE_MESSAGE, e.to_string(), job, state, today)
                    .await;
                return None;
            }
        };

        let stays = filter_to_criteria(&records, &job.criteria);
        let reservation_url = source.campground_url(&campground_id);

        if stays.is_empty() {
            info!(
                "No availability found for {} :( Trying again in {} minutes.",
                campground, job.check_every
            );
            return None;
        }

        let rows = table_data(&stays);
        info!("{}", create_log(&rows, &reservation_url));

        if job.notify && state.notified.should_notify(campground, today) {
            // Marked before sending: a failed send is not retried today
            state.notified.mark_notified(campground, today);

            let preview = &rows[..rows.len().min(self.config.notification_rows)];
            let text_message = create_log(preview, &reservation_url);
            if let Err(e) = self.send(job, &text_message).await {
                self.log_and_text_error(FAILURE_MESSAGE, e.to_string(), job, state, today)
                    .await;
            }
        }

        Some(CampgroundReport {
            campground: campground.to_string(),
            campground_id,
            reservation_url,
            stays,
        })
    }

    /// Log a failure and text it once it has been seen often enough
    async fn log_and_text_error(
        &self,
        message: &str,
        error: String,
        job: &PollJob,
        state: &mut RunState,
        today: NaiveDate,
    ) {
        let error_message = format!(
            "{} Trying again in {} minutes.\nError: {}\nDate: {}",
            message, job.check_every, error, today
        );
        error!("{}", error_message);

        if state.errors.record(&error_message) {
            warn!(
                "Error seen {} times, notifying user",
                state.errors.count(&error_message)
            );
            if let Err(e) = self.send(job, &error_message).await {
                warn!("Failed to send error notification: {}", e);
            }
        }
    }

    async fn send(&self, job: &PollJob, message: &str) -> Result<(), NotificationError> {
        let recipient = job
            .recipient
            .as_deref()
            .or(self.config.default_recipient.as_deref())
            .ok_or(NotificationError::MissingRecipient)?;

        let message_id = self.sms_service.send_sms(recipient, message).await?;
        debug!("SMS {} sent to {}", message_id, recipient);
        Ok(())
    }

    /// Apply the configured timeout to a source call
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ScanError>>,
    ) -> Result<T, ScanError> {
        tokio::time::timeout(self.config.fetch_timeout, call)
            .await
            .map_err(|_| ScanError::Timeout(self.config.fetch_timeout))?
    }
}
