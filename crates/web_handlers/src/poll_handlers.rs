use actix_web::{HttpResponse, Result, web};
use campground_scan::{PollRequest, RunState, ScanError, ScanExecutor};

use crate::poll_types::PollResponse;

/// Runs one poll cycle for the requested campgrounds.
///
/// Each request gets its own dedup and escalation state.
pub async fn poll_campgrounds(
    executor: web::Data<ScanExecutor>,
    request: web::Json<PollRequest>,
) -> Result<HttpResponse, ScanError> {
    let job = request.into_inner().into_job()?;

    log::info!(
        "📥 Poll request for {} campground(s) on {}",
        job.campgrounds.len(),
        job.api
    );

    let mut state = RunState::new();
    let outcome = executor.run_cycle(&job, &mut state).await;

    Ok(HttpResponse::Ok().json(PollResponse::from(outcome)))
}

/// Liveness probe
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// JSON extractor config that reports malformed bodies as validation errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("❌ Rejected poll request: {}", err);
        ScanError::Validation(err.to_string()).into()
    })
}

/// Registers the poll routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health))
        .service(web::scope("/api").route("/poll", web::post().to(poll_campgrounds)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use campground_scan::{
        AvailabilitySource, FacilityCandidate, MockSmsService, Resolution, SiteAvailability,
        Sources, is_facility_id,
    };
    use chrono::{Days, NaiveDate};
    use serde_json::{Value, json};

    #[derive(Default)]
    struct StubSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl AvailabilitySource for StubSource {
        async fn resolve_campground(&self, reference: &str) -> Result<Resolution, ScanError> {
            if is_facility_id(reference) {
                Ok(Resolution::Resolved(reference.to_string()))
            } else {
                Ok(Resolution::NeedsLookup(vec![FacilityCandidate {
                    park: "Yosemite".to_string(),
                    facility_id: "443".to_string(),
                    facility_name: "Upper Pines".to_string(),
                }]))
            }
        }

        async fn fetch_availability(
            &self,
            _campground_id: &str,
            start_date: NaiveDate,
            _months: u32,
        ) -> Result<Vec<SiteAvailability>, ScanError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok((1..=3)
                .map(|i| SiteAvailability {
                    site_id: "A".to_string(),
                    sub_campground: None,
                    date: start_date + Days::new(i),
                    available: true,
                })
                .collect())
        }

        fn campground_url(&self, campground_id: &str) -> String {
            format!("https://example.test/{}", campground_id)
        }
    }

    fn executor(source: Arc<StubSource>) -> web::Data<ScanExecutor> {
        web::Data::new(ScanExecutor::new(
            Sources::new(source.clone(), source),
            Arc::new(MockSmsService),
            None,
        ))
    }

    #[actix_web::test]
    async fn test_zero_nights_is_bad_request() {
        let source = Arc::new(StubSource::default());
        let app = test::init_service(
            App::new()
                .app_data(executor(source.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/poll")
            .set_json(json!({"campground": ["123"], "nights": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(executor(Arc::new(StubSource::default())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/poll")
            .set_json(json!({"campground": ["123"], "api": "hipcamp"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_results_body() {
        let app = test::init_service(
            App::new()
                .app_data(executor(Arc::new(StubSource::default())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/poll")
            .set_json(json!({"campground": ["123"], "nights": 2, "notify": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["results"][0]["campground"], "123");
        let rows = body["results"][0]["availability"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Site"], "A");
        assert_eq!(rows[0]["Nights"], 2);
    }

    #[actix_web::test]
    async fn test_name_returns_facility_directory() {
        let source = Arc::new(StubSource::default());
        let app = test::init_service(
            App::new()
                .app_data(executor(source.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/poll")
            .set_json(json!({"campground": ["Yosemite"], "api": "reservecalifornia"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let table = body["facility_ids"].as_str().unwrap();
        assert!(table.contains("Upper Pines"));
        assert!(body.get("results").is_none());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new()
                .app_data(executor(Arc::new(StubSource::default())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
