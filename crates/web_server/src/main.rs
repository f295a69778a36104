//! Main entry point for the campground availability poller.
//! Serves the poll endpoint and optionally watches one request in the background.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use campground_scan::{
    MockSmsService, PollRequest, RecGovClient, ReserveCaliforniaClient, ScanExecutor, SmsService,
    Sources,
};
use notification_services::NotificationService;
use web_handlers::configure;

mod config;
mod scan_manager;

use config::{ServerConfig, SmsBackend};
use scan_manager::ScanManager;

async fn sms_service(backend: SmsBackend) -> Arc<dyn SmsService> {
    match backend {
        SmsBackend::Mock => {
            log::info!("📱 Using mock SMS service");
            Arc::new(MockSmsService)
        }
        SmsBackend::Sns => match NotificationService::new().await {
            Ok(service) => {
                log::info!("📱 SNS notification service initialized successfully");
                Arc::new(service)
            }
            Err(e) => {
                log::error!("❌ Failed to initialize notification service: {}", e);
                log::warn!("🔧 Check AWS credentials and region; falling back to mock SMS");
                Arc::new(MockSmsService)
            }
        },
    }
}

fn load_watch_request(path: &str) -> std::io::Result<PollRequest> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(std::io::Error::other)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campground poller...");

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;

    let reserve_california =
        Arc::new(ReserveCaliforniaClient::new().map_err(std::io::Error::other)?);
    let recreation_gov = Arc::new(
        RecGovClient::new(config.recreation_gov_api_key.clone()).map_err(std::io::Error::other)?,
    );
    if config.recreation_gov_api_key.is_none() {
        log::warn!("🔑 RECREATION_GOV_API_KEY not set; recreation.gov name lookups may fail");
    }

    let executor = Arc::new(ScanExecutor::new(
        Sources::new(reserve_california, recreation_gov),
        sms_service(config.sms_backend).await,
        Some(config.executor_config()),
    ));

    let mut watcher = ScanManager::new(executor.clone());
    if let Some(path) = config.watch_request_file.as_deref() {
        let job = load_watch_request(path)
            .and_then(|request| request.into_job().map_err(std::io::Error::other))?;
        log::info!("👀 Watching request from {}", path);
        watcher.start(job);
    }

    log::info!("🌐 Server will be available at: http://{}", config.bind_address);

    let data = web::Data::from(executor);
    let result = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await;

    watcher.stop().await;
    result
}
