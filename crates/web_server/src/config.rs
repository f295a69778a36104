use std::time::Duration;

use campground_scan::ScanExecutorConfig;

/// Errors raised while reading the server configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// How outgoing SMS are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsBackend {
    /// AWS SNS
    Sns,
    /// Log only
    Mock,
}

/// Server settings, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Default SMS destination
    pub sms_to_number: Option<String>,
    /// SMS transport
    pub sms_backend: SmsBackend,
    /// RIDB api key for recreation.gov name lookups
    pub recreation_gov_api_key: Option<String>,
    /// Upper bound for each source call
    pub fetch_timeout: Duration,
    /// JSON poll request run by the background watcher
    pub watch_request_file: Option<String>,
}

impl ServerConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let sms_backend = match get("SMS_BACKEND").as_deref() {
            None | Some("sns") => SmsBackend::Sns,
            Some("mock") => SmsBackend::Mock,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "SMS_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let fetch_timeout = match get("FETCH_TIMEOUT_SECS") {
            None => Duration::from_secs(30),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "FETCH_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            sms_to_number: get("SMS_TO_NUMBER"),
            sms_backend,
            recreation_gov_api_key: get("RECREATION_GOV_API_KEY"),
            fetch_timeout,
            watch_request_file: get("WATCH_REQUEST_FILE"),
        })
    }

    /// Executor tunables derived from these settings
    pub fn executor_config(&self) -> ScanExecutorConfig {
        ScanExecutorConfig {
            fetch_timeout: self.fetch_timeout,
            default_recipient: self.sms_to_number.clone(),
            ..ScanExecutorConfig::default()
        }
    }
}
