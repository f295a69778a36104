use async_trait::async_trait;
use tracing::info;

/// Errors raised by an SMS transport
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The transport rejected or failed to deliver the message
    #[error("SMS error: {0}")]
    Sms(String),

    /// Invalid phone number format
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    /// Notifications were requested but no destination is configured
    #[error("No SMS recipient configured")]
    MissingRecipient,
}

/// Trait for SMS service implementations
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Send `message` to `to`, returning the transport's message id
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError>;
}

/// Log-only SMS service for development/testing
pub struct MockSmsService;

#[async_trait]
impl SmsService for MockSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        info!("📱 [MOCK SMS] To: {}", to);
        info!("📱 [MOCK SMS] Message: {}", message);

        let mock_id = format!("mock-sms-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}
