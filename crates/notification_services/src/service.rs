use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::Client as SnsClient;
use campground_scan::{NotificationError, SmsService};

/// Notification service for sending SMS messages through AWS SNS.
#[derive(Debug, Clone)]
pub struct NotificationService {
    sns_client: SnsClient,
}

impl NotificationService {
    /// Creates a new instance of the NotificationService with the AWS client initialized
    /// from the standard credential chain.
    pub async fn new() -> Result<Self, NotificationError> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        if config.region().is_none() {
            return Err(NotificationError::Sms(
                "AWS region is not configured".to_string(),
            ));
        }

        Ok(Self {
            sns_client: SnsClient::new(&config),
        })
    }
}

#[async_trait]
impl SmsService for NotificationService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        let formatted_phone = format_phone_number(to)?;

        let output = self
            .sns_client
            .publish()
            .phone_number(&formatted_phone)
            .message(message)
            .send()
            .await
            .map_err(|e| {
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SNS service error: {:?}", service_error)
                } else {
                    format!("AWS SNS error: {}", e)
                };
                NotificationError::Sms(error_msg)
            })?;

        let message_id = output.message_id().unwrap_or_default().to_string();
        log::info!("📱 SMS sent to {} (SNS Message ID: {})", formatted_phone, message_id);
        Ok(message_id)
    }
}

/// Ensures a phone number is in E.164 format (`+` followed by digits).
pub fn format_phone_number(phone: &str) -> Result<String, NotificationError> {
    let digits: String = phone
        .trim()
        .trim_start_matches('+')
        .replace(['(', ')', '-', ' ', '.'], "");

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(NotificationError::InvalidPhoneNumber(phone.to_string()));
    }

    Ok(format!("+{}", digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("+15555550100").unwrap(), "+15555550100");
        assert_eq!(
            format_phone_number("1 (555) 555-0100").unwrap(),
            "+15555550100"
        );
        assert_eq!(format_phone_number("1.555.555.0100").unwrap(), "+15555550100");
    }

    #[test]
    fn test_invalid_phone_number() {
        assert!(matches!(
            format_phone_number("call me"),
            Err(NotificationError::InvalidPhoneNumber(_))
        ));
        assert!(format_phone_number("").is_err());
    }
}
