//! Wire types for the webhook endpoint.

use serde::Serialize;

/// Acknowledgement body returned to the billing provider.
#[derive(Debug, Serialize)]
pub struct WebhookAckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}
